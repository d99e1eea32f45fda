//! Payload carried by requests and responses.

use bytes::Bytes;

/// Request or response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No payload.
    #[default]
    Empty,
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
}

impl Body {
    /// View the payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Empty => &[],
            Body::Text(s) => s.as_bytes(),
            Body::Bytes(b) => b,
        }
    }

    /// Convert into owned bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Body::Empty => Bytes::new(),
            Body::Text(s) => Bytes::from(s),
            Body::Bytes(b) => b,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Decode the payload as text, replacing invalid UTF-8 sequences.
    pub fn to_text_lossy(&self) -> String {
        match self {
            Body::Empty => String::new(),
            Body::Text(s) => s.clone(),
            Body::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        if b.is_empty() {
            Body::Empty
        } else {
            Body::Bytes(b)
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::from(Bytes::from(v))
    }
}

impl From<&'static [u8]> for Body {
    fn from(v: &'static [u8]) -> Self {
        Body::from(Bytes::from_static(v))
    }
}

impl From<Option<Bytes>> for Body {
    fn from(b: Option<Bytes>) -> Self {
        b.map(Body::from).unwrap_or_default()
    }
}
