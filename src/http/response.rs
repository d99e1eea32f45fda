//! Canonical response returned by an action.

use super::{Body, Headers};
use crate::content::BINARY_CONTENT_TYPE;
use serde::{Deserialize, Serialize};

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Check if the status code indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Check if the status code indicates a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// Check if the status code indicates a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Standard reason phrase, if the code is known to hyper.
    pub fn reason(&self) -> &'static str {
        hyper::StatusCode::from_u16(self.0)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status")
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fetch-like response produced by an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// HTTP headers.
    pub headers: Headers,
    /// Response body.
    pub body: Body,
}

impl ActionResponse {
    /// Create a new response with the given status code.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Create an OK response.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create a response with JSON body.
    pub fn json<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(data)?;
        Ok(Self::ok()
            .header("Content-Type", "application/json")
            .body(body))
    }

    /// Create a text response.
    pub fn text(content: impl Into<String>) -> Self {
        Self::ok()
            .header("Content-Type", "text/plain")
            .body(content.into())
    }

    /// Create an HTML response.
    pub fn html(content: impl Into<String>) -> Self {
        Self::ok()
            .header("Content-Type", "text/html")
            .body(content.into())
    }

    /// Create a binary response with the given content type.
    pub fn bytes(content_type: impl Into<String>, data: impl Into<bytes::Bytes>) -> Self {
        Self::ok()
            .header("Content-Type", content_type)
            .body(data.into())
    }

    /// Create an error response.
    pub fn error(status: impl Into<StatusCode>, message: impl Into<String>) -> Self {
        Self::new(status)
            .header("Content-Type", "text/plain")
            .body(message.into())
    }

    /// Add a header to the response.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Set the response body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the body as text if present.
    pub fn text_body(&self) -> Option<String> {
        (!self.body.is_empty()).then(|| self.body.to_text_lossy())
    }

    /// Parse the body as JSON if present.
    pub fn json_body<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Option<Result<T, serde_json::Error>> {
        (!self.body.is_empty()).then(|| serde_json::from_slice(self.body.as_bytes()))
    }

    /// Content type without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.headers.get("content-type").map(crate::content::essence)
    }

    /// Whether the body must travel as raw bytes rather than text.
    ///
    /// Without a content type, byte bodies are binary and text bodies are not.
    pub fn is_binary(&self) -> bool {
        match self.content_type() {
            Some(ct) => crate::content::is_binary(&ct),
            None => matches!(self.body, Body::Bytes(_)),
        }
    }

    /// Declare a UTF-8 charset where one is missing. See [`crate::content::ensure_utf8_charset`].
    ///
    /// An untyped byte body is labelled [`BINARY_CONTENT_TYPE`] instead.
    pub fn ensure_utf8_charset(&mut self) -> &mut Self {
        if !self.headers.contains("content-type") && matches!(self.body, Body::Bytes(_)) {
            self.headers.set("Content-Type", BINARY_CONTENT_TYPE);
        } else {
            crate::content::apply_utf8_charset(&mut self.headers);
        }
        self
    }
}
