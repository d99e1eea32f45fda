//! Content classification and charset normalization.
//!
//! Platforms whose native transport is JSON can only carry text, so every adapter asks
//! [`is_binary`] whether a payload has to be base64-encoded. Responses that reach a
//! text-sensitive platform go through [`ensure_utf8_charset`] first.

use crate::http::{ActionResponse, Headers};
use thiserror::Error;

/// `application/*` types that are safe to transport as UTF-8 text.
///
/// Extend this list rather than adding special cases to [`is_binary`].
pub const TEXT_APPLICATION_TYPES: &[&str] = &[
    "application/json",
    "application/javascript",
    "application/xml",
    "application/x-www-form-urlencoded",
];

/// Default content type for responses that declare none.
pub const DEFAULT_TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

/// Content type for byte payloads that declare none.
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Strip parameters from a content type and lowercase it.
///
/// `"Text/HTML; charset=utf-8"` becomes `"text/html"`.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Decide whether a payload of the given content type must be handled as raw bytes.
///
/// `text/*` is never binary. `application/*` is text when it is whitelisted in
/// [`TEXT_APPLICATION_TYPES`] or carries a `+json`/`+xml` suffix. Everything else,
/// including unparseable input, is binary.
pub fn is_binary(content_type: &str) -> bool {
    let essence = essence(content_type);
    let Some((primary, subtype)) = essence.split_once('/') else {
        return true;
    };
    if primary.is_empty() || subtype.is_empty() {
        return true;
    }
    match primary {
        "text" => false,
        "application" => {
            !(TEXT_APPLICATION_TYPES.contains(&essence.as_str())
                || subtype.ends_with("+json")
                || subtype.ends_with("+xml"))
        }
        _ => true,
    }
}

/// Errors raised when a response cannot be charset-normalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CharsetError {
    /// No response, or a value that is not a response at all.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    /// The response has no header container.
    #[error("unexpected response: no headers")]
    MissingHeaders,
    /// The header container exists but has no accessor for the named method.
    #[error("response.headers has no method \"{0}\"")]
    MissingAccessor(&'static str),
}

/// Header container that supports lookup and replacement by name.
pub trait HeaderAccess {
    fn get_header(&self, name: &str) -> Option<&str>;
    fn set_header(&mut self, name: &str, value: String);
}

impl HeaderAccess for Headers {
    fn get_header(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    fn set_header(&mut self, name: &str, value: String) {
        self.set(name, value);
    }
}

/// What a value exposes as its header container.
pub enum HeaderSlot<'a> {
    /// A container with `get`/`set` accessors.
    Accessible(&'a mut dyn HeaderAccess),
    /// A container without accessors, e.g. an untyped map.
    Opaque,
    /// A response-shaped value with no header container.
    Missing,
    /// Not a response at all; carries a rendering of the value.
    NotAResponse(String),
}

/// Anything that may carry response headers.
pub trait ResponseHeaders {
    fn header_slot(&mut self) -> HeaderSlot<'_>;
}

impl ResponseHeaders for ActionResponse {
    fn header_slot(&mut self) -> HeaderSlot<'_> {
        HeaderSlot::Accessible(&mut self.headers)
    }
}

/// Loosely-shaped responses, as returned by passthrough actions.
///
/// Untyped header maps must be converted into [`Headers`] before normalization;
/// they are rejected here as having no accessor.
impl ResponseHeaders for serde_json::Value {
    fn header_slot(&mut self) -> HeaderSlot<'_> {
        match self.as_object() {
            Some(obj) if obj.contains_key("headers") => HeaderSlot::Opaque,
            Some(_) => HeaderSlot::Missing,
            None => HeaderSlot::NotAResponse(self.to_string()),
        }
    }
}

/// Guarantee a charset declaration for textual responses.
///
/// A missing content type becomes [`DEFAULT_TEXT_CONTENT_TYPE`] and a bare `text/html`
/// gets `;charset=UTF-8` appended. Every other content type is left alone. The same
/// response is returned, so the call can be chained; applying it twice is a no-op.
pub fn ensure_utf8_charset<R: ResponseHeaders>(
    response: Option<&mut R>,
) -> Result<&mut R, CharsetError> {
    let response = response.ok_or_else(|| CharsetError::InvalidResponse("undefined".into()))?;
    match response.header_slot() {
        HeaderSlot::Accessible(headers) => apply_utf8_charset(headers),
        HeaderSlot::Opaque => return Err(CharsetError::MissingAccessor("get()")),
        HeaderSlot::Missing => return Err(CharsetError::MissingHeaders),
        HeaderSlot::NotAResponse(value) => return Err(CharsetError::InvalidResponse(value)),
    }
    Ok(response)
}

pub(crate) fn apply_utf8_charset(headers: &mut dyn HeaderAccess) {
    match headers.get_header("content-type") {
        None => headers.set_header("content-type", DEFAULT_TEXT_CONTENT_TYPE.to_string()),
        Some(current) => {
            if essence(current) == "text/html" && !has_charset(current) {
                let base = current.trim_end_matches(|c: char| c == ';' || c.is_ascii_whitespace());
                let value = format!("{};charset=UTF-8", base);
                headers.set_header("content-type", value);
            }
        }
    }
}

fn has_charset(content_type: &str) -> bool {
    content_type.split(';').skip(1).any(|param| {
        param
            .split_once('=')
            .map(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content_type_after(value: Option<&str>) -> String {
        let mut resp = ActionResponse::ok();
        if let Some(v) = value {
            resp = resp.header("content-type", v);
        }
        let resp = ensure_utf8_charset(Some(&mut resp)).unwrap();
        resp.headers.get("content-type").unwrap().to_string()
    }

    #[test]
    fn test_missing_content_type_defaults_to_text_plain() {
        assert_eq!(content_type_after(None), "text/plain;charset=UTF-8");
    }

    #[test]
    fn test_text_plain_without_charset_is_untouched() {
        assert_eq!(content_type_after(Some("text/plain")), "text/plain");
    }

    #[test]
    fn test_text_html_gets_charset() {
        assert_eq!(content_type_after(Some("text/html")), "text/html;charset=UTF-8");
    }

    #[test]
    fn test_text_html_with_trailing_separator() {
        assert_eq!(content_type_after(Some("text/html;")), "text/html;charset=UTF-8");
        assert_eq!(content_type_after(Some("text/html; ")), "text/html;charset=UTF-8");
        assert_eq!(content_type_after(Some("Text/HTML ; ")), "Text/HTML;charset=UTF-8");
    }

    #[test]
    fn test_existing_charset_is_never_overridden() {
        assert_eq!(
            content_type_after(Some("text/html; charset=ISO-8891")),
            "text/html; charset=ISO-8891"
        );
    }

    #[test]
    fn test_idempotent() {
        for initial in [None, Some("text/html"), Some("text/plain"), Some("image/png")] {
            let mut resp = ActionResponse::ok();
            if let Some(v) = initial {
                resp = resp.header("Content-Type", v);
            }
            resp.ensure_utf8_charset();
            let once = resp.headers.clone();
            resp.ensure_utf8_charset();
            assert_eq!(resp.headers, once);
        }
    }

    #[test]
    fn test_missing_response() {
        let err = ensure_utf8_charset::<ActionResponse>(None).unwrap_err();
        assert_eq!(err.to_string(), "unexpected response: undefined");
    }

    #[test]
    fn test_response_without_headers() {
        let mut value = json!({});
        let err = ensure_utf8_charset(Some(&mut value)).unwrap_err();
        assert_eq!(err, CharsetError::MissingHeaders);
        assert_eq!(err.to_string(), "unexpected response: no headers");
    }

    #[test]
    fn test_plain_header_map_has_no_accessor() {
        let mut value = json!({ "headers": {} });
        let err = ensure_utf8_charset(Some(&mut value)).unwrap_err();
        assert_eq!(err.to_string(), "response.headers has no method \"get()\"");
    }

    #[test]
    fn test_non_object_is_invalid() {
        let mut value = json!(42);
        let err = ensure_utf8_charset(Some(&mut value)).unwrap_err();
        assert!(matches!(err, CharsetError::InvalidResponse(_)));
    }

    #[test]
    fn test_is_binary() {
        assert!(is_binary("application/octet-stream"));
        assert!(is_binary("image/png"));
        assert!(!is_binary("text/html"));
        assert!(!is_binary("application/javascript"));
        assert!(!is_binary("application/json"));
        assert!(!is_binary("text/xml"));
        assert!(is_binary("image/svg+xml"));
        assert!(!is_binary("text/yaml"));
    }

    #[test]
    fn test_is_binary_edge_cases() {
        assert!(!is_binary("Application/JSON; charset=utf-8"));
        assert!(!is_binary("application/atom+xml"));
        assert!(!is_binary("application/ld+json"));
        assert!(is_binary("application/pdf"));
        assert!(is_binary(""));
        assert!(is_binary("garbage"));
        assert!(is_binary("audio/"));
    }
}
