//! Canonical request handed to an action.

use super::{Body, Headers};
use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP method enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    /// Any method outside the standard set, uppercased.
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Other(m) => m,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "PATCH" => Method::Patch,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        Method::from(s.as_str())
    }
}

impl From<Method> for String {
    fn from(m: Method) -> Self {
        m.as_str().to_string()
    }
}

impl From<&hyper::Method> for Method {
    fn from(method: &hyper::Method) -> Self {
        Method::from(method.as_str())
    }
}

/// Platform-agnostic request for Fezz actions.
///
/// Adapters build exactly one of these per invocation and move it into the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    method: Method,
    url: Url,
    headers: Headers,
    body: Body,
    query: Vec<(String, String)>,
}

impl ActionRequest {
    /// Create a request for an absolute URL. Query parameters are decoded from the URL.
    pub fn new(method: impl Into<Method>, url: Url) -> Self {
        let query = url.query_pairs().into_owned().collect();
        Self {
            method: method.into(),
            url,
            headers: Headers::new(),
            body: Body::Empty,
            query,
        }
    }

    /// Parse the URL and create a request.
    pub fn parse(method: impl Into<Method>, url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(method, Url::parse(url)?))
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Replace the whole header collection.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a header value.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    pub fn body_ref(&self) -> &Body {
        &self.body
    }

    /// Decoded query parameters, in URL order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the body as text if present.
    pub fn text(&self) -> Option<String> {
        (!self.body.is_empty()).then(|| self.body.to_text_lossy())
    }

    /// Parse the body as JSON if present.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        (!self.body.is_empty()).then(|| serde_json::from_slice(self.body.as_bytes()))
    }

    /// Content type without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.headers.get("content-type").map(crate::content::essence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_decoded_from_url() {
        let req = ActionRequest::parse("get", "https://example.com/a?x=1&y=hello%20world&x=2")
            .unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.query_param("y"), Some("hello world"));
        assert_eq!(req.query().len(), 3);
        assert_eq!(req.path(), "/a");
    }

    #[test]
    fn test_unknown_method_is_kept() {
        assert_eq!(Method::from("purge"), Method::Other("PURGE".to_string()));
        assert_eq!(Method::from("PURGE").to_string(), "PURGE");
    }

    #[test]
    fn test_text_and_json_body() {
        let req = ActionRequest::parse(Method::Post, "https://example.com/")
            .unwrap()
            .header("Content-Type", "application/json; charset=utf-8")
            .body(r#"{"a":1}"#);
        assert_eq!(req.content_type().as_deref(), Some("application/json"));
        let value: serde_json::Value = req.json().unwrap().unwrap();
        assert_eq!(value["a"], 1);

        let empty = ActionRequest::parse(Method::Get, "https://example.com/").unwrap();
        assert!(empty.text().is_none());
    }
}
