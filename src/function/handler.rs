//! Action trait and error type.

use crate::function::ActionContext;
use crate::http::{ActionRequest, ActionResponse};
use async_trait::async_trait;

/// A platform-agnostic Fezz action.
///
/// The same implementation runs unmodified behind every adapter in [`crate::adapter`].
/// Actions receive a freshly built request and context on every invocation and must
/// not rely on state shared between calls.
#[async_trait]
pub trait Action: Send + Sync {
    /// Handle one invocation.
    async fn run(
        &self,
        request: ActionRequest,
        ctx: &ActionContext,
    ) -> Result<ActionResponse, ActionError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "main"
    }
}

/// Failure reported by an action.
///
/// Adapters never forward the message to the caller; it is logged and the caller
/// receives a generic 5xx reply.
#[derive(Debug)]
pub struct ActionError {
    /// Error message.
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ActionError {
    /// Create a new ActionError.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        ActionError::with_source("i/o error", err)
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::with_source("json error", err)
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        ActionError::new(message)
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        ActionError::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_includes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let err = ActionError::from(io);
        assert_eq!(err.to_string(), "i/o error: missing.txt");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_plain_message() {
        let err: ActionError = "boom".into();
        assert_eq!(err.to_string(), "boom");
        assert!(err.source().is_none());
    }
}
