//! Per-platform adapters.
//!
//! Each adapter translates one native invocation into an [`ActionRequest`] and
//! [`ActionContext`], runs the action exactly once and turns the outcome into the
//! platform's native reply. Failures never escape to the platform runtime: they are
//! mapped through [`ERROR_STATUS`] into a structured error reply and the detail is
//! logged.
//!
//! ```text
//!  native invocation ──► adapter ──► ActionRequest + ActionContext ──► Action::run
//!                                                                         │
//!  native reply ◄── base64 / charset ◄── ActionResponse or AdapterError ◄─┘
//! ```

pub mod aws;
pub mod azure;
pub mod cloudflare;
pub mod google;
pub mod openwhisk;

use crate::function::{Action, ActionContext, ActionError, IdentityError};
use crate::http::{ActionRequest, ActionResponse, Body, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tracing::Instrument;

/// Hosting platform an adapter targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Aws,
    Azure,
    Google,
    Cloudflare,
    OpenWhisk,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Aws,
        Platform::Azure,
        Platform::Google,
        Platform::Cloudflare,
        Platform::OpenWhisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Aws => "aws",
            Platform::Azure => "azure",
            Platform::Google => "google",
            Platform::Cloudflare => "cloudflare",
            Platform::OpenWhisk => "openwhisk",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown platform: {}", s))
    }
}

/// Kinds of failure an adapter can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The native invocation is missing fields or malformed.
    InvalidInvocation,
    /// The request body could not be decoded.
    InvalidBody,
    /// The platform's identity strings could not be parsed.
    Identity,
    /// The action returned an error.
    Action,
    /// The action panicked.
    Panic,
}

/// Status code every error kind is reported with.
pub const ERROR_STATUS: &[(ErrorKind, StatusCode)] = &[
    (ErrorKind::InvalidInvocation, StatusCode::BAD_REQUEST),
    (ErrorKind::InvalidBody, StatusCode::BAD_REQUEST),
    (ErrorKind::Identity, StatusCode::INTERNAL_SERVER_ERROR),
    (ErrorKind::Action, StatusCode::INTERNAL_SERVER_ERROR),
    (ErrorKind::Panic, StatusCode::INTERNAL_SERVER_ERROR),
];

/// Failure resolved at the adapter boundary.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] base64::DecodeError),
    #[error("invalid function identity: {0}")]
    Identity(#[from] IdentityError),
    #[error("action failed: {0}")]
    Action(#[from] ActionError),
    #[error("action panicked: {0}")]
    Panic(String),
}

impl AdapterError {
    /// Create an invalid-invocation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        AdapterError::InvalidInvocation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::InvalidInvocation(_) | AdapterError::InvalidUrl(_) => {
                ErrorKind::InvalidInvocation
            }
            AdapterError::InvalidBody(_) => ErrorKind::InvalidBody,
            AdapterError::Identity(_) => ErrorKind::Identity,
            AdapterError::Action(_) => ErrorKind::Action,
            AdapterError::Panic(_) => ErrorKind::Panic,
        }
    }

    /// Status code from [`ERROR_STATUS`].
    pub fn status(&self) -> StatusCode {
        let kind = self.kind();
        ERROR_STATUS
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, status)| *status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Structured reply for this error. The error detail is not included.
    pub fn to_response(&self, invocation_id: &str) -> ActionResponse {
        let status = self.status();
        let body = serde_json::json!({
            "status": status.0,
            "error": status.reason(),
            "invocationId": invocation_id,
        });
        ActionResponse::new(status)
            .header("Content-Type", "application/json")
            .header("Cache-Control", "no-store, private, must-revalidate")
            .body(body.to_string())
    }
}

/// Run the action once, capturing both error returns and panics.
pub async fn run_action(
    action: &dyn Action,
    request: ActionRequest,
    ctx: &ActionContext,
) -> Result<ActionResponse, AdapterError> {
    let span = tracing::info_span!(
        "invocation",
        platform = %ctx.invocation.platform,
        invocation_id = %ctx.invocation.id,
        function = %ctx.func.name,
        action = action.name(),
    );

    let outcome = AssertUnwindSafe(action.run(request, ctx))
        .catch_unwind()
        .instrument(span)
        .await;

    match outcome {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => Err(AdapterError::Action(err)),
        Err(panic) => Err(AdapterError::Panic(panic_message(panic.as_ref()))),
    }
}

/// Run the action and resolve any failure into an error reply.
pub async fn invoke(action: &dyn Action, request: ActionRequest, ctx: &ActionContext) -> ActionResponse {
    match run_action(action, request, ctx).await {
        Ok(response) => {
            ctx.log.debug(format_args!("action replied with status {}", response.status));
            response
        }
        Err(err) => {
            ctx.log.error(format_args!("{}", err));
            err.to_response(&ctx.invocation.id)
        }
    }
}

/// Reply for failures that happen before a context exists.
pub(crate) fn reject(platform: Platform, invocation_id: &str, err: &AdapterError) -> ActionResponse {
    tracing::warn!(%platform, invocation_id, "rejecting invocation: {}", err);
    err.to_response(invocation_id)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Body prepared for a text-only transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub body: String,
    pub is_base64: bool,
}

/// Encode a response body for a JSON transport, base64-encoding binary payloads.
///
/// Bytes that are not valid UTF-8 are always base64-encoded, whatever the content type.
pub fn encode_body(response: &ActionResponse) -> EncodedBody {
    let bytes = response.body.as_bytes();
    let text = if response.is_binary() {
        None
    } else {
        std::str::from_utf8(bytes).ok()
    };
    match text {
        Some(text) => EncodedBody {
            body: text.to_string(),
            is_base64: false,
        },
        None => EncodedBody {
            body: BASE64.encode(bytes),
            is_base64: true,
        },
    }
}

/// Decode a request body received over a JSON transport.
pub fn decode_body(body: Option<String>, is_base64: bool) -> Result<Body, AdapterError> {
    match body {
        None => Ok(Body::Empty),
        Some(body) if body.is_empty() => Ok(Body::Empty),
        Some(body) if is_base64 => Ok(Body::from(BASE64.decode(body)?)),
        Some(body) => Ok(Body::Text(body)),
    }
}
