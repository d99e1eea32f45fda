//! # Fezz Adapter - one action, every serverless platform
//!
//! Fezz actions are written once against a canonical fetch-like model
//! ([`ActionRequest`], [`ActionResponse`], [`ActionContext`]) and run unmodified on
//! several hosting platforms. Each platform gets an adapter that translates its native
//! invocation contract into that model and back.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │ aws          │  │ azure        │  │ google       │  │ cloudflare   │  │ openwhisk    │
//! │ event + ctx  │  │ ctx + req    │  │ raw http     │  │ fetch event  │  │ params       │
//! └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!        └─────────────────┴────────┬────────┴─────────────────┴─────────────────┘
//!                                   ▼
//!              identity derivation · content classification · charset
//!                                   ▼
//!                  Action::run(ActionRequest, &ActionContext)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fezz_adapter::prelude::*;
//! use std::sync::Arc;
//!
//! struct HelloAction;
//!
//! #[async_trait]
//! impl Action for HelloAction {
//!     async fn run(
//!         &self,
//!         request: ActionRequest,
//!         ctx: &ActionContext,
//!     ) -> Result<ActionResponse, ActionError> {
//!         ctx.log.info(format_args!("serving {}", request.url()));
//!         Ok(ActionResponse::text(format!("Hello from {}!", ctx.func.name)))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = WrapperConfig::new().identity("demo", "hello", "1.0.0");
//!     ActionServer::new(config, Arc::new(HelloAction)).run().await
//! }
//! ```
//!
//! ## Invocation Lifecycle
//!
//! 1. **Adapt**: the native invocation is validated and turned into a request and context
//! 2. **Run**: the action is called exactly once; errors and panics are captured
//! 3. **Reply**: the response is charset-normalized where needed, binary bodies are
//!    transport-encoded, and the native reply is produced
//!
//! Nothing is shared between invocations, so every adapter can be called concurrently.

pub mod adapter;
pub mod content;
pub mod function;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::adapter::{AdapterError, Platform};
    pub use crate::content::{ensure_utf8_charset, is_binary};
    pub use crate::function::{Action, ActionContext, ActionError, FunctionIdentity};
    pub use crate::http::{ActionRequest, ActionResponse, Body, Headers, Method, StatusCode};
    pub use crate::runtime::{ActionServer, WrapperConfig};
    pub use async_trait::async_trait;
    pub use fezz_adapter_macro::fezz_action;
}

// Re-export for convenience
pub use adapter::{AdapterError, Platform};
pub use function::{Action, ActionContext, ActionError, FunctionIdentity};
pub use http::{ActionRequest, ActionResponse};
pub use runtime::{ActionServer, WrapperConfig};
