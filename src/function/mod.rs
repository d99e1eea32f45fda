//! Action contract, per-invocation context and function identity.

pub mod context;
pub mod handler;
pub mod identity;

pub use context::{ActionContext, ActionLogger, InvocationInfo, PathInfo};
pub use handler::{Action, ActionError};
pub use identity::{FunctionIdentity, IdentityError, PackagedName};
