//! Per-invocation context handed to an action.

use crate::adapter::Platform;
use crate::function::FunctionIdentity;
use std::collections::HashMap;
use std::fmt::Display;
use std::time::{Duration, SystemTime};

/// Routing information for the current invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathInfo {
    /// Inbound path with the function's routing prefix removed. Empty or starts with `/`.
    pub suffix: String,
}

/// Platform-level facts about the current invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationInfo {
    /// Request or activation id assigned by the platform.
    pub id: String,
    /// Platform that delivered the invocation.
    pub platform: Platform,
    /// Point in time after which the platform will abort the invocation.
    pub deadline: Option<SystemTime>,
}

/// Logging capability wired to the platform's logger.
///
/// Every event is emitted through `tracing` under the `fezz_adapter::action` target and
/// carries the platform, the invocation id and the function name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLogger {
    platform: Platform,
    invocation_id: String,
    function: String,
}

impl ActionLogger {
    pub fn new(platform: Platform, invocation_id: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            platform,
            invocation_id: invocation_id.into(),
            function: function.into(),
        }
    }

    pub fn trace(&self, message: impl Display) {
        tracing::trace!(target: "fezz_adapter::action", platform = %self.platform, invocation_id = %self.invocation_id, function = %self.function, "{}", message);
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!(target: "fezz_adapter::action", platform = %self.platform, invocation_id = %self.invocation_id, function = %self.function, "{}", message);
    }

    pub fn info(&self, message: impl Display) {
        tracing::info!(target: "fezz_adapter::action", platform = %self.platform, invocation_id = %self.invocation_id, function = %self.function, "{}", message);
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!(target: "fezz_adapter::action", platform = %self.platform, invocation_id = %self.invocation_id, function = %self.function, "{}", message);
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!(target: "fezz_adapter::action", platform = %self.platform, invocation_id = %self.invocation_id, function = %self.function, "{}", message);
    }
}

/// Execution context for Fezz actions.
///
/// Built fresh by an adapter for each invocation. Raw platform objects are never
/// exposed; only the canonical fields below are.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Deployment-time parameters.
    pub env: HashMap<String, String>,
    /// Routing information.
    pub path_info: PathInfo,
    /// Identity of the deployed action.
    pub func: FunctionIdentity,
    /// Logger wired to the platform.
    pub log: ActionLogger,
    /// Invocation metadata.
    pub invocation: InvocationInfo,
}

impl ActionContext {
    /// Create a context for one invocation.
    pub fn new(
        platform: Platform,
        invocation_id: impl Into<String>,
        func: FunctionIdentity,
        env: HashMap<String, String>,
        suffix: impl Into<String>,
    ) -> Self {
        let invocation_id = invocation_id.into();
        Self {
            log: ActionLogger::new(platform, invocation_id.clone(), func.name.clone()),
            env,
            path_info: PathInfo {
                suffix: suffix.into(),
            },
            func,
            invocation: InvocationInfo {
                id: invocation_id,
                platform,
                deadline: None,
            },
        }
    }

    /// Set the platform deadline.
    pub fn with_deadline(mut self, deadline: SystemTime) -> Self {
        self.invocation.deadline = Some(deadline);
        self
    }

    /// Get a deployment parameter.
    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Time left before the platform aborts the invocation.
    ///
    /// `None` when the platform does not expose a deadline.
    pub fn remaining_time(&self) -> Option<Duration> {
        self.invocation.deadline.map(|deadline| {
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ActionContext {
        ActionContext::new(
            Platform::Aws,
            "req-1",
            FunctionIdentity::new("dump", "1_0_0", "app").unwrap(),
            HashMap::from([("FOO".to_string(), "bar".to_string())]),
            "/foo",
        )
    }

    #[test]
    fn test_context_fields() {
        let ctx = context();
        assert_eq!(ctx.get_env("FOO"), Some("bar"));
        assert_eq!(ctx.path_info.suffix, "/foo");
        assert_eq!(ctx.func.version, "1.0.0");
        assert_eq!(ctx.invocation.id, "req-1");
    }

    #[test]
    fn test_remaining_time() {
        assert_eq!(context().remaining_time(), None);

        let ctx = context().with_deadline(SystemTime::now() + Duration::from_secs(60));
        let remaining = ctx.remaining_time().unwrap();
        assert!(remaining > Duration::from_secs(50));

        let expired = context().with_deadline(SystemTime::UNIX_EPOCH);
        assert_eq!(expired.remaining_time(), Some(Duration::ZERO));
    }
}
