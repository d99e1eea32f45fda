//! Adapter for OpenWhisk raw web actions.
//!
//! The action receives a single params object. HTTP details arrive in `__ow_*` keys;
//! every other key is a deployment parameter. The activation identity comes from the
//! `__OW_*` process environment.

use super::{decode_body, encode_body, invoke, reject, AdapterError, Platform};
use crate::content::{is_binary, BINARY_CONTENT_TYPE};
use crate::function::identity::path_suffix;
use crate::function::{Action, ActionContext, FunctionIdentity};
use crate::http::{ActionRequest, ActionResponse, Headers};
use crate::runtime::WrapperConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// Activation facts exposed through `__OW_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationEnv {
    /// Fully qualified action name, `/namespace/package/name@version`.
    pub action_name: String,
    pub activation_id: String,
    pub api_host: Option<String>,
    /// Absolute deadline in epoch milliseconds.
    pub deadline_ms: Option<u64>,
}

impl ActivationEnv {
    /// Read the activation from the process environment.
    pub fn from_process_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            action_name: var("__OW_ACTION_NAME").unwrap_or_default(),
            activation_id: var("__OW_ACTIVATION_ID").unwrap_or_default(),
            api_host: var("__OW_API_HOST"),
            deadline_ms: var("__OW_DEADLINE").and_then(|v| v.parse().ok()),
        }
    }
}

/// Web action reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebReply {
    pub status_code: u16,
    pub headers: Headers,
    pub body: String,
}

impl From<ActionResponse> for WebReply {
    fn from(response: ActionResponse) -> Self {
        // The platform decodes base64 bodies itself when the content type is binary.
        let encoded = encode_body(&response);
        let mut headers = response.headers;
        if encoded.is_base64 && !headers.contains("content-type") {
            headers.set("Content-Type", BINARY_CONTENT_TYPE);
        }
        Self {
            status_code: response.status.0,
            headers,
            body: encoded.body,
        }
    }
}

/// Handle one activation.
pub async fn handle(
    action: &dyn Action,
    config: &WrapperConfig,
    activation: &ActivationEnv,
    params: Value,
) -> WebReply {
    let response = match adapt(config, activation, params) {
        Ok((request, ctx)) => invoke(action, request, &ctx).await,
        Err(err) => reject(Platform::OpenWhisk, &activation.activation_id, &err),
    };
    response.into()
}

fn adapt(
    config: &WrapperConfig,
    activation: &ActivationEnv,
    params: Value,
) -> Result<(ActionRequest, ActionContext), AdapterError> {
    let Value::Object(mut params) = params else {
        return Err(AdapterError::invalid("activation params must be an object"));
    };
    let func = FunctionIdentity::from_action_name(&activation.action_name, config.version.as_deref())?;

    let method = take_string(&mut params, "__ow_method").unwrap_or_else(|| "get".to_string());
    let headers: Headers = match params.remove("__ow_headers") {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| AdapterError::invalid(format!("__ow_headers: {}", e)))?,
        None => Headers::new(),
    };
    let path = path_suffix(&take_string(&mut params, "__ow_path").unwrap_or_default(), "");
    let query = take_string(&mut params, "__ow_query").unwrap_or_default();
    let raw_body = take_string(&mut params, "__ow_body");

    let host = headers
        .get("x-forwarded-host")
        .map(str::to_string)
        .or_else(|| activation.api_host.as_deref().map(strip_scheme))
        .ok_or_else(|| AdapterError::invalid("activation has no host"))?;
    let mut url = format!(
        "https://{}/api/v1/web/{}/{}{}",
        host,
        func.app,
        activation_path(&activation.action_name),
        path
    );
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    let binary = headers.get("content-type").map(is_binary).unwrap_or(false);
    let body = decode_body(raw_body, binary)?;
    let request = ActionRequest::parse(method.as_str(), &url)?
        .with_headers(headers)
        .body(body);

    let env = params_env(config, params);
    let mut ctx = ActionContext::new(
        Platform::OpenWhisk,
        activation.activation_id.clone(),
        func,
        env,
        path,
    );
    if let Some(deadline_ms) = activation.deadline_ms {
        ctx = ctx.with_deadline(SystemTime::UNIX_EPOCH + Duration::from_millis(deadline_ms));
    }
    Ok((request, ctx))
}

fn take_string(params: &mut Map<String, Value>, key: &str) -> Option<String> {
    match params.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Configured parameters overlaid with the remaining activation params.
fn params_env(config: &WrapperConfig, params: Map<String, Value>) -> HashMap<String, String> {
    let mut env = config.env.clone();
    for (key, value) in params {
        if key.starts_with("__ow_") {
            continue;
        }
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        env.insert(key, value);
    }
    env
}

/// `/ns/pkg/name@1.2.3` → `pkg/name`.
fn activation_path(action_name: &str) -> String {
    let path = action_name.split('@').next().unwrap_or_default();
    let mut segments = path.trim_start_matches('/').split('/');
    segments.next();
    segments.collect::<Vec<_>>().join("/")
}

fn strip_scheme(host: &str) -> String {
    host.split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(host)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activation() -> ActivationEnv {
        ActivationEnv {
            action_name: "/helix/simple-package/simple-name@1.45.0".into(),
            activation_id: "act-1".into(),
            api_host: Some("https://adobeioruntime.net".into()),
            deadline_ms: None,
        }
    }

    #[test]
    fn test_params_are_split_into_request_and_env() {
        let params = json!({
            "__ow_method": "post",
            "__ow_headers": { "content-type": "text/plain", "x-forwarded-host": "example.com" },
            "__ow_path": "/foo",
            "__ow_query": "a=b",
            "__ow_body": "hello",
            "FOO": "bar",
            "LIMIT": 5
        });
        let (request, ctx) = adapt(&WrapperConfig::new().env("HEY", "ho"), &activation(), params).unwrap();

        assert_eq!(request.method().as_str(), "POST");
        assert_eq!(
            request.url().as_str(),
            "https://example.com/api/v1/web/helix/simple-package/simple-name/foo?a=b"
        );
        assert_eq!(request.text().as_deref(), Some("hello"));
        assert_eq!(ctx.func, FunctionIdentity::new("simple-name", "1.45.0", "helix").unwrap());
        assert_eq!(ctx.path_info.suffix, "/foo");
        assert_eq!(ctx.get_env("FOO"), Some("bar"));
        assert_eq!(ctx.get_env("LIMIT"), Some("5"));
        assert_eq!(ctx.get_env("HEY"), Some("ho"));
        assert!(ctx.get_env("__ow_path").is_none());
    }

    #[test]
    fn test_binary_body_is_decoded() {
        let params = json!({
            "__ow_headers": { "content-type": "image/png" },
            "__ow_body": "iVBORw=="
        });
        let (request, _) = adapt(&WrapperConfig::new(), &activation(), params).unwrap();
        assert_eq!(request.body_ref().as_bytes(), &[0x89, b'P', b'N', b'G']);
        assert_eq!(request.url().host_str(), Some("adobeioruntime.net"));
    }

    #[test]
    fn test_relative_path_is_rooted() {
        let params = json!({ "__ow_path": "foo/bar" });
        let (request, ctx) = adapt(&WrapperConfig::new(), &activation(), params).unwrap();
        assert_eq!(request.path(), "/api/v1/web/helix/simple-package/simple-name/foo/bar");
        assert_eq!(ctx.path_info.suffix, "/foo/bar");
    }

    #[test]
    fn test_non_object_params() {
        let err = adapt(&WrapperConfig::new(), &activation(), json!([1, 2])).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInvocation(_)));
    }

    #[test]
    fn test_reply_encodes_binary() {
        let reply = WebReply::from(ActionResponse::bytes("image/png", vec![0x89u8, b'P', b'N', b'G']));
        assert_eq!(reply.body, "iVBORw==");
        assert_eq!(reply.status_code, 200);

        let reply = WebReply::from(ActionResponse::ok().body(vec![0xffu8, 0xfe, 0, 0x89]));
        assert_eq!(reply.body, "//4AiQ==");
        assert_eq!(reply.headers.get("content-type"), Some("application/octet-stream"));
    }
}
