//! Adapter for Azure HTTP-triggered functions.
//!
//! The platform passes a context/request pair and reads the reply from
//! `context.res`. Function names follow `package--name_major_minor_patch` and requests
//! are routed under `/api/<package>/<name>/<version>`.

use super::{decode_body, encode_body, invoke, reject, AdapterError, Platform};
use crate::function::identity::{path_suffix, routing_prefix};
use crate::function::{Action, ActionContext, PackagedName};
use crate::http::{ActionRequest, ActionResponse, Headers};
use crate::runtime::WrapperConfig;
use serde::{Deserialize, Serialize};
use url::Url;

/// Fixed route prefix of HTTP-triggered functions.
pub const ROUTE_PREFIX: &str = "api";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureContext {
    pub invocation_id: String,
    pub execution_context: ExecutionContext,
    /// Reply slot, filled by [`handle`].
    #[serde(default)]
    pub res: Option<AzureReply>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub function_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub raw_body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureReply {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
    pub is_base64_encoded: bool,
    /// Tells the host not to re-serialize the body.
    pub is_raw: bool,
}

impl From<ActionResponse> for AzureReply {
    fn from(mut response: ActionResponse) -> Self {
        response.ensure_utf8_charset();
        let encoded = encode_body(&response);
        Self {
            status: response.status.0,
            headers: response.headers,
            body: encoded.body,
            is_base64_encoded: encoded.is_base64,
            is_raw: encoded.is_base64,
        }
    }
}

/// Handle one invocation, writing the reply into `context.res`.
pub async fn handle(
    action: &dyn Action,
    config: &WrapperConfig,
    context: &mut AzureContext,
    request: AzureRequest,
) {
    let reply = match adapt(config, context, request) {
        Ok((request, ctx)) => invoke(action, request, &ctx).await,
        Err(err) => reject(Platform::Azure, &context.invocation_id, &err),
    };
    context.res = Some(reply.into());
}

fn adapt(
    config: &WrapperConfig,
    context: &AzureContext,
    request: AzureRequest,
) -> Result<(ActionRequest, ActionContext), AdapterError> {
    let url = Url::parse(&request.url)?;
    let packaged = PackagedName::parse(&context.execution_context.function_name)?;

    let app = config
        .site_name
        .clone()
        .or_else(|| site_from_host(&url))
        .ok_or_else(|| AdapterError::invalid("cannot determine site name"))?;
    let package = packaged.package.clone().unwrap_or_default();
    let func = packaged.into_identity(app, config.version.as_deref())?;
    let prefix = routing_prefix(&[
        ROUTE_PREFIX,
        package.as_str(),
        func.name.as_str(),
        func.version.as_str(),
    ]);
    let suffix = path_suffix(url.path(), &prefix);

    let body = decode_body(request.raw_body, request.is_base64_encoded)?;
    let action_request = ActionRequest::new(request.method.as_str(), url)
        .with_headers(request.headers)
        .body(body);

    let ctx = ActionContext::new(
        Platform::Azure,
        context.invocation_id.clone(),
        func,
        config.env.clone(),
        suffix,
    );
    Ok((action_request, ctx))
}

/// `deploy-helix.azurewebsites.net` → `deploy-helix`.
fn site_from_host(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    host.split('.').next().filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AzureContext {
        AzureContext {
            invocation_id: "inv-az".into(),
            execution_context: ExecutionContext {
                function_name: "simple-package--simple-name_1_45_0".into(),
            },
            res: None,
        }
    }

    fn request(url: &str) -> AzureRequest {
        AzureRequest {
            method: "GET".into(),
            url: url.into(),
            headers: Headers::new(),
            raw_body: None,
            is_base64_encoded: false,
        }
    }

    #[test]
    fn test_identity_and_suffix() {
        let (_, ctx) = adapt(
            &WrapperConfig::new(),
            &context(),
            request("https://deploy-helix.azurewebsites.net/api/simple-package/simple-name/1.45.0/foo"),
        )
        .unwrap();
        assert_eq!(ctx.func.name, "simple-name");
        assert_eq!(ctx.func.version, "1.45.0");
        assert_eq!(ctx.func.app, "deploy-helix");
        assert_eq!(ctx.path_info.suffix, "/foo");
    }

    #[test]
    fn test_configured_site_name_wins() {
        let config = WrapperConfig::new().site_name("prod-site");
        let (_, ctx) = adapt(&config, &context(), request("https://x.example.com/other")).unwrap();
        assert_eq!(ctx.func.app, "prod-site");
        assert_eq!(ctx.path_info.suffix, "/other");
    }

    #[test]
    fn test_reply_normalizes_charset_and_encodes_binary() {
        let reply = AzureReply::from(ActionResponse::html("<p>hi</p>"));
        assert_eq!(reply.headers.get("content-type"), Some("text/html;charset=UTF-8"));
        assert!(!reply.is_raw);

        let reply = AzureReply::from(ActionResponse::bytes("image/gif", b"GIF89a".to_vec()));
        assert!(reply.is_raw);
        assert_eq!(reply.body, "R0lGODlh");
    }

    #[test]
    fn test_reply_keeps_untyped_bytes_intact() {
        let reply = AzureReply::from(ActionResponse::ok().body(vec![0xffu8, 0xfe, 0, 0x89]));
        assert!(reply.is_base64_encoded);
        assert_eq!(reply.body, "//4AiQ==");
        assert_eq!(reply.headers.get("content-type"), Some("application/octet-stream"));
    }

    #[test]
    fn test_bad_url_is_invalid_invocation() {
        let err = adapt(&WrapperConfig::new(), &context(), request("not a url")).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidUrl(_)));
    }
}
