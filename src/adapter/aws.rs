//! Adapter for Lambda functions behind an HTTP API (payload format 2.0).
//!
//! The platform calls the function with an event/context pair and expects a JSON
//! reply. Binary bodies travel base64-encoded in both directions.

use super::{decode_body, encode_body, invoke, reject, AdapterError, Platform};
use crate::function::identity::{path_suffix, routing_prefix};
use crate::function::{Action, ActionContext, FunctionIdentity};
use crate::http::{ActionRequest, ActionResponse, Headers};
use crate::runtime::WrapperConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// HTTP API event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub route_key: Option<String>,
    pub raw_path: String,
    #[serde(default)]
    pub raw_query_string: String,
    #[serde(default)]
    pub cookies: Vec<String>,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub api_id: String,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    pub http: HttpDescription,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpDescription {
    pub method: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Invocation context of the function.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaContext {
    pub function_name: String,
    pub invoked_function_arn: String,
    pub aws_request_id: String,
    /// Absolute deadline in epoch milliseconds.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// Reply in payload format 2.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaReply {
    pub status_code: u16,
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl From<ActionResponse> for LambdaReply {
    fn from(response: ActionResponse) -> Self {
        let encoded = encode_body(&response);
        let mut headers = response.headers;
        let cookies: Vec<String> = headers.get_all("set-cookie").map(str::to_string).collect();
        headers.remove("set-cookie");
        Self {
            status_code: response.status.0,
            headers,
            cookies,
            body: encoded.body,
            is_base64_encoded: encoded.is_base64,
        }
    }
}

/// Handle one invocation given as raw JSON values.
pub async fn handle_value(
    action: &dyn Action,
    config: &WrapperConfig,
    event: serde_json::Value,
    context: serde_json::Value,
) -> LambdaReply {
    let context: LambdaContext = match serde_json::from_value(context) {
        Ok(context) => context,
        Err(e) => {
            let err = AdapterError::invalid(format!("lambda context: {}", e));
            return reject(Platform::Aws, "", &err).into();
        }
    };
    match serde_json::from_value::<ApiGatewayEvent>(event) {
        Ok(event) => handle(action, config, event, context).await,
        Err(e) => {
            let err = AdapterError::invalid(format!("http api event: {}", e));
            reject(Platform::Aws, &context.aws_request_id, &err).into()
        }
    }
}

/// Handle one invocation.
pub async fn handle(
    action: &dyn Action,
    config: &WrapperConfig,
    event: ApiGatewayEvent,
    context: LambdaContext,
) -> LambdaReply {
    match adapt(config, event, &context) {
        Ok((request, ctx)) => invoke(action, request, &ctx).await.into(),
        Err(err) => reject(Platform::Aws, &context.aws_request_id, &err).into(),
    }
}

fn adapt(
    config: &WrapperConfig,
    event: ApiGatewayEvent,
    context: &LambdaContext,
) -> Result<(ActionRequest, ActionContext), AdapterError> {
    let func = FunctionIdentity::from_lambda_arn(
        &context.invoked_function_arn,
        event.request_context.api_id.clone(),
        config.version.as_deref(),
    )?;

    let host = event
        .headers
        .get("host")
        .map(str::to_string)
        .or_else(|| event.request_context.domain_name.clone())
        .ok_or_else(|| AdapterError::invalid("event has neither a host header nor a domain name"))?;
    let scheme = event.headers.get("x-forwarded-proto").unwrap_or("https");
    let mut url = format!("{}://{}{}", scheme, host, event.raw_path);
    if !event.raw_query_string.is_empty() {
        url.push('?');
        url.push_str(&event.raw_query_string);
    }

    let suffix = match event.path_parameters.as_ref().and_then(|p| p.get("path")) {
        Some(path) => path_suffix(&format!("/{}", path.trim_start_matches('/')), ""),
        None => path_suffix(&event.raw_path, &routing_prefix(&[&func.name])),
    };

    let mut headers = event.headers;
    if !event.cookies.is_empty() {
        headers.set("cookie", event.cookies.join("; "));
    }
    let body = decode_body(event.body, event.is_base64_encoded)?;
    let request = ActionRequest::parse(event.request_context.http.method.as_str(), &url)?
        .with_headers(headers)
        .body(body);

    let mut ctx = ActionContext::new(
        Platform::Aws,
        context.aws_request_id.clone(),
        func,
        config.env.clone(),
        suffix,
    );
    if let Some(deadline_ms) = context.deadline_ms {
        ctx = ctx.with_deadline(SystemTime::UNIX_EPOCH + Duration::from_millis(deadline_ms));
    }
    Ok((request, ctx))
}
