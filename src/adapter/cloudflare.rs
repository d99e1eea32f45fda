//! Adapter for edge workers driven by fetch events.
//!
//! Workers own their whole hostname, so the path suffix is the full request path.
//! Bodies are carried as bytes in both directions.

use super::{invoke, reject, AdapterError, Platform};
use crate::function::identity::path_suffix;
use crate::function::{Action, ActionContext, PackagedName};
use crate::http::{ActionRequest, ActionResponse, Headers};
use crate::runtime::WrapperConfig;
use bytes::Bytes;
use url::Url;

/// Request carried by a fetch event.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

/// Fetch event delivered to the worker.
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub request: FetchRequest,
    /// Name of the deployed worker script.
    pub script_name: String,
    /// Account that owns the worker.
    pub account_id: String,
}

/// Response handed to `event.respondWith`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReply {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl From<ActionResponse> for FetchReply {
    fn from(response: ActionResponse) -> Self {
        Self {
            status: response.status.0,
            headers: response.headers,
            body: response.body.into_bytes(),
        }
    }
}

/// Handle one fetch event.
pub async fn handle(action: &dyn Action, config: &WrapperConfig, event: FetchEvent) -> FetchReply {
    let invocation_id = event
        .request
        .headers
        .get("cf-ray")
        .map(str::to_string)
        .unwrap_or_else(super::google::generate_invocation_id);

    let response = match adapt(config, &invocation_id, event) {
        Ok((request, ctx)) => invoke(action, request, &ctx).await,
        Err(err) => reject(Platform::Cloudflare, &invocation_id, &err),
    };
    response.into()
}

fn adapt(
    config: &WrapperConfig,
    invocation_id: &str,
    event: FetchEvent,
) -> Result<(ActionRequest, ActionContext), AdapterError> {
    if event.account_id.is_empty() {
        return Err(AdapterError::invalid("fetch event has no account id"));
    }
    let url = Url::parse(&event.request.url)?;
    let suffix = path_suffix(url.path(), "");
    let func = PackagedName::parse(&event.script_name)?
        .into_identity(event.account_id, config.version.as_deref())?;

    let request = ActionRequest::new(event.request.method.as_str(), url)
        .with_headers(event.request.headers)
        .body(event.request.body);
    let ctx = ActionContext::new(
        Platform::Cloudflare,
        invocation_id,
        func,
        config.env.clone(),
        suffix,
    );
    Ok((request, ctx))
}
