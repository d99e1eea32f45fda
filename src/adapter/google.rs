//! Adapter for Google Cloud Functions (HTTP trigger).
//!
//! The platform hands over a raw HTTP request and expects a raw HTTP response, so no
//! transport encoding is needed. The function is served from
//! `https://<region>-<project>.cloudfunctions.net/<package>--<name>_<version>`.

use super::{invoke, reject, AdapterError, Platform};
use crate::function::identity::{path_suffix, routing_prefix};
use crate::function::{Action, ActionContext, PackagedName};
use crate::http::{ActionRequest, ActionResponse, Headers};
use crate::runtime::WrapperConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use tracing::{debug, warn};

/// Service identity the platform exposes through the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoogleEnv {
    /// Deployed function name (`K_SERVICE`).
    pub service: Option<String>,
    /// Project id (`GOOGLE_CLOUD_PROJECT`, `GCP_PROJECT`).
    pub project: Option<String>,
}

impl GoogleEnv {
    /// Read the identity from the process environment.
    pub fn from_process_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            service: var("K_SERVICE").or_else(|| var("FUNCTION_TARGET")),
            project: var("GOOGLE_CLOUD_PROJECT").or_else(|| var("GCP_PROJECT")),
        }
    }
}

/// Handle one invocation.
pub async fn handle<B>(
    action: &dyn Action,
    config: &WrapperConfig,
    platform_env: &GoogleEnv,
    req: hyper::Request<B>,
) -> hyper::Response<Full<Bytes>>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let invocation_id = req
        .headers()
        .get("function-execution-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(generate_invocation_id);

    let response = match adapt(config, platform_env, &invocation_id, req).await {
        Ok((request, ctx)) => invoke(action, request, &ctx).await,
        Err(err) => reject(Platform::Google, &invocation_id, &err),
    };
    build_response(response)
}

async fn adapt<B>(
    config: &WrapperConfig,
    platform_env: &GoogleEnv,
    invocation_id: &str,
    req: hyper::Request<B>,
) -> Result<(ActionRequest, ActionContext), AdapterError>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let service = platform_env
        .service
        .clone()
        .or_else(|| config.packaged_name())
        .ok_or_else(|| AdapterError::invalid("function name is not configured"))?;
    let app = platform_env
        .project
        .clone()
        .or_else(|| config.app.clone())
        .unwrap_or_default();
    let func = PackagedName::parse(&service)?.into_identity(app, config.version.as_deref())?;

    let (parts, body) = req.into_parts();
    let headers = Headers::try_from(&parts.headers)
        .map_err(|e| AdapterError::invalid(format!("request headers: {}", e)))?;
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .ok_or_else(|| AdapterError::invalid("request has no host"))?;
    let scheme = headers.get("x-forwarded-proto").unwrap_or("https");
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or("/");
    let url = format!("{}://{}{}", scheme, host, path_and_query);
    let suffix = path_suffix(parts.uri.path(), &routing_prefix(&[service.as_str()]));

    let body = body
        .collect()
        .await
        .map_err(|e| AdapterError::invalid(format!("failed to read request body: {}", e)))?
        .to_bytes();
    if body.len() > config.max_body_size {
        return Err(AdapterError::invalid("request body too large"));
    }
    debug!(url = %url, bytes = body.len(), "adapted google request");

    let request = ActionRequest::parse(&parts.method, &url)?
        .with_headers(headers)
        .body(body);
    let ctx = ActionContext::new(
        Platform::Google,
        invocation_id,
        func,
        config.env.clone(),
        suffix,
    );
    Ok((request, ctx))
}

/// Build a hyper Response from an ActionResponse.
pub(crate) fn build_response(mut response: ActionResponse) -> hyper::Response<Full<Bytes>> {
    response.ensure_utf8_charset();
    let status = hyper::StatusCode::from_u16(response.status.0).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            response.status.0
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = hyper::Response::builder().status(status);
    for (name, value) in response.headers.iter() {
        builder = builder.header(name, value);
    }

    builder
        .body(Full::new(response.body.into_bytes()))
        .unwrap_or_else(|e| {
            warn!("Invalid response header, replying 500: {}", e);
            let mut fallback = hyper::Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

/// Generate an invocation id when the platform did not supply one.
pub(crate) fn generate_invocation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:x}", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::ActionError;
    use async_trait::async_trait;

    struct Suffix;

    #[async_trait]
    impl Action for Suffix {
        async fn run(
            &self,
            request: ActionRequest,
            ctx: &ActionContext,
        ) -> Result<ActionResponse, ActionError> {
            Ok(ActionResponse::new(201)
                .header("X-Suffix", ctx.path_info.suffix.clone())
                .header("X-Func", format!("{}@{}/{}", ctx.func.name, ctx.func.version, ctx.func.app))
                .header("X-Url", request.url().as_str())
                .body(request.text().unwrap_or_default()))
        }
    }

    fn platform_env() -> GoogleEnv {
        GoogleEnv {
            service: Some("simple-package--simple-name_1_45_0".into()),
            project: Some("helix-225321".into()),
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let req = hyper::Request::builder()
            .method("POST")
            .uri("/simple-package--simple-name_1_45_0/foo?x=1")
            .header("host", "us-central1-helix-225321.cloudfunctions.net")
            .header("function-execution-id", "exec-1")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();

        let res = handle(&Suffix, &WrapperConfig::new(), &platform_env(), req).await;
        assert_eq!(res.status(), 201);
        assert_eq!(res.headers()["x-suffix"], "/foo");
        assert_eq!(res.headers()["x-func"], "simple-name@1.45.0/helix-225321");
        assert_eq!(
            res.headers()["x-url"],
            "https://us-central1-helix-225321.cloudfunctions.net/simple-package--simple-name_1_45_0/foo?x=1"
        );
        assert_eq!(res.headers()["content-type"], "text/plain;charset=UTF-8");
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"payload");
    }

    #[tokio::test]
    async fn test_missing_identity_is_rejected() {
        let req = hyper::Request::builder()
            .uri("/foo")
            .header("host", "localhost")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let res = handle(&Suffix, &WrapperConfig::new(), &GoogleEnv::default(), req).await;
        assert_eq!(res.status(), 400);
        assert_eq!(res.headers()["content-type"], "application/json");
    }

    #[test]
    fn test_invalid_status_falls_back() {
        let res = build_response(ActionResponse::new(1000));
        assert_eq!(res.status(), 500);
    }
}
