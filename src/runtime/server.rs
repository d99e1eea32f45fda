//! Local HTTP host for a single action.
//!
//! Serves the action through the raw-HTTP adapter so it behaves exactly as it would
//! when deployed as a Google Cloud Function.

use crate::adapter::google::{self, GoogleEnv};
use crate::function::Action;
use crate::http::ActionResponse;
use crate::runtime::WrapperConfig;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Path of the health check endpoint.
pub const HEALTH_PATH: &str = "/_health";

/// Development server hosting one action.
pub struct ActionServer {
    /// Server configuration.
    config: Arc<WrapperConfig>,
    /// Identity the action is served under.
    platform_env: Arc<GoogleEnv>,
    /// The hosted action.
    action: Arc<dyn Action>,
}

impl ActionServer {
    /// Create a new server.
    pub fn new(config: WrapperConfig, action: Arc<dyn Action>) -> Self {
        let platform_env = GoogleEnv {
            service: config.packaged_name(),
            project: config.app.clone(),
        };
        Self {
            config: Arc::new(config),
            platform_env: Arc::new(platform_env),
            action,
        }
    }

    /// Start the HTTP server.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Action server listening on {}", addr);
        if let Some(name) = &self.platform_env.service {
            info!("Serving action under /{}", name);
        }

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let config = self.config.clone();
            let platform_env = self.platform_env.clone();
            let action = self.action.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let config = config.clone();
                    let platform_env = platform_env.clone();
                    let action = action.clone();
                    async move {
                        handle_request(req, action, config, platform_env, remote_addr).await
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    action: Arc<dyn Action>,
    config: Arc<WrapperConfig>,
    platform_env: Arc<GoogleEnv>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    debug!("Handling request: {} {} from {}", req.method(), req.uri(), remote_addr);

    if req.uri().path() == HEALTH_PATH {
        return Ok(google::build_response(ActionResponse::text("OK")));
    }

    Ok(google::handle(action.as_ref(), &config, &platform_env, req).await)
}
