//! Fezz Adapter - local action host
//!
//! Runs a demo action behind the raw-HTTP adapter. Configuration is read from the JSON
//! file named by `FEZZ_CONFIG` and overridden by `FEZZ_*` environment variables.

use fezz_adapter::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Dumps what the action sees about its invocation.
#[fezz_action(name = "dump")]
async fn dump(request: ActionRequest, ctx: &ActionContext) -> Result<ActionResponse, ActionError> {
    ctx.log.info(format_args!("{} {}", request.method(), request.url()));

    let headers: serde_json::Map<String, serde_json::Value> = request
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
        .collect();
    let body = serde_json::json!({
        "method": request.method().to_string(),
        "url": request.url().as_str(),
        "headers": headers,
        "suffix": ctx.path_info.suffix,
        "func": ctx.func,
        "invocationId": ctx.invocation.id,
        "env": ctx.env.keys().collect::<Vec<_>>(),
    });

    Ok(ActionResponse::json(&body)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("FEZZ_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading config from {}", path);
            WrapperConfig::from_json_file(path)?
        }
        Err(_) => WrapperConfig::new().identity("demo", "dump", "1.0.0"),
    }
    .with_process_env()?;

    tracing::info!("Starting Fezz action server...");
    if let Some(name) = config.packaged_name() {
        tracing::info!("Try: curl http://localhost:{}/{}/foo", config.port, name);
    }
    tracing::info!("Health check: curl http://localhost:{}/_health", config.port);

    ActionServer::new(config, Arc::new(DumpAction::new())).run().await
}
