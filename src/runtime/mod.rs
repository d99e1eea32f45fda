//! Configuration and local hosting.

mod config;
mod server;

pub use config::{ConfigError, WrapperConfig, ENV_PREFIX};
pub use server::{ActionServer, HEALTH_PATH};
