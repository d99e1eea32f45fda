//! Wrapper configuration embedded at package time.

use crate::function::identity::normalize_version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Prefix of process environment variables that override configuration.
pub const ENV_PREFIX: &str = "FEZZ_";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Configuration the deploy pipeline writes next to the action.
///
/// `env` is handed to the action verbatim. The identity fields are only fallbacks:
/// adapters derive the function identity from platform naming first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperConfig {
    /// Deployment parameters exposed as `ActionContext::env`.
    pub env: HashMap<String, String>,
    /// Package the action was deployed in.
    pub package: Option<String>,
    /// Action name.
    pub name: Option<String>,
    /// Action version, `major.minor.patch` dotted or underscored. Used when the
    /// platform's naming carries no version.
    pub version: Option<String>,
    /// Owning app, project or account.
    pub app: Option<String>,
    /// Site name of the hosting app, where the platform has one.
    pub site_name: Option<String>,
    /// Host address the local server binds to.
    pub host: String,
    /// Port the local server listens on.
    pub port: u16,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            env: HashMap::new(),
            package: None,
            name: None,
            version: None,
            app: None,
            site_name: None,
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl WrapperConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Apply `FEZZ_*` overrides from the process environment.
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::vars())
    }

    /// Apply `FEZZ_*` overrides from the given variables.
    ///
    /// `FEZZ_PACKAGE`, `FEZZ_NAME`, `FEZZ_VERSION`, `FEZZ_APP`, `FEZZ_SITE_NAME`,
    /// `FEZZ_HOST` and `FEZZ_PORT` replace the matching fields; `FEZZ_PARAM_<KEY>`
    /// adds `<KEY>` to `env`.
    pub fn with_overrides<I>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match field {
                "PACKAGE" => self.package = Some(value),
                "NAME" => self.name = Some(value),
                "VERSION" => {
                    normalize_version(&value).map_err(|_| ConfigError::InvalidValue {
                        key: key.clone(),
                        value: value.clone(),
                    })?;
                    self.version = Some(value)
                }
                "APP" => self.app = Some(value),
                "SITE_NAME" => self.site_name = Some(value),
                "HOST" => self.host = value,
                "PORT" => {
                    self.port = value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.clone(),
                        value: value.clone(),
                    })?
                }
                other => {
                    if let Some(param) = other.strip_prefix("PARAM_") {
                        self.env.insert(param.to_string(), value);
                    }
                }
            }
        }
        Ok(self)
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Add a deployment parameter.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the fallback identity.
    pub fn identity(
        mut self,
        package: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.package = Some(package.into());
        self.name = Some(name.into());
        self.version = Some(version.into());
        self
    }

    /// Set the fallback version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the owning app.
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set the hosting site name.
    pub fn site_name(mut self, site_name: impl Into<String>) -> Self {
        self.site_name = Some(site_name.into());
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Packaged function name (`package--name_1_2_3`) built from the fallback identity.
    pub fn packaged_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        let mut out = String::new();
        if let Some(package) = &self.package {
            out.push_str(package);
            out.push_str(crate::function::identity::PACKAGE_SEPARATOR);
        }
        out.push_str(name);
        if let Some(version) = &self.version {
            out.push('_');
            out.push_str(&version.replace('.', "_"));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = WrapperConfig::from_json_str(r#"{"env":{"FOO":"bar"}}"#).unwrap();
        assert_eq!(config.env.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let vars = vec![
            ("FEZZ_NAME".to_string(), "dump".to_string()),
            ("FEZZ_PORT".to_string(), "9000".to_string()),
            ("FEZZ_PARAM_HEY".to_string(), "ho".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];
        let config = WrapperConfig::new().with_overrides(vars).unwrap();
        assert_eq!(config.name.as_deref(), Some("dump"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.env.get("HEY").map(String::as_str), Some("ho"));
        assert_eq!(config.env.len(), 1);
    }

    #[test]
    fn test_invalid_port() {
        let vars = vec![("FEZZ_PORT".to_string(), "eighty".to_string())];
        let err = WrapperConfig::new().with_overrides(vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_version_override_must_be_three_components() {
        let vars = vec![("FEZZ_VERSION".to_string(), "2_0_1".to_string())];
        let config = WrapperConfig::new().with_overrides(vars).unwrap();
        assert_eq!(config.version.as_deref(), Some("2_0_1"));

        let vars = vec![("FEZZ_VERSION".to_string(), "latest".to_string())];
        let err = WrapperConfig::new().with_overrides(vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "FEZZ_VERSION"));
    }

    #[test]
    fn test_packaged_name() {
        let config = WrapperConfig::new().identity("simple-package", "simple-name", "1.45.0");
        assert_eq!(
            config.packaged_name().as_deref(),
            Some("simple-package--simple-name_1_45_0")
        );
        assert_eq!(WrapperConfig::new().packaged_name(), None);
    }

    #[test]
    fn test_missing_file() {
        let err = WrapperConfig::from_json_file("/nonexistent/params.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/params.json"));
    }
}
