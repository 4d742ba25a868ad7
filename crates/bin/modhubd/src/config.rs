//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `modhub.toml` in the working directory. Every field has a
//! default so the file is optional. Environment variables take precedence
//! over file values.

use std::time::Duration;

use serde::Deserialize;

use modhub_domain::liveness::{DEFAULT_STALENESS_THRESHOLD_SECS, LivenessPolicy};
use modhub_domain::proxy::PathGuard;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Module proxy settings.
    pub proxy: ProxyConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Prefix the module API is mounted under, empty for the root.
    pub base_path: String,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Sub-path prefixes never forwarded to a module.
    pub denied_prefixes: Vec<String>,
    /// Maximum heartbeat age before a module stops receiving traffic.
    pub staleness_threshold_secs: i64,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Config {
    /// Load configuration from `modhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("modhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("MODHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("MODHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("MODHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("MODHUB_BASE_PATH") {
            self.server.base_path = val;
        }
        if let Some(val) = var("MODHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("MODHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(secs) = var("MODHUB_STALENESS_SECS").and_then(|val| val.parse().ok()) {
            self.proxy.staleness_threshold_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        let base_path = &self.server.base_path;
        if !base_path.is_empty() && (!base_path.starts_with('/') || base_path.ends_with('/')) {
            return Err(ConfigError::Validation(format!(
                "base_path must start with '/' and not end with '/', got {base_path:?}"
            )));
        }
        if LivenessPolicy::from_secs(self.proxy.staleness_threshold_secs).is_none() {
            return Err(ConfigError::Validation(
                "staleness_threshold_secs must be positive".to_string(),
            ));
        }
        if self.proxy.connect_timeout_secs == 0 || self.proxy.read_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "proxy timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl ProxyConfig {
    #[must_use]
    pub fn liveness_policy(&self) -> LivenessPolicy {
        LivenessPolicy::from_secs(self.staleness_threshold_secs).unwrap_or_default()
    }

    #[must_use]
    pub fn path_guard(&self) -> PathGuard {
        PathGuard::new(self.denied_prefixes.clone())
    }

    #[must_use]
    pub fn forwarder(&self) -> modhub_adapter_http_reqwest::Config {
        modhub_adapter_http_reqwest::Config {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8083,
            base_path: String::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:modhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "modhubd=info,modhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            denied_prefixes: PathGuard::default().denied_prefixes().to_vec(),
            staleness_threshold_secs: DEFAULT_STALENESS_THRESHOLD_SECS,
            connect_timeout_secs: 5,
            read_timeout_secs: 10,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
