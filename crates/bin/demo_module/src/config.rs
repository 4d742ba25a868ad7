//! Demo module settings, read from `MODULE_*` environment variables.

use modhub_agent::AgentConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Port the module serves on.
    pub port: u16,
    /// Filter directive (`RUST_LOG` syntax).
    pub log_filter: String,
    pub agent: AgentConfig,
}

/// Host name the gateway reaches this module by when no base URL is given.
const ADVERTISED_HOST: &str = "temperature-api";

impl Default for Settings {
    fn default() -> Self {
        let port = 8081;
        Self {
            port,
            log_filter: "demo_module=info,modhub_agent=info,tower_http=debug".to_string(),
            agent: AgentConfig {
                base_url: advertised_url(port),
                ..AgentConfig::default()
            },
        }
    }
}

fn advertised_url(port: u16) -> String {
    format!("http://{ADVERTISED_HOST}:{port}")
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(port) = var("MODULE_PORT").and_then(|val| val.parse().ok()) {
            settings.port = port;
            settings.agent.base_url = advertised_url(port);
        }
        if let Some(val) = var("MODULE_LOG").or_else(|| var("RUST_LOG")) {
            settings.log_filter = val;
        }
        let agent = &mut settings.agent;
        if let Some(val) = var("MODULE_GATEWAY_URL") {
            agent.gateway_url = val;
        }
        if let Some(val) = var("MODULE_HOME_ID") {
            agent.home_id = val;
        }
        if let Some(val) = var("MODULE_BASE_URL") {
            agent.base_url = val;
        }
        if let Some(val) = var("MODULE_ID_PREFIX") {
            agent.module_id_prefix = val;
        }
        settings
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
