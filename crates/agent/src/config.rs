//! Agent configuration.

use std::time::Duration;

use serde::Deserialize;

use modhub_domain::registration::RegisterModule;

use crate::error::AgentError;

/// Settings of a [`RegistrationAgent`](crate::RegistrationAgent).
///
/// Every field has a default, so partial TOML or JSON documents deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Gateway root, including its base path when one is configured.
    pub gateway_url: String,
    pub home_id: String,
    pub module_type: String,
    pub module_id_prefix: String,
    /// Address the gateway uses to reach this module.
    pub base_url: String,
    pub description: Option<String>,
    pub register_max_attempts: u32,
    pub register_retry_delay_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://modules-gateway:8083".to_string(),
            home_id: "default-home".to_string(),
            module_type: "TEMPERATURE".to_string(),
            module_id_prefix: "temperature-module".to_string(),
            base_url: "http://temperature-api:8081".to_string(),
            description: Some("Temperature sensor module for smart home".to_string()),
            register_max_attempts: 10,
            register_retry_delay_secs: 5,
            heartbeat_interval_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

impl AgentConfig {
    /// Reject settings the agent cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(AgentError::InvalidConfig(
                "heartbeat_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.register_max_attempts == 0 {
            return Err(AgentError::InvalidConfig(
                "register_max_attempts must be non-zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AgentError::InvalidConfig(
                "request_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn register_retry_delay(&self) -> Duration {
        Duration::from_secs(self.register_retry_delay_secs)
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Registration request announcing `module_id`.
    #[must_use]
    pub fn registration(&self, module_id: &str) -> RegisterModule {
        RegisterModule {
            module_id: module_id.to_string(),
            module_type: self.module_type.clone(),
            home_id: self.home_id.clone(),
            base_url: self.base_url.clone(),
            description: self.description.clone(),
        }
    }
}
