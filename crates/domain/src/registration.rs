//! Registration contract shared by the gateway and module agents.

use serde::{Deserialize, Serialize};

use crate::error::ModHubError;
use crate::module::{ModuleRegistration, ModuleStatus};
use crate::time::Timestamp;

/// Message returned when a heartbeat addresses an unknown registration.
///
/// Agents react to it by registering again from scratch.
pub const MODULE_NOT_FOUND: &str = "Module not found";

/// Body of `POST /modules/register`.
///
/// Missing fields deserialize as empty strings so that they are reported as
/// validation failures instead of body rejections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterModule {
    pub module_id: String,
    pub module_type: String,
    pub home_id: String,
    pub base_url: String,
    pub description: Option<String>,
}

impl RegisterModule {
    /// Turn the request into an active registration stamped at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::Validation`] if the request violates
    /// registration invariants.
    pub fn into_registration(self, at: Timestamp) -> Result<ModuleRegistration, ModHubError> {
        let mut builder = ModuleRegistration::builder()
            .module_id(self.module_id)
            .module_type(self.module_type)
            .home_id(self.home_id)
            .base_url(self.base_url)
            .status(ModuleStatus::Active)
            .registered_at(at)
            .last_heartbeat(at);
        if let Some(description) = self.description {
            builder = builder.description(description);
        }
        builder.build()
    }
}

/// Response of the register and heartbeat operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub success: bool,
    pub message: String,
    pub module_id: String,
}

impl RegistrationOutcome {
    #[must_use]
    pub fn accepted(module_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            module_id: module_id.into(),
        }
    }

    #[must_use]
    pub fn rejected(module_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            module_id: module_id.into(),
        }
    }

    #[must_use]
    pub fn module_not_found(module_id: impl Into<String>) -> Self {
        Self::rejected(module_id, MODULE_NOT_FOUND)
    }

    /// Whether the registry no longer knows this module.
    #[must_use]
    pub fn is_module_not_found(&self) -> bool {
        !self.success && self.message == MODULE_NOT_FOUND
    }
}
