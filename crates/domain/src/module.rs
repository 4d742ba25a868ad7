//! Module registration: where a peripheral module of a home can be reached.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModHubError, ValidationError};
use crate::time::Timestamp;

/// Stored lifecycle status of a module registration.
///
/// `Active` is necessary but not sufficient for routing; see
/// [`LivenessPolicy`](crate::liveness::LivenessPolicy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModuleStatus {
    #[default]
    Active,
    Inactive,
}

impl ModuleStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored status string is not a known [`ModuleStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown module status {0:?}")]
pub struct ParseModuleStatusError(String);

impl FromStr for ModuleStatus {
    type Err = ParseModuleStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(ParseModuleStatusError(other.to_string())),
        }
    }
}

/// One registration per module instance per home.
///
/// `(module_id, home_id)` is the natural key. `registered_at` is set once;
/// `last_heartbeat` moves forward on every heartbeat and re-registration and
/// never precedes `registered_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRegistration {
    pub module_id: String,
    pub home_id: String,
    pub module_type: String,
    pub base_url: String,
    pub status: ModuleStatus,
    pub registered_at: Timestamp,
    pub last_heartbeat: Timestamp,
    pub description: Option<String>,
}

impl ModuleRegistration {
    /// Create a builder for constructing a [`ModuleRegistration`].
    #[must_use]
    pub fn builder() -> ModuleRegistrationBuilder {
        ModuleRegistrationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::Validation`] when an identifier is empty or the
    /// base URL is not an `http`/`https` URL.
    pub fn validate(&self) -> Result<(), ModHubError> {
        require_non_empty("moduleId", &self.module_id)?;
        require_non_empty("homeId", &self.home_id)?;
        require_non_empty("moduleType", &self.module_type)?;
        require_non_empty("baseUrl", &self.base_url)?;
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()).into());
        }
        Ok(())
    }

    /// Whether this record is addressed by the given natural key.
    #[must_use]
    pub fn is_keyed_by(&self, module_id: &str, home_id: &str) -> bool {
        self.module_id == module_id && self.home_id == home_id
    }

    /// Mark the module as alive at `at`.
    pub fn record_heartbeat(&mut self, at: Timestamp) {
        self.last_heartbeat = at.max(self.registered_at);
        self.status = ModuleStatus::Active;
    }

    /// Apply a re-registration in place.
    ///
    /// Takes the new address, description and heartbeat from `update`; the
    /// key, module type and `registered_at` are kept.
    pub fn refresh_from(&mut self, update: &ModuleRegistration) {
        self.base_url.clone_from(&update.base_url);
        self.description.clone_from(&update.description);
        self.record_heartbeat(update.last_heartbeat);
    }

    /// Build the upstream URL for a proxied request.
    ///
    /// `sub_path` is appended verbatim (a trailing `/` on the base URL is
    /// dropped first); `query` is appended after `?` when non-empty.
    #[must_use]
    pub fn target_url(&self, sub_path: &str, query: Option<&str>) -> String {
        let mut url = String::with_capacity(self.base_url.len() + sub_path.len());
        url.push_str(self.base_url.trim_end_matches('/'));
        if !sub_path.starts_with('/') {
            url.push('/');
        }
        url.push_str(sub_path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

/// Step-by-step builder for [`ModuleRegistration`].
#[derive(Debug, Default)]
pub struct ModuleRegistrationBuilder {
    module_id: Option<String>,
    home_id: Option<String>,
    module_type: Option<String>,
    base_url: Option<String>,
    status: Option<ModuleStatus>,
    registered_at: Option<Timestamp>,
    last_heartbeat: Option<Timestamp>,
    description: Option<String>,
}

impl ModuleRegistrationBuilder {
    #[must_use]
    pub fn module_id(mut self, module_id: impl Into<String>) -> Self {
        self.module_id = Some(module_id.into());
        self
    }

    #[must_use]
    pub fn home_id(mut self, home_id: impl Into<String>) -> Self {
        self.home_id = Some(home_id.into());
        self
    }

    #[must_use]
    pub fn module_type(mut self, module_type: impl Into<String>) -> Self {
        self.module_type = Some(module_type.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: ModuleStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn registered_at(mut self, registered_at: Timestamp) -> Self {
        self.registered_at = Some(registered_at);
        self
    }

    #[must_use]
    pub fn last_heartbeat(mut self, last_heartbeat: Timestamp) -> Self {
        self.last_heartbeat = Some(last_heartbeat);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Consume the builder, validate, and return a [`ModuleRegistration`].
    ///
    /// `registered_at` defaults to now and `last_heartbeat` to `registered_at`.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::Validation`] if a required field is missing or
    /// invalid.
    pub fn build(self) -> Result<ModuleRegistration, ModHubError> {
        let registered_at = self.registered_at.unwrap_or_else(crate::time::now);
        let last_heartbeat = self
            .last_heartbeat
            .unwrap_or(registered_at)
            .max(registered_at);
        let registration = ModuleRegistration {
            module_id: self.module_id.unwrap_or_default(),
            home_id: self.home_id.unwrap_or_default(),
            module_type: self.module_type.unwrap_or_default(),
            base_url: self.base_url.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            registered_at,
            last_heartbeat,
            description: self.description,
        };
        registration.validate()?;
        Ok(registration)
    }
}
