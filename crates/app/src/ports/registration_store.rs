//! Registration store port: durable keyed storage of module registrations.
//!
//! Every write is a single atomic operation keyed by `(module_id, home_id)`,
//! so concurrent writers never produce duplicate or torn records and callers
//! never need a read-modify-write cycle.

use std::future::Future;

use modhub_domain::error::ModHubError;
use modhub_domain::module::ModuleRegistration;
use modhub_domain::time::Timestamp;

/// Result of [`ModuleRegistrationStore::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted {
    /// No record existed for the key; `registration` was inserted as given.
    Created(ModuleRegistration),
    /// A record existed and was refreshed in place; holds the stored result.
    Updated(ModuleRegistration),
}

impl Upserted {
    #[must_use]
    pub fn registration(&self) -> &ModuleRegistration {
        match self {
            Self::Created(reg) | Self::Updated(reg) => reg,
        }
    }

    #[must_use]
    pub fn into_registration(self) -> ModuleRegistration {
        match self {
            Self::Created(reg) | Self::Updated(reg) => reg,
        }
    }
}

/// Repository for persisting and querying [`ModuleRegistration`]s.
pub trait ModuleRegistrationStore {
    /// Insert `registration` if its key is absent, otherwise refresh the
    /// stored record in place.
    ///
    /// A refresh takes `base_url`, `description` and `last_heartbeat` from
    /// `registration`, sets the status to active and keeps `registered_at`
    /// and `module_type`.
    fn upsert(
        &self,
        registration: ModuleRegistration,
    ) -> impl Future<Output = Result<Upserted, ModHubError>> + Send;

    /// Set `last_heartbeat = at` and mark the record active.
    ///
    /// Returns `None` when no record matches the key; nothing is created.
    fn touch_heartbeat(
        &self,
        module_id: &str,
        home_id: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<ModuleRegistration>, ModHubError>> + Send;

    /// Get the record for one key.
    fn find(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<Option<ModuleRegistration>, ModHubError>> + Send;

    /// Get every record for `module_id` across homes, in scan order.
    fn find_by_module_id(
        &self,
        module_id: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send;

    /// Get every record of one home, in scan order.
    fn find_by_home(
        &self,
        home_id: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send;

    /// Get every record of one module type, in scan order.
    fn find_by_type(
        &self,
        module_type: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send;

    /// Get all records, in scan order.
    fn get_all(&self) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send;

    /// Delete the record for one key. Returns whether a record was removed.
    fn delete(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<bool, ModHubError>> + Send;
}

impl<T: ModuleRegistrationStore + Send + Sync> ModuleRegistrationStore for std::sync::Arc<T> {
    fn upsert(
        &self,
        registration: ModuleRegistration,
    ) -> impl Future<Output = Result<Upserted, ModHubError>> + Send {
        (**self).upsert(registration)
    }

    fn touch_heartbeat(
        &self,
        module_id: &str,
        home_id: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<ModuleRegistration>, ModHubError>> + Send {
        (**self).touch_heartbeat(module_id, home_id, at)
    }

    fn find(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<Option<ModuleRegistration>, ModHubError>> + Send {
        (**self).find(module_id, home_id)
    }

    fn find_by_module_id(
        &self,
        module_id: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        (**self).find_by_module_id(module_id)
    }

    fn find_by_home(
        &self,
        home_id: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        (**self).find_by_home(home_id)
    }

    fn find_by_type(
        &self,
        module_type: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        (**self).find_by_type(module_type)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        (**self).get_all()
    }

    fn delete(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<bool, ModHubError>> + Send {
        (**self).delete(module_id, home_id)
    }
}
