//! Module registry: use-cases for registering modules and tracking liveness.

use modhub_domain::error::{ModHubError, NotFoundError, ValidationError};
use modhub_domain::liveness::{Liveness, LivenessPolicy, ModuleReport};
use modhub_domain::module::{ModuleRegistration, ModuleStatus};
use modhub_domain::registration::{RegisterModule, RegistrationOutcome};
use modhub_domain::time::{Clock, SystemClock};

use crate::ports::{ModuleRegistrationStore, Upserted};

/// Application service for module registration, heartbeats and lookups.
///
/// Register and heartbeat never fail: every error is folded into a
/// [`RegistrationOutcome`] with `success = false`.
pub struct ModuleRegistry<S, C = SystemClock> {
    store: S,
    clock: C,
    liveness: LivenessPolicy,
}

impl<S: ModuleRegistrationStore> ModuleRegistry<S> {
    /// Create a new registry backed by the given store and the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: ModuleRegistrationStore, C: Clock> ModuleRegistry<S, C> {
    /// Create a new registry reading time from `clock`.
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            liveness: LivenessPolicy::default(),
        }
    }

    /// Replace the default liveness policy.
    #[must_use]
    pub fn with_liveness(mut self, liveness: LivenessPolicy) -> Self {
        self.liveness = liveness;
        self
    }

    #[must_use]
    pub fn liveness(&self) -> &LivenessPolicy {
        &self.liveness
    }

    /// Evaluate the liveness of `registration` at the current time.
    pub fn evaluate(&self, registration: &ModuleRegistration) -> Liveness {
        self.liveness.evaluate(registration, self.clock.now())
    }

    /// Create a registration, or refresh the existing one for the same
    /// `(module_id, home_id)`.
    #[tracing::instrument(skip(self, request), fields(module_id = %request.module_id, home_id = %request.home_id))]
    pub async fn register(&self, request: RegisterModule) -> RegistrationOutcome {
        let module_id = request.module_id.clone();
        let registration = match request.into_registration(self.clock.now()) {
            Ok(registration) => registration,
            Err(err) => {
                tracing::warn!(%err, "rejected registration");
                return RegistrationOutcome::rejected(module_id, format!("Registration failed: {err}"));
            }
        };
        match self.store.upsert(registration).await {
            Ok(Upserted::Created(reg)) => {
                tracing::info!(base_url = %reg.base_url, module_type = %reg.module_type, "module registered");
                RegistrationOutcome::accepted(module_id, "Module registered successfully")
            }
            Ok(Upserted::Updated(reg)) => {
                tracing::info!(base_url = %reg.base_url, "module registration updated");
                RegistrationOutcome::accepted(module_id, "Module updated successfully")
            }
            Err(err) => {
                tracing::error!(%err, "failed to store registration");
                RegistrationOutcome::rejected(module_id, format!("Registration failed: {err}"))
            }
        }
    }

    /// Mark an existing registration as alive. Never creates a record.
    #[tracing::instrument(skip(self))]
    pub async fn heartbeat(&self, module_id: &str, home_id: &str) -> RegistrationOutcome {
        if let Err(err) = require_key(module_id, home_id) {
            tracing::warn!(%err, "rejected heartbeat");
            return RegistrationOutcome::rejected(module_id, format!("Heartbeat update failed: {err}"));
        }
        match self
            .store
            .touch_heartbeat(module_id, home_id, self.clock.now())
            .await
        {
            Ok(Some(_)) => {
                tracing::debug!("heartbeat recorded");
                RegistrationOutcome::accepted(module_id, "Heartbeat updated")
            }
            Ok(None) => {
                tracing::warn!("heartbeat for unknown module");
                RegistrationOutcome::module_not_found(module_id)
            }
            Err(err) => {
                tracing::error!(%err, "failed to record heartbeat");
                RegistrationOutcome::rejected(module_id, format!("Heartbeat update failed: {err}"))
            }
        }
    }

    /// List every registration of one home, live or not.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list_by_home(&self, home_id: &str) -> Result<Vec<ModuleRegistration>, ModHubError> {
        self.store.find_by_home(home_id).await
    }

    /// List every registration of one module type, live or not.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list_by_type(
        &self,
        module_type: &str,
    ) -> Result<Vec<ModuleRegistration>, ModHubError> {
        self.store.find_by_type(module_type).await
    }

    /// List all registrations.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list_all(&self) -> Result<Vec<ModuleRegistration>, ModHubError> {
        self.store.get_all().await
    }

    /// Delete the registration for one key. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::Validation`] for an empty key, or a storage
    /// error propagated from the store.
    #[tracing::instrument(skip(self))]
    pub async fn unregister(&self, module_id: &str, home_id: &str) -> Result<(), ModHubError> {
        require_key(module_id, home_id)?;
        if self.store.delete(module_id, home_id).await? {
            tracing::info!("module unregistered");
        }
        Ok(())
    }

    /// Get one registration together with its current liveness verdict.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] when the key is absent,
    /// [`ModHubError::Validation`] for an empty key, or a storage error from
    /// the store.
    pub async fn describe(&self, module_id: &str, home_id: &str) -> Result<ModuleReport, ModHubError> {
        require_key(module_id, home_id)?;
        let registration = self.store.find(module_id, home_id).await?.ok_or_else(|| {
            ModHubError::from(NotFoundError {
                entity: "Module",
                id: format!("{module_id}@{home_id}"),
            })
        })?;
        let liveness = self.evaluate(&registration);
        Ok(ModuleReport {
            registration,
            liveness,
        })
    }

    /// Pick the registration the proxy routes `module_id` to.
    ///
    /// The first active record in scan order wins, whatever its home.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn resolve(&self, module_id: &str) -> Result<Option<ModuleRegistration>, ModHubError> {
        let candidates = self.store.find_by_module_id(module_id).await?;
        Ok(candidates
            .into_iter()
            .find(|reg| reg.status == ModuleStatus::Active))
    }
}

fn require_key(module_id: &str, home_id: &str) -> Result<(), ValidationError> {
    if module_id.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "moduleId" });
    }
    if home_id.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "homeId" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::{FakeClock, InMemoryStore};
    use chrono::TimeDelta;
    use std::sync::Arc;

    fn make_registry() -> (ModuleRegistry<Arc<InMemoryStore>, FakeClock>, Arc<InMemoryStore>, FakeClock) {
        let store = Arc::new(InMemoryStore::default());
        let clock = FakeClock::new();
        let registry = ModuleRegistry::with_clock(Arc::clone(&store), clock.clone());
        (registry, store, clock)
    }

    fn request(module_id: &str, home_id: &str, base_url: &str) -> RegisterModule {
        RegisterModule {
            module_id: module_id.to_string(),
            module_type: "TEMPERATURE".to_string(),
            home_id: home_id.to_string(),
            base_url: base_url.to_string(),
            description: Some("Temperature sensor module".to_string()),
        }
    }

    #[tokio::test]
    async fn should_create_registration_when_key_is_new() {
        let (registry, _, clock) = make_registry();

        let outcome = registry.register(request("temp-1", "home-A", "http://10.0.0.5:8081")).await;

        assert!(outcome.success);
        assert_eq!(outcome.message, "Module registered successfully");
        assert_eq!(outcome.module_id, "temp-1");
        let stored = registry.describe("temp-1", "home-A").await.unwrap().registration;
        assert_eq!(stored.registered_at, clock.now());
        assert_eq!(stored.last_heartbeat, clock.now());
        assert_eq!(stored.status, ModuleStatus::Active);
    }

    #[tokio::test]
    async fn should_update_in_place_when_registering_same_key_twice() {
        let (registry, store, clock) = make_registry();
        registry.register(request("m1", "h1", "http://x:9000")).await;
        let first_registered_at = clock.now();
        clock.advance(TimeDelta::minutes(3));

        let outcome = registry.register(request("m1", "h1", "http://y:9001")).await;

        assert!(outcome.success);
        assert_eq!(outcome.message, "Module updated successfully");
        assert_eq!(store.len(), 1);
        let stored = registry.describe("m1", "h1").await.unwrap().registration;
        assert_eq!(stored.base_url, "http://y:9001");
        assert_eq!(stored.registered_at, first_registered_at);
        assert_eq!(stored.last_heartbeat, clock.now());
    }

    #[tokio::test]
    async fn should_keep_same_module_in_two_homes_apart() {
        let (registry, store, _) = make_registry();
        registry.register(request("m1", "h1", "http://x:9000")).await;
        registry.register(request("m1", "h2", "http://y:9000")).await;
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn should_return_failure_when_registration_is_invalid() {
        let (registry, store, _) = make_registry();

        let outcome = registry.register(request("m1", "h1", "ftp://x")).await;

        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Registration failed: "));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn should_return_failure_instead_of_error_when_storage_fails() {
        let (registry, store, _) = make_registry();
        store.fail();

        let outcome = registry.register(request("m1", "h1", "http://x:9000")).await;

        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Registration failed: "));
    }

    #[tokio::test]
    async fn should_report_storage_cause_when_registration_fails() {
        let (registry, store, _) = make_registry();
        store.fail();

        let outcome = registry.register(request("m1", "h1", "http://x:9000")).await;

        assert_eq!(
            outcome.message,
            "Registration failed: storage error: disk I/O error"
        );
    }

    #[tokio::test]
    async fn should_refresh_heartbeat_when_module_exists() {
        let (registry, _, clock) = make_registry();
        registry.register(request("m1", "h1", "http://x:9000")).await;
        clock.advance(TimeDelta::seconds(30));

        let outcome = registry.heartbeat("m1", "h1").await;

        assert!(outcome.success);
        assert_eq!(outcome.message, "Heartbeat updated");
        let stored = registry.describe("m1", "h1").await.unwrap().registration;
        assert_eq!(stored.last_heartbeat, clock.now());
    }

    #[tokio::test]
    async fn should_not_create_record_when_heartbeat_targets_unknown_module() {
        let (registry, store, _) = make_registry();

        let outcome = registry.heartbeat("ghost", "h1").await;

        assert!(!outcome.success);
        assert!(outcome.is_module_not_found());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn should_reactivate_inactive_module_on_heartbeat() {
        let (registry, store, _) = make_registry();
        let mut reg = request("m1", "h1", "http://x:9000")
            .into_registration(modhub_domain::time::now())
            .unwrap();
        reg.status = ModuleStatus::Inactive;
        store.insert_raw(reg);

        registry.heartbeat("m1", "h1").await;

        let stored = registry.describe("m1", "h1").await.unwrap();
        assert_eq!(stored.registration.status, ModuleStatus::Active);
    }

    #[tokio::test]
    async fn should_return_failure_when_heartbeat_storage_fails() {
        let (registry, store, _) = make_registry();
        store.fail();

        let outcome = registry.heartbeat("m1", "h1").await;

        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Heartbeat update failed: "));
        assert!(outcome.message.ends_with("storage error: disk I/O error"));
    }

    #[tokio::test]
    async fn should_reject_heartbeat_when_home_is_empty() {
        let (registry, _, _) = make_registry();
        let outcome = registry.heartbeat("m1", " ").await;
        assert!(!outcome.success);
        assert!(!outcome.is_module_not_found());
    }

    #[tokio::test]
    async fn should_list_by_home_type_and_all() {
        let (registry, _, _) = make_registry();
        registry.register(request("m1", "h1", "http://x:9000")).await;
        registry.register(request("m2", "h2", "http://x:9001")).await;
        let mut lamp = request("m3", "h1", "http://x:9002");
        lamp.module_type = "LAMP".to_string();
        registry.register(lamp).await;

        assert_eq!(registry.list_by_home("h1").await.unwrap().len(), 2);
        assert_eq!(registry.list_by_type("LAMP").await.unwrap().len(), 1);
        assert_eq!(registry.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_include_stale_modules_in_listings() {
        let (registry, _, clock) = make_registry();
        registry.register(request("m1", "h1", "http://x:9000")).await;
        clock.advance(TimeDelta::hours(2));
        assert_eq!(registry.list_by_home("h1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_remove_from_listing_when_unregistered() {
        let (registry, _, _) = make_registry();
        registry.register(request("m1", "h1", "http://x:9000")).await;

        registry.unregister("m1", "h1").await.unwrap();

        assert!(registry.list_by_home("h1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_succeed_when_unregistering_absent_module() {
        let (registry, _, _) = make_registry();
        assert!(registry.unregister("ghost", "h1").await.is_ok());
    }

    #[tokio::test]
    async fn should_reject_unregister_when_home_is_missing() {
        let (registry, _, _) = make_registry();
        let result = registry.unregister("m1", "").await;
        assert!(matches!(result, Err(ModHubError::Validation(_))));
    }

    #[tokio::test]
    async fn should_report_stale_liveness_when_heartbeat_is_old() {
        let (registry, _, clock) = make_registry();
        registry.register(request("m1", "h1", "http://x:9000")).await;
        clock.advance(TimeDelta::minutes(6));

        let report = registry.describe("m1", "h1").await.unwrap();

        assert_eq!(report.liveness, Liveness::Stale { elapsed_minutes: 6 });
    }

    #[tokio::test]
    async fn should_return_not_found_when_describing_absent_module() {
        let (registry, _, _) = make_registry();
        let result = registry.describe("ghost", "h1").await;
        assert!(matches!(result, Err(ModHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_resolve_first_active_registration_across_homes() {
        let (registry, store, _) = make_registry();
        let mut inactive = request("m1", "h0", "http://inactive:9000")
            .into_registration(modhub_domain::time::now())
            .unwrap();
        inactive.status = ModuleStatus::Inactive;
        store.insert_raw(inactive);
        registry.register(request("m1", "h1", "http://first:9000")).await;
        registry.register(request("m1", "h2", "http://second:9000")).await;

        let resolved = registry.resolve("m1").await.unwrap().unwrap();

        assert_eq!(resolved.base_url, "http://first:9000");
    }
}
