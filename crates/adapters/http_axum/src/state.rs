//! Shared application state for axum handlers.

use std::sync::Arc;

use modhub_app::ports::{ModuleForwarder, ModuleRegistrationStore};
use modhub_app::services::{ModuleRegistry, ProxyService};
use modhub_domain::time::Clock;

/// Application state shared across all axum handlers.
///
/// Generic over the store, forwarder and clock to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<S, F, C> {
    /// Registration, heartbeat and lookup use-cases.
    pub registry: Arc<ModuleRegistry<S, C>>,
    /// Liveness-gated forwarding to modules.
    pub proxy: Arc<ProxyService<S, F, C>>,
}

impl<S, F, C> Clone for AppState<S, F, C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            proxy: Arc::clone(&self.proxy),
        }
    }
}

impl<S, F, C> AppState<S, F, C>
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// The proxy holds its own handle on the same registry.
    pub fn from_arcs(registry: Arc<ModuleRegistry<S, C>>, proxy: Arc<ProxyService<S, F, C>>) -> Self {
        Self { registry, proxy }
    }
}
