//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use modhub_app::ports::{ModuleForwarder, ModuleRegistrationStore};
use modhub_domain::time::Clock;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the registration and proxy routes under `base_path` (at the root
/// when empty) and `/health` at the root.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<S, F, C>(state: AppState<S, F, C>, base_path: &str) -> Router
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let api = crate::api::routes::<S, F, C>();
    let router = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(base_path, api)
    };
    router
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
