//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod modules;
#[allow(clippy::missing_errors_doc)]
pub mod proxy;

use axum::Router;
use axum::routing::{get, on, post, MethodFilter};

use modhub_app::ports::{ModuleForwarder, ModuleRegistrationStore};
use modhub_domain::time::Clock;

use crate::state::AppState;

/// Build the registration and proxy sub-router.
pub fn routes<S, F, C>() -> Router<AppState<S, F, C>>
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let proxied = MethodFilter::GET
        .or(MethodFilter::POST)
        .or(MethodFilter::PUT)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::DELETE);

    Router::new()
        // Registration
        .route("/modules", get(modules::list_all::<S, F, C>))
        .route("/modules/register", post(modules::register::<S, F, C>))
        .route(
            "/modules/home/{home_id}",
            get(modules::list_by_home::<S, F, C>),
        )
        .route(
            "/modules/type/{module_type}",
            get(modules::list_by_type::<S, F, C>),
        )
        .route(
            "/modules/{module_id}",
            get(modules::describe::<S, F, C>).delete(modules::unregister::<S, F, C>),
        )
        .route(
            "/modules/{module_id}/heartbeat",
            post(modules::heartbeat::<S, F, C>),
        )
        // Proxy
        .route(
            "/modules/{module_id}/proxy",
            on(proxied, proxy::forward::<S, F, C>),
        )
        .route(
            "/modules/{module_id}/proxy/{*rest}",
            on(proxied, proxy::forward::<S, F, C>),
        )
}
