//! JSON REST handlers for module registration.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use modhub_app::ports::{ModuleForwarder, ModuleRegistrationStore};
use modhub_domain::liveness::ModuleReport;
use modhub_domain::module::ModuleRegistration;
use modhub_domain::registration::{RegisterModule, RegistrationOutcome};
use modhub_domain::time::Clock;

use crate::error::ApiError;
use crate::state::AppState;

/// `?homeId=` query parameter. A missing value reaches the registry as empty
/// and is reported as a validation failure.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(rename = "homeId", default)]
    pub home_id: String,
}

/// Possible responses from the register and heartbeat endpoints.
pub enum OutcomeResponse {
    Accepted(Json<RegistrationOutcome>),
    Rejected(Json<RegistrationOutcome>),
}

impl From<RegistrationOutcome> for OutcomeResponse {
    fn from(outcome: RegistrationOutcome) -> Self {
        if outcome.success {
            Self::Accepted(Json(outcome))
        } else {
            Self::Rejected(Json(outcome))
        }
    }
}

impl IntoResponse for OutcomeResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => json.into_response(),
            Self::Rejected(json) => (StatusCode::BAD_REQUEST, json).into_response(),
        }
    }
}

/// Possible responses from the list endpoints.
pub enum ListResponse {
    Ok(Json<Vec<ModuleRegistration>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the describe endpoint.
pub enum DescribeResponse {
    Ok(Json<ModuleReport>),
}

impl IntoResponse for DescribeResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the unregister endpoint.
pub enum UnregisterResponse {
    Ok,
}

impl IntoResponse for UnregisterResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok => StatusCode::OK.into_response(),
        }
    }
}

/// `POST /modules/register`
pub async fn register<S, F, C>(
    State(state): State<AppState<S, F, C>>,
    Json(req): Json<RegisterModule>,
) -> OutcomeResponse
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    state.registry.register(req).await.into()
}

/// `POST /modules/{module_id}/heartbeat?homeId=`
pub async fn heartbeat<S, F, C>(
    State(state): State<AppState<S, F, C>>,
    Path(module_id): Path<String>,
    Query(query): Query<HomeQuery>,
) -> OutcomeResponse
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    state
        .registry
        .heartbeat(&module_id, &query.home_id)
        .await
        .into()
}

/// `GET /modules`
pub async fn list_all<S, F, C>(
    State(state): State<AppState<S, F, C>>,
) -> Result<ListResponse, ApiError>
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let modules = state.registry.list_all().await?;
    Ok(ListResponse::Ok(Json(modules)))
}

/// `GET /modules/home/{home_id}`
pub async fn list_by_home<S, F, C>(
    State(state): State<AppState<S, F, C>>,
    Path(home_id): Path<String>,
) -> Result<ListResponse, ApiError>
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let modules = state.registry.list_by_home(&home_id).await?;
    Ok(ListResponse::Ok(Json(modules)))
}

/// `GET /modules/type/{module_type}`
pub async fn list_by_type<S, F, C>(
    State(state): State<AppState<S, F, C>>,
    Path(module_type): Path<String>,
) -> Result<ListResponse, ApiError>
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let modules = state.registry.list_by_type(&module_type).await?;
    Ok(ListResponse::Ok(Json(modules)))
}

/// `GET /modules/{module_id}?homeId=`
pub async fn describe<S, F, C>(
    State(state): State<AppState<S, F, C>>,
    Path(module_id): Path<String>,
    Query(query): Query<HomeQuery>,
) -> Result<DescribeResponse, ApiError>
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let report = state.registry.describe(&module_id, &query.home_id).await?;
    Ok(DescribeResponse::Ok(Json(report)))
}

/// `DELETE /modules/{module_id}?homeId=`
pub async fn unregister<S, F, C>(
    State(state): State<AppState<S, F, C>>,
    Path(module_id): Path<String>,
    Query(query): Query<HomeQuery>,
) -> Result<UnregisterResponse, ApiError>
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    state.registry.unregister(&module_id, &query.home_id).await?;
    Ok(UnregisterResponse::Ok)
}
