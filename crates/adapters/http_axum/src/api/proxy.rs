//! Module proxy handler.
//!
//! One handler serves every routed method; the sub-path is cut from the raw
//! request path so that percent-encoding reaches the module untouched.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use modhub_app::ports::{ModuleForwarder, ModuleRegistrationStore};
use modhub_domain::proxy::{ProxyMethod, ProxyRequest, ProxyResponse};
use modhub_domain::time::Clock;

use crate::error::ApiError;
use crate::state::AppState;

/// Path parameters of the proxy routes; the catch-all tail is ignored.
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub module_id: String,
}

/// A module response relayed to the caller.
pub struct ProxyReply(ProxyResponse);

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        let ProxyResponse {
            status,
            headers,
            body,
        } = self.0;
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        let target = response.headers_mut();
        for (name, value) in headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    target.append(name, value);
                }
                _ => tracing::debug!(header = %name, "dropping unrepresentable header"),
            }
        }
        response
    }
}

/// Path after `/modules/{module_id}/proxy`, `/` when empty.
fn sub_path(path: &str) -> String {
    let rest = path
        .strip_prefix("/modules/")
        .and_then(|rest| rest.split_once('/'))
        .and_then(|(_, rest)| rest.strip_prefix("proxy"))
        .unwrap_or_default();
    if rest.is_empty() {
        "/".to_string()
    } else {
        rest.to_string()
    }
}

/// `{GET|POST|PUT|PATCH|DELETE} /modules/{module_id}/proxy/**`
pub async fn forward<S, F, C>(
    State(state): State<AppState<S, F, C>>,
    Path(params): Path<ProxyParams>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<ProxyReply, ApiError>
where
    S: ModuleRegistrationStore + Send + Sync + 'static,
    F: ModuleForwarder + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let method: ProxyMethod = method
        .as_str()
        .parse()
        .map_err(|_| ApiError::MethodNotAllowed(method.to_string()))?;
    let request = ProxyRequest {
        module_id: params.module_id,
        method,
        sub_path: sub_path(uri.path()),
        query: uri.query().map(str::to_string),
        body: body.to_vec(),
    };
    let response = state.proxy.forward(request).await?;
    Ok(ProxyReply(response))
}
