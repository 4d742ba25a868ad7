//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use modhub_domain::error::{ModHubError, ProxyError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

/// Maps registry and proxy errors to an HTTP response with appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Registry(ModHubError),
    Proxy(ProxyError),
    MethodNotAllowed(String),
}

impl From<ModHubError> for ApiError {
    fn from(err: ModHubError) -> Self {
        Self::Registry(err)
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        Self::Proxy(err)
    }
}

fn registry_parts(err: &ModHubError) -> (StatusCode, &'static str, String) {
    match err {
        ModHubError::Validation(err) => (StatusCode::BAD_REQUEST, "validation", err.to_string()),
        ModHubError::NotFound(err) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        ModHubError::Storage(err) => {
            tracing::error!(error = %err, "storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage",
                "internal server error".to_string(),
            )
        }
    }
}

fn proxy_status(err: &ProxyError) -> StatusCode {
    match err {
        ProxyError::Validation(ValidationError::ForbiddenPath(_)) => StatusCode::FORBIDDEN,
        ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
        ProxyError::NotFound { .. } => StatusCode::NOT_FOUND,
        ProxyError::Stale { .. } => StatusCode::CONFLICT,
        ProxyError::UpstreamClient { .. } | ProxyError::UpstreamServer { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ProxyError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ProxyError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            Self::Registry(err) => registry_parts(err),
            Self::Proxy(err) => (proxy_status(err), err.kind(), err.to_string()),
            Self::MethodNotAllowed(method) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "validation",
                format!("method {method} is not supported by the proxy"),
            ),
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                kind,
            }),
        )
            .into_response()
    }
}
