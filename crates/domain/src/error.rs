//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.
//! Registry and storage ports speak [`ModHubError`]; the proxy router speaks
//! [`ProxyError`], which keeps every forwarding failure mode distinct.

/// Boxed error used where an adapter-specific source crosses a port boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Base error for registry and storage operations.
#[derive(Debug, thiserror::Error)]
pub enum ModHubError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("storage error: {0}")]
    Storage(#[source] BoxError),
}

/// Invalid input rejected before touching storage or the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("base URL must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("access to path {0:?} is not allowed")]
    ForbiddenPath(String),

    #[error("path {0:?} contains a parent directory segment")]
    PathTraversal(String),
}

/// A record addressed by key does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Why a proxied request could not be relayed.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("module not found or not active: {module_id}")]
    NotFound { module_id: String },

    #[error("module appears to be inactive (no heartbeat for {minutes} minutes): {module_id}")]
    Stale { module_id: String, minutes: i64 },

    #[error("module returned client error: {status}")]
    UpstreamClient { status: u16 },

    #[error("module returned server error: {status}")]
    UpstreamServer { status: u16 },

    #[error("module is not accessible: {0}")]
    Unreachable(#[source] BoxError),

    #[error("unexpected error during proxy request: {0}")]
    Unexpected(#[source] BoxError),
}

impl ProxyError {
    /// Stable machine-readable name of the failure kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Stale { .. } => "stale_module",
            Self::UpstreamClient { .. } => "upstream_client_error",
            Self::UpstreamServer { .. } => "upstream_server_error",
            Self::Unreachable(_) => "upstream_unreachable",
            Self::Unexpected(_) => "unexpected",
        }
    }
}
