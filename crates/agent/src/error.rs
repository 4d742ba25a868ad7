//! Agent error type.

/// Agent failure.
///
/// Gateway exchange failures are recoverable; the agent logs them and tries
/// again later. [`AgentError::InvalidConfig`] is only raised before the agent
/// starts.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("invalid agent configuration: {0}")]
    InvalidConfig(String),

    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway answered with unexpected status {0}")]
    UnexpectedStatus(u16),
}
