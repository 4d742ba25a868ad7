//! Forwarder port: sends one request to a module's HTTP endpoint.

use std::future::Future;

use modhub_domain::error::BoxError;
use modhub_domain::proxy::{ProxyResponse, UpstreamRequest};

/// Why a request could not be exchanged with a module.
///
/// Any HTTP response, whatever its status, is a success at this port.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Connection refused, DNS failure, connect or read timeout.
    #[error("module unreachable: {0}")]
    Unreachable(#[source] BoxError),

    #[error("forwarding failed: {0}")]
    Other(#[source] BoxError),
}

/// Outbound HTTP client used by the proxy.
pub trait ModuleForwarder {
    /// Send `request` and return the raw upstream response.
    fn forward(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<ProxyResponse, ForwardError>> + Send;
}

impl<T: ModuleForwarder + Send + Sync> ModuleForwarder for std::sync::Arc<T> {
    fn forward(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<ProxyResponse, ForwardError>> + Send {
        (**self).forward(request)
    }
}
