//! Proxy service: forwards requests to live modules and relays their answers.

use std::sync::Arc;

use modhub_domain::error::ProxyError;
use modhub_domain::liveness::Liveness;
use modhub_domain::proxy::{PathGuard, ProxyHeaders, ProxyRequest, ProxyResponse, UpstreamRequest};
use modhub_domain::time::{Clock, SystemClock};

use crate::ports::{ForwardError, ModuleForwarder, ModuleRegistrationStore};
use crate::services::ModuleRegistry;

/// Application service implementing the liveness-gated reverse proxy.
///
/// Each request goes through, in order: path check, resolution, liveness
/// check, target construction, forwarding and result mapping. The first
/// failing step decides the [`ProxyError`].
pub struct ProxyService<S, F, C = SystemClock> {
    registry: Arc<ModuleRegistry<S, C>>,
    forwarder: F,
    guard: PathGuard,
}

impl<S, F, C> ProxyService<S, F, C>
where
    S: ModuleRegistrationStore,
    F: ModuleForwarder,
    C: Clock,
{
    pub fn new(registry: Arc<ModuleRegistry<S, C>>, forwarder: F, guard: PathGuard) -> Self {
        Self {
            registry,
            forwarder,
            guard,
        }
    }

    /// Forward `request` to the module it addresses.
    ///
    /// # Errors
    ///
    /// Returns the [`ProxyError`] of the first step that fails.
    #[tracing::instrument(skip(self, request), fields(module_id = %request.module_id, method = %request.method, sub_path = %request.sub_path))]
    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        self.guard.check(&request.sub_path).inspect_err(|err| {
            tracing::warn!(%err, "blocked proxy path");
        })?;

        let registration = match self.registry.resolve(&request.module_id).await {
            Ok(Some(registration)) => registration,
            Ok(None) => return Err(not_found(&request.module_id)),
            Err(err) => {
                tracing::warn!(%err, "registry lookup failed, treating module as not found");
                return Err(not_found(&request.module_id));
            }
        };

        match self.registry.evaluate(&registration) {
            Liveness::Live => {}
            Liveness::Stale { elapsed_minutes } => {
                tracing::warn!(elapsed_minutes, "module is stale");
                return Err(ProxyError::Stale {
                    module_id: request.module_id,
                    minutes: elapsed_minutes,
                });
            }
            Liveness::Inactive => return Err(not_found(&request.module_id)),
        }

        let url = registration.target_url(&request.sub_path, request.query.as_deref());
        tracing::debug!(%url, "forwarding request");

        let mut headers = ProxyHeaders::new();
        headers.insert("content-type", "application/json");
        let upstream = UpstreamRequest {
            method: request.method,
            url,
            headers: headers.sanitized(),
            body: request.method.carries_body().then_some(request.body),
        };

        let response = self.forwarder.forward(upstream).await.map_err(|err| match err {
            ForwardError::Unreachable(source) => {
                tracing::warn!(err = %source, "module unreachable");
                ProxyError::Unreachable(source)
            }
            ForwardError::Other(source) => {
                tracing::error!(err = %source, "unexpected forwarding failure");
                ProxyError::Unexpected(source)
            }
        })?;

        if response.is_client_error() {
            tracing::warn!(status = response.status, "module returned client error");
            return Err(ProxyError::UpstreamClient {
                status: response.status,
            });
        }
        if response.is_server_error() {
            tracing::warn!(status = response.status, "module returned server error");
            return Err(ProxyError::UpstreamServer {
                status: response.status,
            });
        }
        Ok(response.into_relayable())
    }
}

fn not_found(module_id: &str) -> ProxyError {
    ProxyError::NotFound {
        module_id: module_id.to_string(),
    }
}
