//! Gateway client: the agent's view of the registration API.

use std::future::Future;

use reqwest::StatusCode;

use modhub_domain::registration::{RegisterModule, RegistrationOutcome};

use crate::error::AgentError;

/// Calls the agent makes against the gateway.
///
/// A rejection from the gateway is an `Ok` outcome with `success = false`;
/// `Err` is reserved for transport failures and unexpected answers.
pub trait GatewayClient {
    fn register(
        &self,
        request: &RegisterModule,
    ) -> impl Future<Output = Result<RegistrationOutcome, AgentError>> + Send;

    fn heartbeat(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<RegistrationOutcome, AgentError>> + Send;
}

/// [`GatewayClient`] speaking JSON over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpGatewayClient {
    client: reqwest::Client,
    gateway_url: String,
}

impl HttpGatewayClient {
    /// Create a client for the gateway rooted at `gateway_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transport`] when the HTTP client cannot be built.
    pub fn new(gateway_url: &str, timeout: std::time::Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        })
    }
}

// The gateway answers rejections with 400 and an outcome body.
async fn read_outcome(response: reqwest::Response) -> Result<RegistrationOutcome, AgentError> {
    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::BAD_REQUEST {
        return Err(AgentError::UnexpectedStatus(status.as_u16()));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|_| AgentError::UnexpectedStatus(status.as_u16()))
}

impl GatewayClient for HttpGatewayClient {
    fn register(
        &self,
        request: &RegisterModule,
    ) -> impl Future<Output = Result<RegistrationOutcome, AgentError>> + Send {
        let client = self.client.clone();
        let url = format!("{}/modules/register", self.gateway_url);
        let request = request.clone();
        async move {
            let response = client.post(url).json(&request).send().await?;
            read_outcome(response).await
        }
    }

    fn heartbeat(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<RegistrationOutcome, AgentError>> + Send {
        let client = self.client.clone();
        let url = format!("{}/modules/{module_id}/heartbeat", self.gateway_url);
        let home_id = home_id.to_string();
        async move {
            let response = client
                .post(url)
                .query(&[("homeId", home_id)])
                .send()
                .await?;
            read_outcome(response).await
        }
    }
}
