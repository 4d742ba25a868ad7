//! [`ModuleForwarder`] backed by a shared `reqwest` client.

use std::future::Future;
use std::time::Duration;

use reqwest::redirect::Policy;

use modhub_app::ports::{ForwardError, ModuleForwarder};
use modhub_domain::proxy::{ProxyMethod, ProxyResponse, UpstreamRequest};

/// Timeouts applied to every forwarded call.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Build a [`ReqwestForwarder`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] raised when the TLS backend cannot be
    /// initialised.
    pub fn build(self) -> Result<ReqwestForwarder, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(ReqwestForwarder { client })
    }
}

/// Forwards proxied requests over HTTP. Redirects are returned, not followed.
#[derive(Debug, Clone)]
pub struct ReqwestForwarder {
    client: reqwest::Client,
}

fn to_method(method: ProxyMethod) -> reqwest::Method {
    match method {
        ProxyMethod::Get => reqwest::Method::GET,
        ProxyMethod::Post => reqwest::Method::POST,
        ProxyMethod::Put => reqwest::Method::PUT,
        ProxyMethod::Patch => reqwest::Method::PATCH,
        ProxyMethod::Delete => reqwest::Method::DELETE,
    }
}

fn classify(err: reqwest::Error) -> ForwardError {
    if err.is_connect() || err.is_timeout() {
        ForwardError::Unreachable(Box::new(err))
    } else {
        ForwardError::Other(Box::new(err))
    }
}

impl ModuleForwarder for ReqwestForwarder {
    fn forward(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<ProxyResponse, ForwardError>> + Send {
        let client = self.client.clone();
        async move {
            let mut builder = client.request(to_method(request.method), &request.url);
            for (name, value) in request.headers.iter() {
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(classify)?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response.bytes().await.map_err(classify)?.to_vec();
            tracing::debug!(url = %request.url, status, bytes = body.len(), "module responded");

            Ok(ProxyResponse {
                status,
                headers,
                body,
            })
        }
    }
}
