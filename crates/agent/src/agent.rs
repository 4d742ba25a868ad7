//! Registration agent: registration with retry, then the heartbeat loop.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::GatewayClient;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::identity::generate_module_id;

/// Lifecycle of the agent's registration.
///
/// `Heartbeating` falls back to `Registering` when the gateway answers a
/// heartbeat with "Module not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Unregistered,
    Registering,
    Registered,
    Heartbeating,
}

/// Keeps one module registered with the gateway.
pub struct RegistrationAgent<G> {
    client: G,
    config: AgentConfig,
    module_id: String,
    state: watch::Sender<AgentState>,
}

impl<G> RegistrationAgent<G>
where
    G: GatewayClient + Send + Sync + 'static,
{
    /// Create an agent with a freshly generated module identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] when `config` does not validate.
    pub fn new(config: AgentConfig, client: G) -> Result<Self, AgentError> {
        config.validate()?;
        let module_id = generate_module_id(&config.module_id_prefix);
        let (state, _) = watch::channel(AgentState::Unregistered);
        Ok(Self {
            client,
            config,
            module_id,
            state,
        })
    }

    /// Identifier announced to the gateway, fixed for the process lifetime.
    #[must_use]
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// Observe state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AgentState> {
        self.state.subscribe()
    }

    /// Run the agent on a background task until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Register, then heartbeat until `cancel` fires.
    ///
    /// Returns early, leaving the state at [`AgentState::Unregistered`], when
    /// the initial registration exhausts its attempts.
    #[tracing::instrument(skip_all, fields(module_id = %self.module_id))]
    pub async fn run(self, cancel: CancellationToken) {
        self.set_state(AgentState::Registering);
        if !self.register_with_retry(&cancel).await {
            self.set_state(AgentState::Unregistered);
            if !cancel.is_cancelled() {
                tracing::error!(
                    attempts = self.config.register_max_attempts,
                    "giving up on gateway registration"
                );
            }
            return;
        }
        self.set_state(AgentState::Registered);

        let period = self.config.heartbeat_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self
                .client
                .heartbeat(&self.module_id, &self.config.home_id)
                .await
            {
                Ok(outcome) if outcome.success => {
                    tracing::debug!("heartbeat sent");
                    self.set_state(AgentState::Heartbeating);
                }
                Ok(outcome) if outcome.is_module_not_found() => {
                    tracing::warn!("gateway forgot this module, registering again");
                    self.set_state(AgentState::Registering);
                    if !self.register_until_cancelled(&cancel).await {
                        break;
                    }
                    self.set_state(AgentState::Registered);
                    ticker.reset();
                }
                Ok(outcome) => {
                    tracing::warn!(message = %outcome.message, "heartbeat rejected");
                }
                Err(err) => {
                    tracing::warn!(%err, "heartbeat failed");
                }
            }
        }
        tracing::info!("registration agent stopped");
    }

    fn set_state(&self, state: AgentState) {
        self.state.send_replace(state);
    }

    async fn try_register(&self) -> bool {
        let request = self.config.registration(&self.module_id);
        match self.client.register(&request).await {
            Ok(outcome) if outcome.success => {
                tracing::info!(message = %outcome.message, "registered with gateway");
                true
            }
            Ok(outcome) => {
                tracing::warn!(message = %outcome.message, "registration rejected");
                false
            }
            Err(err) => {
                tracing::warn!(%err, "registration failed");
                false
            }
        }
    }

    /// Returns `false` when cancelled during the backoff sleep.
    async fn backoff(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(self.config.register_retry_delay()) => true,
        }
    }

    async fn register_with_retry(&self, cancel: &CancellationToken) -> bool {
        let max_attempts = self.config.register_max_attempts;
        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return false;
            }
            if self.try_register().await {
                return true;
            }
            tracing::debug!(attempt, max_attempts, "registration attempt failed");
            if attempt < max_attempts && !self.backoff(cancel).await {
                return false;
            }
        }
        false
    }

    async fn register_until_cancelled(&self, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            if self.try_register().await {
                return true;
            }
            if !self.backoff(cancel).await {
                return false;
            }
        }
    }
}
