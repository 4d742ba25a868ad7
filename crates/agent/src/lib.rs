//! # modhub-agent
//!
//! Registration agent that runs inside each peripheral module process.
//!
//! ## Responsibilities
//! - Generate the module identity once per process
//! - Register with the gateway, retrying with a fixed backoff
//! - Keep the registration alive with periodic heartbeats
//! - Register again when the gateway no longer knows the module
//!
//! ## Dependency rule
//! Depends on `modhub-domain` for the registration contract only. Talks to
//! the gateway over its published HTTP API, never through gateway crates.

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;

pub use agent::{AgentState, RegistrationAgent};
pub use client::{GatewayClient, HttpGatewayClient};
pub use config::AgentConfig;
pub use error::AgentError;
