//! # modhub-adapter-http-reqwest
//!
//! Outbound HTTP adapter using [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - Implement `ModuleForwarder` from `modhub-app::ports`
//! - Own the connect and read timeouts of proxied calls
//! - Tell connectivity failures apart from other client errors
//!
//! ## Dependency rule
//! Depends on `modhub-app` (for port traits) and `modhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod forwarder;

pub use forwarder::{Config, ReqwestForwarder};
