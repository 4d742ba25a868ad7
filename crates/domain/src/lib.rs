//! # modhub-domain
//!
//! Pure domain model for the modhub module gateway.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps, clocks
//! - Define **Module registrations** (who is reachable where, for which home)
//! - Define the **liveness policy** (status + heartbeat recency)
//! - Define the **registration contract** shared by the gateway and module agents
//! - Define **proxy value types** (methods, headers, forwarded requests and
//!   relayed responses) and the header sanitization rule
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod liveness;
pub mod module;
pub mod proxy;
pub mod registration;
