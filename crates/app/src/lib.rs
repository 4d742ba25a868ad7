//! # modhub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ModuleRegistrationStore` - keyed, single-statement persistence of registrations
//!   - `ModuleForwarder` - send one request to a module over HTTP
//! - Define **driving/inbound ports** as use-case structs:
//!   - `ModuleRegistry` - register, heartbeat, list, describe, unregister
//!   - `ProxyService` - path check, resolution, liveness gate, forwarding
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `modhub-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
