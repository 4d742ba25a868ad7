//! # modhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **registration API** used by module agents and operators
//!   (`/modules/register`, `/modules/{id}/heartbeat`, listings, unregister)
//! - Serve the **module proxy** (`/modules/{id}/proxy/**`) for the five
//!   routed HTTP methods
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `modhub-app` (for port traits and services) and `modhub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

pub use state::AppState;
