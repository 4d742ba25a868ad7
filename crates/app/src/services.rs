//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod proxy_service;
pub mod registry_service;

#[cfg(test)]
mod fakes;

pub use proxy_service::ProxyService;
pub use registry_service::ModuleRegistry;
