//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `registered_at`, `last_heartbeat`, liveness checks, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Source of "now" for services that make time-based decisions.
///
/// Injected so liveness and heartbeat logic can be driven by a fake clock.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// [`Clock`] backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
