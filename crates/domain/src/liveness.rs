//! Liveness policy: decides whether a registration may receive traffic.

use chrono::TimeDelta;
use serde::Serialize;

use crate::module::{ModuleRegistration, ModuleStatus};
use crate::time::Timestamp;

/// Default maximum heartbeat age, in seconds, before a module is considered stale.
pub const DEFAULT_STALENESS_THRESHOLD_SECS: i64 = 300;

/// Verdict of a [`LivenessPolicy`] for one registration at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", rename_all_fields = "camelCase", tag = "state")]
pub enum Liveness {
    /// Active with a recent heartbeat.
    Live,
    /// Stored status is not active.
    Inactive,
    /// Active, but the last heartbeat is older than the threshold.
    Stale { elapsed_minutes: i64 },
}

impl Liveness {
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

/// A stored registration together with its liveness verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    #[serde(flatten)]
    pub registration: ModuleRegistration,
    pub liveness: Liveness,
}

/// A registration is operationally live when its status is
/// [`ModuleStatus::Active`] **and** `now - last_heartbeat <= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessPolicy {
    staleness_threshold: TimeDelta,
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_STALENESS_THRESHOLD_SECS))
    }
}

impl LivenessPolicy {
    #[must_use]
    pub fn new(staleness_threshold: TimeDelta) -> Self {
        Self {
            staleness_threshold,
        }
    }

    /// Policy with a threshold of `secs` seconds; `None` unless positive and
    /// representable.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        TimeDelta::try_seconds(secs)
            .filter(|threshold| *threshold > TimeDelta::zero())
            .map(Self::new)
    }

    #[must_use]
    pub fn staleness_threshold(&self) -> TimeDelta {
        self.staleness_threshold
    }

    /// Evaluate `registration` at `now`.
    #[must_use]
    pub fn evaluate(&self, registration: &ModuleRegistration, now: Timestamp) -> Liveness {
        if registration.status != ModuleStatus::Active {
            return Liveness::Inactive;
        }
        let elapsed = now.signed_duration_since(registration.last_heartbeat);
        if elapsed > self.staleness_threshold {
            return Liveness::Stale {
                elapsed_minutes: elapsed.num_minutes(),
            };
        }
        Liveness::Live
    }
}
