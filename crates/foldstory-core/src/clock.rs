//! Clock abstraction for determinism.

use chrono::{DateTime, Utc};

/// Abstraction over system time for deterministic behavior.
///
/// Session expiry is derived from timestamps at read time, so every
/// timestamp the engine records must come through this trait.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
