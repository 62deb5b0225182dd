use core::time::Duration;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    error::{Error, Result},
    time::TimeSource,
};

/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test can hand one clone to a
/// generator and keep another to drive it: hold time still to exhaust a
/// sequence, step it forward to release a waiting caller, or step it back to
/// simulate an NTP correction.
///
/// # Example
///
/// ```
/// use flakeid::{ManualClock, TimeSource};
///
/// let clock = ManualClock::new(100);
/// let handle = clock.clone();
///
/// handle.advance(5);
/// assert_eq!(clock.now_units(), 105);
///
/// handle.rewind(10);
/// assert_eq!(clock.now_units(), 95);
/// ```
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    unit: Duration,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ManualClock {
    /// Creates a millisecond clock frozen at `now` units since the Unix
    /// epoch.
    pub fn new(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
            unit: Duration::from_millis(1),
        }
    }

    /// Creates a clock frozen at `now` units of `unit` since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] if `unit` is zero.
    pub fn with_unit(now: u64, unit: Duration) -> Result<Self> {
        if unit.is_zero() {
            return Err(Error::InvalidLayout {
                reason: "time unit must be non-zero",
            });
        }
        Ok(Self {
            unit,
            ..Self::new(now)
        })
    }

    /// Sets the current reading.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::Release);
    }

    /// Moves the reading forward, saturating at `u64::MAX`.
    pub fn advance(&self, units: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(units))
            });
    }

    /// Moves the reading backward, saturating at zero.
    pub fn rewind(&self, units: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_sub(units))
            });
    }
}

impl TimeSource for ManualClock {
    fn now_units(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }

    fn unit(&self) -> Duration {
        self.unit
    }
}
