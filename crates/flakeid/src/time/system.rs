use core::time::Duration;
use std::time::SystemTime;

use crate::{
    error::{Error, Result},
    time::{TimeSource, interface::to_units},
};

/// The operating system wall clock.
///
/// Every call reads [`SystemTime::now`], so readings follow NTP steps and
/// manual adjustments, including backwards ones. Pair it with a generator
/// when surfacing [`Error::ClockRegression`] to the caller is preferable to
/// drifting away from real time; otherwise prefer [`MonotonicClock`].
///
/// A system time before 1970 reads as zero, which the generator rejects with
/// [`Error::BeforeEpoch`].
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
/// [`Error::BeforeEpoch`]: crate::Error::BeforeEpoch
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    unit: Duration,
}

impl Default for SystemClock {
    /// A millisecond wall clock.
    fn default() -> Self {
        Self {
            unit: Duration::from_millis(1),
        }
    }
}

impl SystemClock {
    /// A wall clock counting in `unit`-sized ticks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] if `unit` is zero.
    pub fn with_unit(unit: Duration) -> Result<Self> {
        if unit.is_zero() {
            return Err(Error::InvalidLayout {
                reason: "time unit must be non-zero",
            });
        }
        Ok(Self { unit })
    }
}

impl TimeSource for SystemClock {
    fn now_units(&self) -> u64 {
        let since_unix = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        to_units(since_unix, self.unit)
    }

    fn unit(&self) -> Duration {
        self.unit
    }
}
