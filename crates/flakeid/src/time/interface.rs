use core::time::Duration;
use std::sync::Arc;

/// Crate default epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// Instagram epoch: Saturday, January 1, 2011 00:00:00 UTC
pub const INSTAGRAM_EPOCH: Duration = Duration::from_millis(1_293_840_000_000);

/// Standard UNIX epoch: Thursday, January 1, 1970 00:00:00 UTC
pub const UNIX_EPOCH: Duration = Duration::ZERO;

/// A source of "now", counted in whole time units since the Unix epoch.
///
/// The unit is whatever resolution the source was built with, reported by
/// [`TimeSource::unit`]. It must match the [`BitLayout::unit`] of the
/// generator the source is handed to; generators refuse a mismatched clock.
///
/// Sources are **not** required to be monotonic. Wall clocks step backwards
/// under NTP corrections or VM migration; the generator detects that and
/// reports [`Error::ClockRegression`] instead of trusting the reading.
///
/// # Example
///
/// ```
/// use flakeid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn now_units(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.now_units(), 1234);
/// assert_eq!(FixedTime.unit(), std::time::Duration::from_millis(1));
/// ```
///
/// [`BitLayout::unit`]: crate::BitLayout::unit
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
pub trait TimeSource {
    /// Returns the number of elapsed units since 1970-01-01 UTC.
    fn now_units(&self) -> u64;

    /// The length of one unit. Defaults to one millisecond.
    fn unit(&self) -> Duration {
        Duration::from_millis(1)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_units(&self) -> u64 {
        (**self).now_units()
    }

    fn unit(&self) -> Duration {
        (**self).unit()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now_units(&self) -> u64 {
        (**self).now_units()
    }

    fn unit(&self) -> Duration {
        (**self).unit()
    }
}

/// Converts a duration to whole units, saturating at `u64::MAX`.
pub(crate) fn to_units(duration: Duration, unit: Duration) -> u64 {
    let units = duration.as_nanos() / unit.as_nanos().max(1);
    u64::try_from(units).unwrap_or(u64::MAX)
}

/// Converts a count of units back to a duration, saturating at
/// `Duration::MAX`.
pub(crate) fn from_units(units: u64, unit: Duration) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let nanos = unit.as_nanos().saturating_mul(u128::from(units));
    match u64::try_from(nanos / NANOS_PER_SEC) {
        Ok(secs) => Duration::new(secs, (nanos % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    }
}
