use core::time::Duration;
use portable_atomic::{AtomicU64, Ordering};
use std::{
    sync::Arc,
    thread,
    time::{Instant, SystemTime},
};

use crate::{
    error::{Error, Result},
    time::{TimeSource, interface::to_units},
};

#[derive(Debug)]
struct SharedTicker {
    elapsed: AtomicU64,
}

/// A time source that never goes backwards.
///
/// The wall clock is sampled once at construction to anchor the clock to the
/// Unix epoch. From then on a background thread advances a shared counter
/// once per unit, measuring elapsed time with [`Instant`]. Readings are a
/// single atomic load, and NTP steps or manual wall-clock changes after
/// construction have no effect.
///
/// Clones share the same ticker thread. The thread exits once the last clone
/// is dropped.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use flakeid::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock::default();
/// let before = clock.now_units();
/// std::thread::sleep(Duration::from_millis(5));
///
/// // Timer alignment may leave the counter a tick behind, but it never
/// // moves backwards.
/// assert!(clock.now_units() >= before);
/// ```
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    ticker: Arc<SharedTicker>,
    anchor: u64,
    unit: Duration,
}

impl Default for MonotonicClock {
    /// A millisecond monotonic clock.
    fn default() -> Self {
        Self::spawn(Duration::from_millis(1))
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock that counts `unit`-sized ticks since the
    /// Unix epoch.
    ///
    /// A system time before 1970 anchors the clock at zero.
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
        Ok(Self::spawn(unit))
    }

    /// Spawns the ticker for a non-zero `unit`.
    fn spawn(unit: Duration) -> Self {
        let start = Instant::now();
        let since_unix = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();

        let ticker = Arc::new(SharedTicker {
            elapsed: AtomicU64::new(0),
        });

        let weak = Arc::downgrade(&ticker);
        let unit_nanos = unit.as_nanos();
        thread::spawn(move || {
            let mut tick: u64 = 0;

            loop {
                let Some(shared) = weak.upgrade() else {
                    break;
                };

                // Absolute target of the next tick
                let offset = u64::try_from(unit_nanos.saturating_mul(u128::from(tick)))
                    .unwrap_or(u64::MAX);
                if let Some(target) = start.checked_add(Duration::from_nanos(offset)) {
                    let now = Instant::now();
                    if now < target {
                        thread::sleep(target - now);
                    }
                }

                let elapsed = to_units(start.elapsed(), unit);
                shared.elapsed.store(elapsed, Ordering::Relaxed);

                // Align to the tick after the one just observed
                tick = elapsed.saturating_add(1);
            }
        });

        Self {
            ticker,
            anchor: to_units(since_unix, unit),
            unit,
        }
    }
}

impl TimeSource for MonotonicClock {
    fn now_units(&self) -> u64 {
        self.anchor + self.ticker.elapsed.load(Ordering::Relaxed)
    }

    fn unit(&self) -> Duration {
        self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::default();
        let mut last = clock.now_units();
        for _ in 0..10_000 {
            let now = clock.now_units();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn monotonic_clock_advances() {
        let clock = MonotonicClock::default();
        let before = clock.now_units();
        thread::sleep(Duration::from_millis(20));
        assert!(clock.now_units() > before);
    }

    #[test]
    fn monotonic_clock_is_anchored_to_wall_time() {
        let clock = MonotonicClock::default();
        let wall = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        assert!(clock.now_units().abs_diff(wall) < 1_000);
    }

    #[test]
    fn monotonic_clock_counts_in_its_unit() {
        let clock = MonotonicClock::with_unit(Duration::from_secs(1)).unwrap();
        let wall = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert_eq!(clock.unit(), Duration::from_secs(1));
        assert!(clock.now_units().abs_diff(wall) <= 1);

        assert!(matches!(
            MonotonicClock::with_unit(Duration::ZERO),
            Err(Error::InvalidLayout { .. })
        ));
    }

    #[test]
    fn clones_share_the_ticker() {
        let clock = MonotonicClock::default();
        let clone = clock.clone();
        thread::sleep(Duration::from_millis(5));
        let (a, b) = (clock.now_units(), clone.now_units());
        assert!(a.abs_diff(b) <= 1);
    }
}
