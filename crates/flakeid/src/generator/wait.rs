use core::time::Duration;
use std::thread;

use rand::Rng;

use crate::error::{Error, Result};

/// What [`Generator::next_id`] does when the sequence for the current tick is
/// used up.
///
/// The pause happens outside any lock, then the generator polls again.
///
/// [`Generator::next_id`]: crate::Generator::next_id
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "strategy", rename_all = "snake_case")
)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaitStrategy {
    /// Busy-wait with a CPU spin hint.
    Spin,
    /// Yield the thread to the scheduler.
    #[default]
    Yield,
    /// Sleep for a fixed interval.
    Sleep { interval: Duration },
    /// Sleep for `interval` plus a uniformly random extra of up to `jitter`,
    /// so that callers blocked on the same tick don't wake in lockstep.
    SleepWithJitter { interval: Duration, jitter: Duration },
    /// Give up with [`Error::SequenceExhausted`].
    Fail,
}

impl WaitStrategy {
    /// Pauses once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SequenceExhausted`] for [`WaitStrategy::Fail`].
    pub fn pause(&self) -> Result<()> {
        match *self {
            Self::Spin => core::hint::spin_loop(),
            Self::Yield => thread::yield_now(),
            Self::Sleep { interval } => thread::sleep(interval),
            Self::SleepWithJitter { interval, jitter } => {
                thread::sleep(interval.saturating_add(random_jitter(jitter)));
            }
            Self::Fail => return Err(Error::SequenceExhausted),
        }
        Ok(())
    }
}

fn random_jitter(max: Duration) -> Duration {
    let nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    if nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rand::rng().random_range(0..=nanos))
}
