use core::fmt;

/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The three fields packed into every [`SnowflakeId`].
///
/// [`SnowflakeId`]: crate::SnowflakeId
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    GeneratorId,
    Sequence,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timestamp => "timestamp",
            Self::GeneratorId => "generator id",
            Self::Sequence => "sequence",
        })
    }
}

/// All error variants that `flakeid` can emit.
///
/// None of these are auto-corrected: a failed call leaves the generator's
/// sequence state untouched, so the next successful call behaves as if the
/// failed one never happened.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A value does not fit the bit width of its field.
    ///
    /// For the timestamp field this means the layout's lifespan
    /// (`2^timestamp_bits` units after the epoch) has been used up. Not
    /// retryable.
    #[error("{field} value {value} exceeds its field maximum of {max}")]
    FieldOverflow { field: Field, value: u64, max: u64 },

    /// The generator identity is out of range for the layout. Only raised at
    /// construction.
    #[error("generator id {id} is out of range (max {max})")]
    InvalidGeneratorId { id: u64, max: u64 },

    /// The time source reported a tick earlier than the last one used to
    /// issue an ID. Both values are in units since the layout's epoch.
    #[error("clock moved backwards: observed tick {observed}, last issued tick {last}")]
    ClockRegression { observed: u64, last: u64 },

    /// The field widths add up to more than the usable bits of an `i64`.
    #[error("bit layout uses {bits} bits, but at most {max} are usable")]
    LayoutTooWide { bits: u32, max: u32 },

    /// The layout is malformed for a reason other than its total width.
    #[error("invalid bit layout: {reason}")]
    InvalidLayout { reason: &'static str },

    /// The time source reported a tick before the layout's epoch. Both values
    /// are in units since the Unix epoch.
    #[error("clock tick {now} predates the layout epoch tick {epoch}")]
    BeforeEpoch { now: u64, epoch: u64 },

    /// The sequence for the current tick is used up and the generator was
    /// configured with [`WaitStrategy::Fail`].
    ///
    /// [`WaitStrategy::Fail`]: crate::WaitStrategy::Fail
    #[error("sequence exhausted for the current tick")]
    SequenceExhausted,

    /// The sequencer lock was poisoned by a panicking thread.
    ///
    /// With the `parking-lot` feature mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("sequencer lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
