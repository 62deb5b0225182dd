use crate::{
    error::{Error, Field, Result},
    status::Poll,
};

/// A `(timestamp, sequence)` pair handed out by a sequencer. The timestamp is
/// in units since the layout epoch.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub timestamp: u64,
    pub sequence: u64,
}

impl Slot {
    pub const fn new(timestamp: u64, sequence: u64) -> Self {
        Self {
            timestamp,
            sequence,
        }
    }
}

/// Per-generator sequencing state: the last slot issued, if any.
///
/// This is the plain, single-owner state machine. [`LockSequencer`] and
/// [`AtomicSequencer`] wrap it to make allocation atomic across threads.
///
/// [`LockSequencer`]: crate::LockSequencer
/// [`AtomicSequencer`]: crate::AtomicSequencer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SequenceState {
    last: Option<Slot>,
    max_sequence: u64,
}

impl SequenceState {
    /// Fresh state: nothing issued yet.
    pub const fn new(max_sequence: u64) -> Self {
        Self {
            last: None,
            max_sequence,
        }
    }

    /// State that continues after `last`, e.g. restored from a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if `last.sequence` exceeds
    /// `max_sequence`.
    pub fn resume(max_sequence: u64, last: Slot) -> Result<Self> {
        if last.sequence > max_sequence {
            return Err(Error::FieldOverflow {
                field: Field::Sequence,
                value: last.sequence,
                max: max_sequence,
            });
        }
        Ok(Self {
            last: Some(last),
            max_sequence,
        })
    }

    /// `last.sequence` must not exceed `max_sequence`.
    pub(crate) const fn issued(max_sequence: u64, last: Slot) -> Self {
        Self {
            last: Some(last),
            max_sequence,
        }
    }

    /// The last slot issued.
    pub const fn last(&self) -> Option<Slot> {
        self.last
    }

    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }

    /// The slot the next allocation at tick `now` would return, without
    /// committing it.
    ///
    /// - A tick past the last one starts over at sequence zero.
    /// - The same tick takes the next sequence, or reports
    ///   [`Poll::Pending`] once the sequence is used up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if `now` is before the last tick.
    pub fn peek(&self, now: u64) -> Result<Poll<Slot>> {
        let Some(last) = self.last else {
            return Ok(Poll::Ready {
                value: Slot::new(now, 0),
            });
        };

        if now > last.timestamp {
            Ok(Poll::Ready {
                value: Slot::new(now, 0),
            })
        } else if now == last.timestamp {
            if last.sequence < self.max_sequence {
                Ok(Poll::Ready {
                    value: Slot::new(now, last.sequence + 1),
                })
            } else {
                Ok(Poll::Pending { yield_for: 1 })
            }
        } else {
            Err(Self::cold_clock_behind(now, last.timestamp))
        }
    }

    /// Allocates the next slot at tick `now`. Only a `Ready` outcome changes
    /// the state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if `now` is before the last tick.
    pub fn allocate(&mut self, now: u64) -> Result<Poll<Slot>> {
        let polled = self.peek(now)?;
        if let Poll::Ready { value } = polled {
            self.last = Some(value);
        }
        Ok(polled)
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            observed = now,
            last,
            behind = last - now,
            "clock moved backwards"
        );
        Error::ClockRegression {
            observed: now,
            last,
        }
    }
}
