use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::Result,
    generator::{SequenceState, Sequencer, Slot},
    id::mask,
    status::Poll,
};

/// A lock-free [`Sequencer`] that keeps the last slot in a single
/// [`AtomicU64`].
///
/// The word holds `(timestamp + 1) << sequence_bits | sequence`, with zero
/// reserved for "nothing issued yet". Allocation is a compare-and-swap loop;
/// the clock is sampled after each load of the word so a reading is never
/// compared against a slot committed after it was taken.
///
/// ## Caveats
/// The packed word must fit 64 bits. Layouts are capped at 63 bits, so any
/// timestamp and sequence the layout accepts fits.
///
/// ## Recommended When
/// - Throughput matters more than fairness under contention
///
/// ## See Also
/// - [`LockSequencer`]
///
/// [`LockSequencer`]: crate::LockSequencer
#[derive(Debug)]
pub struct AtomicSequencer {
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    sequence_bits: u8,
    max_sequence: u64,
}

impl AtomicSequencer {
    fn pack(&self, slot: Slot) -> u64 {
        debug_assert!(slot.timestamp < u64::MAX >> self.sequence_bits);
        ((slot.timestamp + 1) << self.sequence_bits) | slot.sequence
    }

    fn unpack(&self, word: u64) -> SequenceState {
        if word == 0 {
            return SequenceState::new(self.max_sequence);
        }
        let last = Slot::new(
            (word >> self.sequence_bits) - 1,
            word & mask(self.sequence_bits),
        );
        SequenceState::issued(self.max_sequence, last)
    }
}

impl Sequencer for AtomicSequencer {
    fn from_state(state: SequenceState) -> Self {
        let max_sequence = state.max_sequence();
        let mut sequencer = Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(0)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(0),
            sequence_bits: (u64::BITS - max_sequence.leading_zeros()) as u8,
            max_sequence,
        };
        if let Some(last) = state.last() {
            let word = sequencer.pack(last);
            *sequencer.state.get_mut() = word;
        }
        sequencer
    }

    fn snapshot(&self) -> Result<SequenceState> {
        Ok(self.unpack(self.state.load(Ordering::Acquire)))
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, now)))]
    fn allocate<F>(&self, mut now: F) -> Result<Poll<Slot>>
    where
        F: FnMut() -> Result<u64>,
    {
        loop {
            let current = self.state.load(Ordering::Acquire);
            let now = now()?;
            let slot = match self.unpack(current).peek(now)? {
                Poll::Ready { value } => value,
                pending @ Poll::Pending { .. } => return Ok(pending),
            };

            if self
                .state
                .compare_exchange_weak(
                    current,
                    self.pack(slot),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return Ok(Poll::Ready { value: slot });
            }
            core::hint::spin_loop();
        }
    }
}
