#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::Result,
    generator::{SequenceState, Sequencer, Slot},
    mutex::Mutex,
    status::Poll,
};

/// A [`Sequencer`] that guards the [`SequenceState`] with a mutex.
///
/// The clock is sampled while the lock is held, so concurrent callers are
/// serialized on both the state and the reading it is compared against.
///
/// ## Recommended When
/// - Fair access across threads is important
/// - Your target doesn't support 64-bit atomics
///
/// ## See Also
/// - [`AtomicSequencer`]
///
/// [`AtomicSequencer`]: crate::AtomicSequencer
#[derive(Debug)]
pub struct LockSequencer {
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<SequenceState>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<SequenceState>,
}

impl Sequencer for LockSequencer {
    fn from_state(state: SequenceState) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(state),
        }
    }

    fn snapshot(&self) -> Result<SequenceState> {
        #[cfg(feature = "parking-lot")]
        let state = self.state.lock();
        #[cfg(not(feature = "parking-lot"))]
        let state = self.state.lock()?;
        Ok(*state)
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, now)))]
    fn allocate<F>(&self, mut now: F) -> Result<Poll<Slot>>
    where
        F: FnMut() -> Result<u64>,
    {
        #[cfg(feature = "parking-lot")]
        let mut state = self.state.lock();
        #[cfg(not(feature = "parking-lot"))]
        let mut state = self.state.lock()?;

        let now = now()?;
        state.allocate(now)
    }
}
