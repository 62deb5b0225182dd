use crate::{
    error::Result,
    generator::{SequenceState, Slot},
    status::Poll,
};

/// Makes [`SequenceState`] allocation atomic with respect to concurrent
/// callers.
///
/// `allocate` receives the clock as a closure rather than a reading so the
/// implementation can sample it *inside* its critical section. Sampling
/// before contending would let a caller that lost the race present an older
/// tick than the winner just committed, which would surface as a spurious
/// [`Error::ClockRegression`].
///
/// A failed allocation (the clock closure failing, or a regression) never
/// changes the state.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
pub trait Sequencer {
    /// Wraps an initial state.
    fn from_state(state: SequenceState) -> Self;

    /// Copies out the current state.
    ///
    /// # Errors
    ///
    /// May return an error if the implementation uses a lock and it is
    /// poisoned.
    fn snapshot(&self) -> Result<SequenceState>;

    /// Samples `now` and allocates the next slot in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns whatever `now` fails with, [`Error::ClockRegression`] when the
    /// tick is behind the last one issued, or a lock error.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    fn allocate<F>(&self, now: F) -> Result<Poll<Slot>>
    where
        F: FnMut() -> Result<u64>;
}
