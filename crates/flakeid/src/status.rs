/// Outcome of a single non-blocking allocation attempt.
///
/// - [`Poll::Ready`] carries the allocated value.
/// - [`Poll::Pending`] means the sequence for the current tick is exhausted
///   and the caller should back off for `yield_for` ticks before polling
///   again.
///
/// # Example
///
/// ```
/// use flakeid::{BitLayout, Generator, ManualClock, Poll};
///
/// let layout = BitLayout::new(41, 10, 0)?;
/// let clock = ManualClock::new(1_735_689_600_000);
/// let generator = Generator::new(layout, 1, clock)?;
///
/// assert!(matches!(generator.poll_id()?, Poll::Ready { .. }));
/// // A zero-width sequence allows one ID per tick.
/// assert_eq!(generator.poll_id()?, Poll::Pending { yield_for: 1 });
/// # Ok::<(), flakeid::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<T> {
    /// A value was allocated and is ready to use.
    Ready {
        /// The allocated value.
        value: T,
    },
    /// Nothing could be allocated until the clock advances.
    Pending {
        /// Ticks to wait before trying again.
        yield_for: u64,
    },
}

impl<T> Poll<T> {
    /// Maps the ready value, keeping `Pending` as is.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Poll<U> {
        match self {
            Self::Ready { value } => Poll::Ready { value: f(value) },
            Self::Pending { yield_for } => Poll::Pending { yield_for },
        }
    }

    /// Returns `true` if this is [`Poll::Ready`].
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
