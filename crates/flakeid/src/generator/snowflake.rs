#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::GeneratorConfig,
    error::{Error, Field, Result},
    generator::{AtomicSequencer, LockSequencer, SequenceState, Sequencer, Slot, WaitStrategy},
    id::{BitLayout, Decoder, SnowflakeId},
    status::Poll,
    time::TimeSource,
};

/// A Snowflake ID generator bound to one layout, one generator id and one
/// clock.
///
/// The generator owns its sequencing state; share it across threads by
/// reference or behind an [`Arc`] rather than building a second generator
/// with the same id. It is `Send + Sync` whenever the clock is.
///
/// `S` picks how allocation is made atomic: [`LockSequencer`] (the default)
/// or [`AtomicSequencer`] through the [`AtomicGenerator`] alias.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use flakeid::{BitLayout, Generator, ManualClock};
///
/// let layout = BitLayout::new(41, 10, 12)?.with_epoch(Duration::from_millis(1_609_459_200_000));
/// let clock = ManualClock::new(1_609_459_200_123);
/// let generator = Generator::new(layout, 5, clock.clone())?;
///
/// let a = generator.next_id()?;
/// let b = generator.next_id()?;
/// clock.advance(1);
/// let c = generator.next_id()?;
///
/// let decoder = generator.decoder();
/// assert_eq!(decoder.decode(a).parts().sequence, 0);
/// assert_eq!(decoder.decode(b).parts().sequence, 1);
/// assert_eq!(decoder.decode(c).timestamp, 124);
/// assert!(a < b && b < c);
/// # Ok::<(), flakeid::Error>(())
/// ```
///
/// [`Arc`]: std::sync::Arc
pub struct Generator<T, S = LockSequencer> {
    layout: BitLayout,
    generator_id: u64,
    clock: T,
    sequencer: S,
    wait: WaitStrategy,
}

/// A [`Generator`] backed by the lock-free [`AtomicSequencer`].
pub type AtomicGenerator<T> = Generator<T, AtomicSequencer>;

impl<T> Generator<T>
where
    T: TimeSource,
{
    /// Creates a lock-based generator that has issued nothing yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGeneratorId`] if `generator_id` does not fit
    /// the layout's generator-id field, or [`Error::InvalidLayout`] if the
    /// clock's unit differs from the layout's.
    pub fn new(layout: BitLayout, generator_id: u64, clock: T) -> Result<Self> {
        Self::create(layout, generator_id, clock)
    }
}

impl<T, S> Generator<T, S>
where
    T: TimeSource,
    S: Sequencer,
{
    /// Creates a generator with any [`Sequencer`] that has issued nothing
    /// yet.
    ///
    /// ```
    /// use flakeid::{AtomicGenerator, BitLayout, SystemClock};
    ///
    /// let generator = AtomicGenerator::create(BitLayout::default(), 7, SystemClock::default())?;
    /// let id = generator.next_id()?;
    /// assert_eq!(generator.decoder().decode(id).generator_id, 7);
    /// # Ok::<(), flakeid::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGeneratorId`] if `generator_id` does not fit
    /// the layout's generator-id field, or [`Error::InvalidLayout`] if the
    /// clock's unit differs from the layout's.
    pub fn create(layout: BitLayout, generator_id: u64, clock: T) -> Result<Self> {
        Self::resume(layout, generator_id, clock, None)
    }

    /// Creates a generator that continues after a previously issued slot,
    /// typically one obtained from [`Self::checkpoint`] and persisted by the
    /// host.
    ///
    /// IDs are then only issued for ticks at or after `last.timestamp`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidGeneratorId`] if `generator_id` does not fit the
    ///   layout
    /// - [`Error::InvalidLayout`] if the clock does not count in the layout's
    ///   unit
    /// - [`Error::FieldOverflow`] if `last` does not fit the layout
    pub fn resume(
        layout: BitLayout,
        generator_id: u64,
        clock: T,
        last: Option<Slot>,
    ) -> Result<Self> {
        let max = layout.max_generator_id();
        if generator_id > max {
            return Err(Error::InvalidGeneratorId {
                id: generator_id,
                max,
            });
        }
        if clock.unit() != layout.unit() {
            return Err(Error::InvalidLayout {
                reason: "clock unit does not match the layout unit",
            });
        }

        let state = match last {
            None => SequenceState::new(layout.max_sequence()),
            Some(slot) => {
                layout.check(Field::Timestamp, slot.timestamp)?;
                SequenceState::resume(layout.max_sequence(), slot)?
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            generator_id,
            timestamp_bits = layout.timestamp_bits(),
            generator_id_bits = layout.generator_id_bits(),
            sequence_bits = layout.sequence_bits(),
            resumed = last.is_some(),
            "generator created"
        );

        Ok(Self {
            layout,
            generator_id,
            clock,
            sequencer: S::from_state(state),
            wait: WaitStrategy::default(),
        })
    }

    /// Builds a generator from a [`GeneratorConfig`].
    ///
    /// # Errors
    ///
    /// Any error from [`GeneratorConfig::layout`],
    /// [`GeneratorConfig::generator_id`] or [`Self::create`].
    pub fn from_config(config: &GeneratorConfig, clock: T) -> Result<Self> {
        let layout = config.layout()?;
        let generator_id = config.generator_id()?;
        Ok(Self::create(layout, generator_id, clock)?.with_wait(config.wait))
    }

    /// Sets what [`Self::next_id`] does when a tick's sequence is used up.
    #[must_use]
    pub fn with_wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// Attempts to issue the next ID without blocking.
    ///
    /// Returns [`Poll::Pending`] when the sequence for the current tick is
    /// used up; poll again once the clock has advanced.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock is behind the last issued
    ///   tick
    /// - [`Error::BeforeEpoch`] if the clock predates the layout epoch
    /// - [`Error::FieldOverflow`] if the layout's lifespan is used up
    /// - a lock error if the sequencer mutex is poisoned
    ///
    /// None of these change the generator's state.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll<SnowflakeId>> {
        let polled = self
            .sequencer
            .allocate(|| self.layout.elapsed_units(self.clock.now_units()))?;

        match polled {
            Poll::Ready { value: slot } => Ok(Poll::Ready {
                value: self
                    .layout
                    .encode(slot.timestamp, self.generator_id, slot.sequence)?,
            }),
            Poll::Pending { yield_for } => {
                #[cfg(feature = "tracing")]
                tracing::debug!(yield_for, "sequence exhausted");
                Ok(Poll::Pending { yield_for })
            }
        }
    }

    /// Issues the next ID, waiting with the configured [`WaitStrategy`] while
    /// the current tick's sequence is used up.
    ///
    /// # Errors
    ///
    /// Everything [`Self::poll_id`] returns, plus
    /// [`Error::SequenceExhausted`] under [`WaitStrategy::Fail`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        loop {
            match self.poll_id()? {
                Poll::Ready { value } => break Ok(value),
                Poll::Pending { .. } => self.wait.pause()?,
            }
        }
    }

    /// The last slot issued, for persisting and passing to [`Self::resume`].
    ///
    /// # Errors
    ///
    /// Returns a lock error if the sequencer mutex is poisoned.
    pub fn checkpoint(&self) -> Result<Option<Slot>> {
        Ok(self.sequencer.snapshot()?.last())
    }

    pub const fn layout(&self) -> &BitLayout {
        &self.layout
    }

    pub const fn generator_id(&self) -> u64 {
        self.generator_id
    }

    pub const fn wait(&self) -> WaitStrategy {
        self.wait
    }

    pub const fn clock(&self) -> &T {
        &self.clock
    }

    /// A [`Decoder`] for the IDs this generator issues.
    pub const fn decoder(&self) -> Decoder {
        Decoder::new(self.layout)
    }
}

impl<T, S> core::fmt::Debug for Generator<T, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Generator")
            .field("layout", &self.layout)
            .field("generator_id", &self.generator_id)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}
