use core::cell::Cell;
use core::time::Duration;
use std::collections::HashSet;
use std::sync::Mutex;
use std::thread::{self, scope};

use crate::{
    AtomicSequencer, BitLayout, Error, Field, Generator, GeneratorConfig, LockSequencer,
    ManualClock, MonotonicClock, Poll, Sequencer, Slot, SnowflakeId, SystemClock, TimeSource,
    WaitStrategy,
};

const EPOCH_2021: Duration = Duration::from_millis(1_609_459_200_000);

/// Hands out `values` one reading per call, then repeats the last one.
struct StepClock {
    values: Vec<u64>,
    index: Cell<usize>,
}

impl StepClock {
    fn new(values: &[u64]) -> Self {
        Self {
            values: values.to_vec(),
            index: Cell::new(0),
        }
    }
}

impl TimeSource for StepClock {
    fn now_units(&self) -> u64 {
        let index = self.index.get();
        self.index.set(index + 1);
        self.values[index.min(self.values.len() - 1)]
    }
}

trait PollExt {
    fn unwrap_ready(self) -> SnowflakeId;
    fn unwrap_pending(self) -> u64;
}

impl PollExt for Poll<SnowflakeId> {
    fn unwrap_ready(self) -> SnowflakeId {
        match self {
            Self::Ready { value } => value,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { value } => panic!("unexpected ready ({value})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn unix_layout(timestamp_bits: u8, generator_id_bits: u8, sequence_bits: u8) -> BitLayout {
    BitLayout::new(timestamp_bits, generator_id_bits, sequence_bits)
        .unwrap()
        .with_epoch(Duration::ZERO)
}

fn parts<T: TimeSource, S: Sequencer>(
    generator: &Generator<T, S>,
    id: SnowflakeId,
) -> (u64, u64, u64) {
    let decoded = generator.decoder().decode(id);
    (decoded.timestamp, decoded.generator_id, decoded.sequence)
}

fn run_end_to_end<S: Sequencer>() {
    let layout = BitLayout::new(41, 10, 12).unwrap().with_epoch(EPOCH_2021);
    let clock = StepClock::new(&[1_609_459_200_123, 1_609_459_200_123, 1_609_459_200_124]);
    let generator = Generator::<_, S>::create(layout, 5, clock).unwrap();

    let a = generator.next_id().unwrap();
    let b = generator.next_id().unwrap();
    let c = generator.next_id().unwrap();

    assert_eq!(parts(&generator, a), (123, 5, 0));
    assert_eq!(parts(&generator, b), (123, 5, 1));
    assert_eq!(parts(&generator, c), (124, 5, 0));
    assert!(a < b && b < c);
    assert_eq!(
        generator.decoder().decode(c).unix_time(),
        Duration::from_millis(1_609_459_200_124)
    );
}

fn run_sequence_increments_within_same_tick<S: Sequencer>() {
    let generator =
        Generator::<_, S>::create(unix_layout(41, 10, 12), 1, ManualClock::new(42)).unwrap();
    for sequence in 0..3 {
        let id = generator.poll_id().unwrap().unwrap_ready();
        assert_eq!(parts(&generator, id), (42, 1, sequence));
    }
}

fn run_rollover_returns_pending<S: Sequencer>() {
    let clock = ManualClock::new(42);
    let generator = Generator::<_, S>::create(unix_layout(41, 10, 4), 3, clock.clone()).unwrap();

    for sequence in 0..=generator.layout().max_sequence() {
        let id = generator.poll_id().unwrap().unwrap_ready();
        assert_eq!(parts(&generator, id), (42, 3, sequence));
    }
    assert_eq!(generator.poll_id().unwrap().unwrap_pending(), 1);
    assert_eq!(generator.poll_id().unwrap().unwrap_pending(), 1);

    clock.advance(1);
    let id = generator.poll_id().unwrap().unwrap_ready();
    assert_eq!(parts(&generator, id), (43, 3, 0));
}

fn run_rollover_blocks_until_the_clock_advances<S: Sequencer + Sync>() {
    let clock = ManualClock::new(500);
    let generator = Generator::<_, S>::create(unix_layout(41, 10, 2), 0, clock.clone()).unwrap();

    for _ in 0..4 {
        generator.next_id().unwrap();
    }

    scope(|s| {
        let waiter = s.spawn(|| generator.next_id());
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished(), "the fifth call must block");

        clock.advance(1);
        let id = waiter.join().unwrap().unwrap();
        assert_eq!(parts(&generator, id), (501, 0, 0));
    });
}

fn run_regression_fails_and_leaves_state_untouched<S: Sequencer>() {
    let clock = ManualClock::new(100);
    let generator = Generator::<_, S>::create(unix_layout(41, 10, 12), 9, clock.clone()).unwrap();

    generator.next_id().unwrap();
    let before = generator.next_id().unwrap();
    let checkpoint = generator.checkpoint().unwrap();

    clock.rewind(1);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockRegression {
            observed: 99,
            last: 100,
        })
    );
    assert_eq!(
        generator.poll_id(),
        Err(Error::ClockRegression {
            observed: 99,
            last: 100,
        })
    );
    assert_eq!(generator.checkpoint().unwrap(), checkpoint);

    clock.set(100);
    let after = generator.next_id().unwrap();
    assert_eq!(parts(&generator, after), (100, 9, 2));
    assert!(after > before);
}

fn run_regression_is_reported_relative_to_the_epoch<S: Sequencer>() {
    let layout = BitLayout::new(41, 10, 12).unwrap().with_epoch(EPOCH_2021);
    let clock = ManualClock::new(1_609_459_200_500);
    let generator = Generator::<_, S>::create(layout, 0, clock.clone()).unwrap();

    generator.next_id().unwrap();
    clock.rewind(20);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockRegression {
            observed: 480,
            last: 500,
        })
    );
}

fn run_fail_strategy_reports_exhaustion<S: Sequencer>() {
    let clock = ManualClock::new(7);
    let generator = Generator::<_, S>::create(unix_layout(41, 10, 0), 1, clock.clone())
        .unwrap()
        .with_wait(WaitStrategy::Fail);

    let first = generator.next_id().unwrap();
    assert_eq!(generator.next_id(), Err(Error::SequenceExhausted));

    clock.advance(1);
    let second = generator.next_id().unwrap();
    assert_eq!(parts(&generator, second), (8, 1, 0));
    assert!(second > first);
}

fn run_clock_errors_surface<S: Sequencer>() {
    let layout = BitLayout::new(41, 10, 12).unwrap().with_epoch(EPOCH_2021);
    let early = Generator::<_, S>::create(layout, 0, ManualClock::new(1_000)).unwrap();
    assert_eq!(
        early.next_id(),
        Err(Error::BeforeEpoch {
            now: 1_000,
            epoch: 1_609_459_200_000,
        })
    );

    let short_lived =
        Generator::<_, S>::create(unix_layout(8, 0, 0), 0, ManualClock::new(256)).unwrap();
    assert_eq!(
        short_lived.next_id(),
        Err(Error::FieldOverflow {
            field: Field::Timestamp,
            value: 256,
            max: 255,
        })
    );
    assert_eq!(short_lived.checkpoint().unwrap(), None);
}

fn run_generator_id_is_validated<S: Sequencer>() {
    let layout = unix_layout(41, 10, 12);
    assert!(matches!(
        Generator::<_, S>::create(layout, 1 << 10, ManualClock::new(0)),
        Err(Error::InvalidGeneratorId { id: 1024, max: 1023 })
    ));
    assert!(Generator::<_, S>::create(layout, 1023, ManualClock::new(0)).is_ok());

    let no_room = unix_layout(51, 0, 12);
    assert!(matches!(
        Generator::<_, S>::create(no_room, 1, ManualClock::new(0)),
        Err(Error::InvalidGeneratorId { id: 1, max: 0 })
    ));
}

fn run_clock_unit_must_match_the_layout<S: Sequencer>() {
    let seconds = unix_layout(31, 16, 16)
        .with_unit(Duration::from_secs(1))
        .unwrap();
    assert!(matches!(
        Generator::<_, S>::create(seconds, 0, ManualClock::new(60)),
        Err(Error::InvalidLayout { .. })
    ));
    assert!(matches!(
        Generator::<_, S>::resume(seconds, 0, SystemClock::default(), Some(Slot::new(1, 0))),
        Err(Error::InvalidLayout { .. })
    ));

    let clock = ManualClock::with_unit(60, Duration::from_secs(1)).unwrap();
    let generator = Generator::<_, S>::create(seconds, 0, clock).unwrap();
    let id = generator.next_id().unwrap();
    assert_eq!(parts(&generator, id), (60, 0, 0));
    assert_eq!(
        generator.decoder().decode(id).unix_time(),
        Duration::from_secs(60)
    );
}

fn run_checkpoint_and_resume<S: Sequencer>() {
    let layout = unix_layout(41, 10, 12);
    let clock = ManualClock::new(1_000);
    let generator = Generator::<_, S>::create(layout, 2, clock.clone()).unwrap();
    assert_eq!(generator.checkpoint().unwrap(), None);

    let mut last = generator.next_id().unwrap();
    for _ in 0..4 {
        last = generator.next_id().unwrap();
    }
    let checkpoint = generator.checkpoint().unwrap();
    assert_eq!(checkpoint, Some(Slot::new(1_000, 4)));

    let restored = Generator::<_, S>::resume(layout, 2, clock.clone(), checkpoint).unwrap();
    let next = restored.next_id().unwrap();
    assert_eq!(parts(&restored, next), (1_000, 2, 5));
    assert!(next > last);

    clock.rewind(1);
    assert!(matches!(
        restored.next_id(),
        Err(Error::ClockRegression { .. })
    ));

    assert!(matches!(
        Generator::<_, S>::resume(layout, 2, clock.clone(), Some(Slot::new(0, 4096))),
        Err(Error::FieldOverflow {
            field: Field::Sequence,
            ..
        })
    ));
    assert!(matches!(
        Generator::<_, S>::resume(layout, 2, clock, Some(Slot::new(1 << 41, 0))),
        Err(Error::FieldOverflow {
            field: Field::Timestamp,
            ..
        })
    ));
}

fn run_monotonic_with_real_clock<S: Sequencer>() {
    const TOTAL_IDS: usize = 4096 * 64;

    let generator =
        Generator::<_, S>::create(BitLayout::default(), 1, MonotonicClock::default()).unwrap();
    let mut previous = generator.next_id().unwrap();
    for _ in 1..TOTAL_IDS {
        let id = generator.next_id().unwrap();
        assert!(id > previous, "{id} after {previous}");
        assert_eq!(generator.decoder().decode(id).generator_id, 1);
        previous = id;
    }
}

fn run_unique_across_threads<S: Sequencer + Sync>() {
    let threads = num_cpus::get().clamp(2, 16);
    let ids_per_thread = 4096 * 16;

    let generator =
        Generator::<_, S>::create(BitLayout::default(), 0, MonotonicClock::default()).unwrap();
    let seen = Mutex::new(HashSet::with_capacity(threads * ids_per_thread));

    scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                let mut local = Vec::with_capacity(ids_per_thread);
                for _ in 0..ids_per_thread {
                    local.push(generator.next_id().unwrap());
                }
                assert!(local.windows(2).all(|pair| pair[0] < pair[1]));
                seen.lock().unwrap().extend(local);
            });
        }
    });

    assert_eq!(seen.into_inner().unwrap().len(), threads * ids_per_thread);
}

#[test]
fn lock_generator_end_to_end() {
    run_end_to_end::<LockSequencer>();
}

#[test]
fn atomic_generator_end_to_end() {
    run_end_to_end::<AtomicSequencer>();
}

#[test]
fn lock_generator_sequence_test() {
    run_sequence_increments_within_same_tick::<LockSequencer>();
}

#[test]
fn atomic_generator_sequence_test() {
    run_sequence_increments_within_same_tick::<AtomicSequencer>();
}

#[test]
fn lock_generator_pending_test() {
    run_rollover_returns_pending::<LockSequencer>();
}

#[test]
fn atomic_generator_pending_test() {
    run_rollover_returns_pending::<AtomicSequencer>();
}

#[test]
fn lock_generator_rollover_blocks() {
    run_rollover_blocks_until_the_clock_advances::<LockSequencer>();
}

#[test]
fn atomic_generator_rollover_blocks() {
    run_rollover_blocks_until_the_clock_advances::<AtomicSequencer>();
}

#[test]
fn lock_generator_regression() {
    run_regression_fails_and_leaves_state_untouched::<LockSequencer>();
    run_regression_is_reported_relative_to_the_epoch::<LockSequencer>();
}

#[test]
fn atomic_generator_regression() {
    run_regression_fails_and_leaves_state_untouched::<AtomicSequencer>();
    run_regression_is_reported_relative_to_the_epoch::<AtomicSequencer>();
}

#[test]
fn lock_generator_fail_strategy() {
    run_fail_strategy_reports_exhaustion::<LockSequencer>();
}

#[test]
fn atomic_generator_fail_strategy() {
    run_fail_strategy_reports_exhaustion::<AtomicSequencer>();
}

#[test]
fn lock_generator_clock_errors() {
    run_clock_errors_surface::<LockSequencer>();
}

#[test]
fn atomic_generator_clock_errors() {
    run_clock_errors_surface::<AtomicSequencer>();
}

#[test]
fn lock_generator_id_validation() {
    run_generator_id_is_validated::<LockSequencer>();
}

#[test]
fn atomic_generator_id_validation() {
    run_generator_id_is_validated::<AtomicSequencer>();
}

#[test]
fn lock_generator_clock_unit_check() {
    run_clock_unit_must_match_the_layout::<LockSequencer>();
}

#[test]
fn atomic_generator_clock_unit_check() {
    run_clock_unit_must_match_the_layout::<AtomicSequencer>();
}

#[test]
fn lock_generator_checkpoint() {
    run_checkpoint_and_resume::<LockSequencer>();
}

#[test]
fn atomic_generator_checkpoint() {
    run_checkpoint_and_resume::<AtomicSequencer>();
}

#[test]
fn lock_generator_monotonic_clock_sequence_increments() {
    run_monotonic_with_real_clock::<LockSequencer>();
}

#[test]
fn atomic_generator_monotonic_clock_sequence_increments() {
    run_monotonic_with_real_clock::<AtomicSequencer>();
}

#[test]
fn lock_generator_threaded_unique() {
    run_unique_across_threads::<LockSequencer>();
}

#[test]
fn atomic_generator_threaded_unique() {
    run_unique_across_threads::<AtomicSequencer>();
}

#[test]
fn generator_from_config() {
    let config = GeneratorConfig {
        sequence_bits: 0,
        generator_id_bits: 22,
        wait: WaitStrategy::Fail,
        ..GeneratorConfig::default()
    };
    let clock = ManualClock::new(1_735_689_600_010);
    let generator: Generator<_> = Generator::from_config(&config, &clock).unwrap();

    assert_eq!(generator.wait(), WaitStrategy::Fail);
    assert_eq!(generator.layout().max_sequence(), 0);
    let id = generator.next_id().unwrap();
    assert_eq!(parts(&generator, id), (10, 0, 0));
    assert_eq!(generator.next_id(), Err(Error::SequenceExhausted));
}

#[test]
fn generator_from_config_rejects_a_clock_in_another_unit() {
    let config = GeneratorConfig {
        timestamp_bits: 31,
        generator_id_bits: 16,
        sequence_bits: 16,
        unit_millis: 1_000,
        ..GeneratorConfig::default()
    };
    let millis = SystemClock::default();
    assert_eq!(
        Generator::<_>::from_config(&config, millis).map(|_| ()),
        Err(Error::InvalidLayout {
            reason: "clock unit does not match the layout unit",
        })
    );

    let clock = SystemClock::with_unit(Duration::from_secs(1)).unwrap();
    let generator: Generator<_> = Generator::from_config(&config, clock).unwrap();
    let id = generator.next_id().unwrap();
    let issued_at = generator.decoder().decode(id).unix_time();
    let wall = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap();
    assert!(wall.abs_diff(issued_at) <= Duration::from_secs(2));
}

#[test]
fn generator_shares_across_threads_by_reference() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Generator<MonotonicClock>>();
    assert_send_sync::<Generator<ManualClock, AtomicSequencer>>();
}
