use crate::{
    BasicFloeGenerator, Error, FloeId, LockFloeGenerator, MonotonicClock, Result, TimeSource,
};
use core::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::scope;

#[derive(Clone)]
struct MockTime {
    millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock whose reading can be changed from outside the generator.
#[derive(Clone)]
struct SharedStepTime {
    millis: Rc<Cell<u64>>,
}

impl SharedStepTime {
    fn new(millis: u64) -> Self {
        Self {
            millis: Rc::new(Cell::new(millis)),
        }
    }

    fn set(&self, millis: u64) {
        self.millis.set(millis);
    }
}

impl TimeSource for SharedStepTime {
    fn current_millis(&self) -> u64 {
        self.millis.get()
    }
}

/// A clock that reports `base` for its first `switch_after` reads, then
/// `base + 1`. Lets a single-threaded test drive the generator through an
/// exhausted millisecond: the busy-wait re-reads the clock until it advances.
struct AutoAdvanceTime {
    base: u64,
    switch_after: u64,
    reads: Cell<u64>,
}

impl AutoAdvanceTime {
    fn new(base: u64, switch_after: u64) -> Self {
        Self {
            base,
            switch_after,
            reads: Cell::new(0),
        }
    }
}

impl TimeSource for AutoAdvanceTime {
    fn current_millis(&self) -> u64 {
        let n = self.reads.get() + 1;
        self.reads.set(n);
        if n <= self.switch_after {
            self.base
        } else {
            self.base + 1
        }
    }
}

fn run_sequence_increments_within_same_millisecond(next: impl Fn() -> Result<FloeId>) {
    let id1 = next().unwrap();
    let id2 = next().unwrap();
    let id3 = next().unwrap();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

fn run_exhaustion_waits_for_next_millisecond(next: impl Fn() -> Result<FloeId>) {
    for seq in 0..=FloeId::SEQUENCE_MASK {
        let id = next().unwrap();
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.sequence(), seq);
    }

    // The 4097th call finds the millisecond exhausted and must spin until
    // the clock moves to 43.
    let id = next().unwrap();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

fn run_clock_regression_is_signaled_without_mutation(
    time: &SharedStepTime,
    next: impl Fn() -> Result<FloeId>,
) {
    time.set(100);
    let id = next().unwrap();
    assert_eq!(id.timestamp(), 100);
    assert_eq!(id.sequence(), 0);

    time.set(50);
    assert_eq!(
        next(),
        Err(Error::ClockRegression {
            last: 100,
            observed: 50
        })
    );
    // Not auto-recovered: the same regressed clock fails again.
    assert_eq!(
        next(),
        Err(Error::ClockRegression {
            last: 100,
            observed: 50
        })
    );

    // Once the clock catches back up, the sequence continues where it left
    // off, proving the failed calls mutated nothing.
    time.set(100);
    let id = next().unwrap();
    assert_eq!(id.timestamp(), 100);
    assert_eq!(id.sequence(), 1);

    time.set(150);
    let id = next().unwrap();
    assert_eq!(id.timestamp(), 150);
    assert_eq!(id.sequence(), 0);
}

fn run_strictly_increasing(next: impl Fn() -> Result<FloeId>) {
    const TOTAL_IDS: usize = 4096 * 64;

    let mut last = None;
    for _ in 0..TOTAL_IDS {
        let id = next().unwrap();
        if let Some(prev) = last {
            assert!(id > prev, "expected {id:?} > {prev:?}");
        }
        last = Some(id);
    }
}

#[test]
fn basic_sequence_increments_within_same_millisecond() {
    let generator = BasicFloeGenerator::new(1, 1, MockTime { millis: 42 });
    run_sequence_increments_within_same_millisecond(|| generator.next_id());
}

#[test]
fn lock_sequence_increments_within_same_millisecond() {
    let generator = LockFloeGenerator::new(1, 1, MockTime { millis: 42 });
    run_sequence_increments_within_same_millisecond(|| generator.next_id());
}

#[test]
fn same_millisecond_ids_differ_only_in_low_bits() {
    // Two IDs issued in the same millisecond with datacenter 1 / server 1
    // share everything above the sequence field and differ by exactly one.
    let generator = BasicFloeGenerator::new(1, 1, MockTime { millis: 42 });
    let id1 = generator.next_id().unwrap();
    let id2 = generator.next_id().unwrap();

    assert_eq!(id1.to_raw() >> 12, id2.to_raw() >> 12);
    assert_eq!(id2.to_raw(), id1.to_raw() + 1);
}

#[test]
fn ids_encode_configured_datacenter_and_server() {
    let generator = BasicFloeGenerator::new(3, 7, MockTime { millis: 42 });
    let id = generator.next_id().unwrap();
    assert_eq!(id.datacenter_id(), 3);
    assert_eq!(id.server_id(), 7);
}

#[test]
fn basic_exhaustion_waits_for_next_millisecond() {
    // 4096 issuing calls read the clock once each; the exhausted call reads
    // once more, then twice inside the wait loop before seeing 43.
    let time = AutoAdvanceTime::new(42, 4098);
    let generator = BasicFloeGenerator::new(0, 0, time);
    run_exhaustion_waits_for_next_millisecond(|| generator.next_id());
}

#[test]
fn lock_exhaustion_waits_for_next_millisecond() {
    let time = AutoAdvanceTime::new(42, 4098);
    let generator = LockFloeGenerator::new(0, 0, time);
    run_exhaustion_waits_for_next_millisecond(|| generator.next_id());
}

#[test]
fn basic_clock_regression_is_signaled_without_mutation() {
    let time = SharedStepTime::new(100);
    let generator = BasicFloeGenerator::new(1, 1, time.clone());
    run_clock_regression_is_signaled_without_mutation(&time, || generator.next_id());
}

#[test]
fn lock_clock_regression_is_signaled_without_mutation() {
    let time = SharedStepTime::new(100);
    let generator = LockFloeGenerator::new(1, 1, time.clone());
    run_clock_regression_is_signaled_without_mutation(&time, || generator.next_id());
}

#[test]
fn regression_against_preloaded_state() {
    let generator = BasicFloeGenerator::from_components(100, 1, 1, 0, MockTime { millis: 50 });
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockRegression {
            last: 100,
            observed: 50
        })
    );
}

#[test]
fn basic_strictly_increasing_under_real_clock() {
    let generator = BasicFloeGenerator::new(1, 1, MonotonicClock::default());
    run_strictly_increasing(|| generator.next_id());
}

#[test]
fn lock_strictly_increasing_under_real_clock() {
    let generator = LockFloeGenerator::new(1, 1, MonotonicClock::default());
    run_strictly_increasing(|| generator.next_id());
}

#[test]
fn lock_threaded_unique_and_ordered_per_thread() {
    const IDS_PER_THREAD: usize = 20_000;

    let threads = num_cpus::get().clamp(4, 8);
    let generator = Arc::new(LockFloeGenerator::new(1, 1, MonotonicClock::default()));

    let per_thread: Vec<Vec<FloeId>> = scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let generator = Arc::clone(&generator);
                s.spawn(move || {
                    (0..IDS_PER_THREAD)
                        .map(|_| generator.next_id().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::with_capacity(threads * IDS_PER_THREAD);
    for ids in &per_thread {
        // Calls from one thread complete in program order, so the results
        // must be numerically ascending.
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for id in ids {
            assert!(seen.insert(*id), "duplicate ID issued: {id:?}");
        }
    }
    assert_eq!(seen.len(), threads * IDS_PER_THREAD);
}

#[test]
fn clones_share_one_id_stream() {
    let generator = LockFloeGenerator::new(1, 1, MockTime { millis: 42 });
    let clone = generator.clone();

    let id1 = generator.next_id().unwrap();
    let id2 = clone.next_id().unwrap();
    assert_eq!(id2.to_raw(), id1.to_raw() + 1);
}
