use crate::{
    Error, ID_SPACES, IdGenStatus, IdSpace, NoeqId, Sequencer, SystemClock, TimeSource, WorkerId,
};
use core::time::Duration;
use portable_atomic::{AtomicU64, Ordering};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread::scope;

#[derive(Clone)]
struct MockTime {
    millis: Arc<AtomicU64>,
}

impl MockTime {
    fn at(millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Relaxed);
    }
}

impl TimeSource<u64> for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::Relaxed)
    }
}

trait IdGenStatusExt {
    fn unwrap_ready(self) -> NoeqId;
    fn unwrap_pending(self) -> u64;
}

impl IdGenStatusExt for IdGenStatus {
    fn unwrap_ready(self) -> NoeqId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

/// Sequencer whose timestamp field equals the mock clock reading.
fn mock_sequencer(worker_id: u8, time: &MockTime) -> Sequencer<MockTime> {
    Sequencer::new(WorkerId::new(worker_id), time.clone()).with_epoch(Duration::ZERO)
}

#[test]
fn first_id_in_space_has_sequence_zero() {
    let time = MockTime::at(42);
    let sequencer = mock_sequencer(0, &time);

    let id = sequencer.next_id(0).unwrap();
    assert_eq!(id.timestamp(), 42);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn sequence_increments_within_same_tick() {
    let time = MockTime::at(42);
    let sequencer = mock_sequencer(0, &time);

    let id1 = sequencer.try_poll_id(0).unwrap().unwrap_ready();
    let id2 = sequencer.try_poll_id(0).unwrap().unwrap_ready();
    let id3 = sequencer.try_poll_id(0).unwrap().unwrap_ready();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn pending_when_sequence_exhausted() {
    let time = MockTime::at(42);
    let sequencer = mock_sequencer(0, &time);
    *sequencer.acquire(0) = IdSpace::from_components(42, NoeqId::MAX_SEQUENCE);

    assert_eq!(sequencer.try_poll_id(0).unwrap().unwrap_pending(), 1);
}

#[test]
fn rollover_after_exhausting_tick() {
    let time = MockTime::at(42);
    let sequencer = mock_sequencer(1, &time);

    for i in 0..=NoeqId::MAX_SEQUENCE {
        let id = sequencer.try_poll_id(0).unwrap().unwrap_ready();
        assert_eq!(id.sequence(), i);
        assert_eq!(id.timestamp(), 42);
    }
    assert_eq!(sequencer.try_poll_id(0).unwrap().unwrap_pending(), 1);

    time.set(43);
    let id = sequencer.try_poll_id(0).unwrap().unwrap_ready();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn blocking_spin_waits_for_clock_to_advance() {
    let time = MockTime::at(42);
    let sequencer = mock_sequencer(0, &time).with_max_spin(Duration::from_secs(5));
    *sequencer.acquire(0) = IdSpace::from_components(42, NoeqId::MAX_SEQUENCE);

    let id = scope(|s| {
        let ticker = time.clone();
        s.spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            ticker.set(43);
        });
        sequencer.next_id(0).unwrap()
    });

    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn frozen_clock_stalls_after_spin_bound() {
    let time = MockTime::at(42);
    let sequencer = mock_sequencer(0, &time).with_max_spin(Duration::from_millis(5));
    *sequencer.acquire(0) = IdSpace::from_components(42, NoeqId::MAX_SEQUENCE);

    let err = sequencer.next_id(0).unwrap_err();
    match err {
        Error::ClockStalled { last, waited } => {
            assert_eq!(last, 42);
            assert!(waited > Duration::from_millis(5));
        }
        other => panic!("unexpected error {other:?}"),
    }

    // The space recovers as soon as the clock moves
    time.set(43);
    assert_eq!(sequencer.next_id(0).unwrap().sequence(), 0);
}

#[test]
fn regression_fails_without_issuing() {
    let time = MockTime::at(100);
    let sequencer = mock_sequencer(0, &time);
    let first = sequencer.next_id(0).unwrap();

    time.set(99);
    assert_eq!(
        sequencer.next_id(0),
        Err(Error::ClockRegression { now: 99, last: 100 })
    );
    assert_eq!(*sequencer.acquire(0), IdSpace::from_components(100, 0));

    // Recoverable once the clock catches up
    time.set(100);
    let second = sequencer.next_id(0).unwrap();
    assert_eq!(second.sequence(), first.sequence() + 1);
    assert!(second > first);
}

#[test]
fn regression_is_detected_across_spaces() {
    let time = MockTime::at(100);
    let sequencer = mock_sequencer(0, &time);
    sequencer.next_id(0).unwrap();

    // Space 1 has never minted, but the process has already seen t=100
    time.set(99);
    assert!(matches!(
        sequencer.next_id(1),
        Err(Error::ClockRegression { now: 99, last: 100 })
    ));
}

#[test]
fn seeded_last_timestamp_guards_restart() {
    let time = MockTime::at(150);
    let sequencer = mock_sequencer(0, &time).with_last_timestamp(200);
    assert_eq!(sequencer.last_timestamp(), 200);
    assert!(matches!(
        sequencer.next_id(0),
        Err(Error::ClockRegression { now: 150, last: 200 })
    ));

    time.set(200);
    assert!(sequencer.next_id(0).is_ok());
}

#[test]
fn exhausted_epoch_is_fatal() {
    let time = MockTime::at(NoeqId::TIMESTAMP_MASK + 1);
    let sequencer = mock_sequencer(0, &time);
    let err = sequencer.next_id(0).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, Error::EpochExhausted { .. }));
}

#[test]
fn clock_before_epoch_is_fatal() {
    let time = MockTime::at(1_000);
    let sequencer =
        Sequencer::new(WorkerId::new(0), time).with_epoch(Duration::from_millis(2_000));
    assert!(sequencer.next_id(0).unwrap_err().is_fatal());
}

#[test]
fn spaces_are_independent() {
    let time = MockTime::at(42);
    let sequencer = mock_sequencer(0, &time);

    for space in [0_u8, 1, 7, 255] {
        let id = sequencer.next_id(space).unwrap();
        assert_eq!(id.sequence(), 0, "space {space}");
    }
    assert_eq!(sequencer.next_id(7).unwrap().sequence(), 1);
}

#[test]
fn holding_one_space_does_not_block_another() {
    let sequencer = Sequencer::new(WorkerId::new(0), SystemClock);
    let _held = sequencer.acquire(0);
    assert!(sequencer.next_id(1).is_ok());
}

#[test]
fn guard_is_released_on_unwind() {
    let sequencer = Sequencer::new(WorkerId::new(0), SystemClock);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _state = sequencer.acquire(9);
        panic!("boom");
    }));
    assert!(result.is_err());
    assert!(sequencer.next_id(9).is_ok());
}

#[test]
fn worker_id_is_embedded_in_every_id() {
    for worker in 0..=15 {
        let sequencer = Sequencer::new(WorkerId::new(worker), SystemClock);
        for id in sequencer.next_ids(0, 64).unwrap() {
            assert_eq!(id.worker_id(), u64::from(worker));
            assert_eq!((id.to_raw() >> 10) & 0xF, u64::from(worker));
        }
    }
}

#[test]
fn batch_of_255_is_distinct_and_increasing() {
    let sequencer = Sequencer::new(WorkerId::new(2), SystemClock);
    let ids = sequencer.next_ids(7, 255).unwrap();
    assert_eq!(ids.len(), 255);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn sequential_ids_are_strictly_increasing() {
    const TOTAL_IDS: usize = 1024 * 64;
    let sequencer = Sequencer::new(WorkerId::new(1), SystemClock);

    let mut last = sequencer.next_id(3).unwrap();
    for _ in 1..TOTAL_IDS {
        let id = sequencer.next_id(3).unwrap();
        assert!(id > last, "{id:?} <= {last:?}");
        if id.timestamp() == last.timestamp() {
            assert_eq!(id.sequence(), last.sequence() + 1);
        } else {
            assert_eq!(id.sequence(), 0);
        }
        last = id;
    }
}

#[test]
fn threaded_ids_on_one_space_are_unique() {
    const THREADS: usize = 8;
    const TOTAL_IDS: usize = 1024 * 256;
    const IDS_PER_THREAD: usize = TOTAL_IDS / THREADS;

    let sequencer = Sequencer::new(WorkerId::new(4), SystemClock);
    let seen_ids = Mutex::new(HashSet::with_capacity(TOTAL_IDS));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let mut local = Vec::with_capacity(IDS_PER_THREAD);
                for _ in 0..IDS_PER_THREAD {
                    local.push(sequencer.next_id(0).unwrap());
                }
                let mut seen = seen_ids.lock().unwrap();
                for id in local {
                    assert!(seen.insert(id), "duplicate id {id:?}");
                }
            });
        }
    });

    let final_count = seen_ids.lock().unwrap().len();
    assert_eq!(final_count, TOTAL_IDS, "Expected {TOTAL_IDS} unique IDs");
}

#[test]
fn threaded_spaces_each_stay_ordered() {
    const IDS_PER_SPACE: usize = 4096;

    let sequencer = Sequencer::new(WorkerId::new(0), SystemClock);
    scope(|s| {
        for space in (0..ID_SPACES).step_by(32) {
            let sequencer = &sequencer;
            s.spawn(move || {
                let space = space as u8;
                let mut last = sequencer.next_id(space).unwrap();
                for _ in 1..IDS_PER_SPACE {
                    let id = sequencer.next_id(space).unwrap();
                    assert!(id > last);
                    last = id;
                }
            });
        }
    });
}
