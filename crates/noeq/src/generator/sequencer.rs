use core::time::Duration;
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    ClockGuard, Error, ID_SPACES, IdGenStatus, IdSpace, NOEQ_EPOCH, NoeqId, Result, SystemClock,
    TimeSource, WorkerId,
};

/// Default bound on how long a caller waits for the clock to leave an
/// exhausted millisecond.
pub const DEFAULT_MAX_SPIN: Duration = Duration::from_millis(50);

/// Exclusive access to one id space.
///
/// Dropping the guard releases the space on every exit path, including
/// unwinding. `parking_lot` mutexes do not poison, so a panic while holding a
/// guard never wedges the space.
pub type SpaceGuard<'a> = MutexGuard<'a, IdSpace>;

/// Mints IDs from [`ID_SPACES`] independent id spaces.
///
/// Each space sits behind its own lock, so callers on different spaces never
/// block one another, while callers on the same space are serialized. All
/// spaces share one [`ClockGuard`], which refuses to mint while the wall clock
/// reads earlier than any time already observed by the process.
///
/// ## Features
/// - ✅ Thread-safe (`Send + Sync` whenever the time source is)
/// - ✅ Per-space total order
/// - ✅ Clock-regression detection across all spaces
///
/// # Example
/// ```
/// use noeq::{Sequencer, SystemClock, WorkerId};
///
/// let sequencer = Sequencer::new(WorkerId::new(1), SystemClock);
/// let a = sequencer.next_id(0).unwrap();
/// let b = sequencer.next_id(0).unwrap();
/// assert!(a < b);
/// assert_eq!(a.worker_id(), 1);
/// ```
pub struct Sequencer<T = SystemClock>
where
    T: TimeSource<u64>,
{
    spaces: Box<[Mutex<IdSpace>]>,
    guard: ClockGuard,
    worker_id: WorkerId,
    epoch: u64,
    max_spin: Duration,
    time: T,
}

impl<T> Sequencer<T>
where
    T: TimeSource<u64>,
{
    /// Creates a sequencer for `worker_id` anchored at [`NOEQ_EPOCH`].
    ///
    /// Every space starts fresh, so the first ID from a space always carries
    /// sequence 0.
    pub fn new(worker_id: WorkerId, time: T) -> Self {
        Self {
            spaces: (0..ID_SPACES).map(|_| Mutex::new(IdSpace::new())).collect(),
            guard: ClockGuard::new(),
            worker_id,
            epoch: NOEQ_EPOCH.as_millis() as u64,
            max_spin: DEFAULT_MAX_SPIN,
            time,
        }
    }

    /// Uses `epoch` (a [`Duration`] since 1970-01-01 UTC) as time zero for
    /// the timestamp field.
    #[must_use]
    pub fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch.as_millis() as u64;
        self
    }

    /// Seeds the clock guard with the last timestamp issued by a previous
    /// run, in milliseconds since the UNIX epoch.
    #[must_use]
    pub fn with_last_timestamp(mut self, last: u64) -> Self {
        self.guard = ClockGuard::with_last_timestamp(last);
        self
    }

    /// Bounds how long [`Self::next_id`] waits for the next millisecond once
    /// a space has exhausted its sequence.
    #[must_use]
    pub fn with_max_spin(mut self, max_spin: Duration) -> Self {
        self.max_spin = max_spin;
        self
    }

    pub const fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch)
    }

    pub const fn max_spin(&self) -> Duration {
        self.max_spin
    }

    /// The process-wide clock high-water mark, in milliseconds since the
    /// UNIX epoch.
    pub fn last_timestamp(&self) -> u64 {
        self.guard.last_timestamp()
    }

    /// Takes exclusive ownership of `space` until the guard is dropped.
    pub fn acquire(&self, space: u8) -> SpaceGuard<'_> {
        self.spaces[usize::from(space)].lock()
    }

    /// Attempts to mint the next ID from `space` without waiting.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: a new ID is available
    /// - `Ok(IdGenStatus::Pending { yield_for })`: the space has exhausted
    ///   the current millisecond; try again once the clock advances
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] if the clock reads earlier than any time
    ///   already observed. No ID is issued.
    /// - [`Error::EpochExhausted`] if the timestamp no longer fits. Fatal.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self, space: u8) -> Result<IdGenStatus> {
        let mut state = self.acquire(space);
        self.poll_locked(&mut state)
    }

    /// Mints the next ID from `space`, spinning while the space waits for the
    /// next millisecond.
    ///
    /// The space stays locked for the duration of the call, including any
    /// spin. Each spin iteration takes a fresh clock sample. On a clock with
    /// coarse resolution the spin can last a full tick, up to the bound set
    /// by [`Self::with_max_spin`].
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] as for [`Self::try_poll_id`].
    /// - [`Error::ClockStalled`] if the clock did not advance within the spin
    ///   bound.
    /// - [`Error::EpochExhausted`] if the timestamp no longer fits. Fatal.
    pub fn next_id(&self, space: u8) -> Result<NoeqId> {
        let mut state = self.acquire(space);
        self.next_locked(&mut state)
    }

    /// Mints `count` consecutive IDs from `space` under a single lock.
    ///
    /// The IDs are strictly increasing. If any ID fails, the whole batch is
    /// discarded; the IDs already minted are never handed out again.
    ///
    /// # Errors
    /// Same as [`Self::next_id`].
    pub fn next_ids(&self, space: u8, count: usize) -> Result<Vec<NoeqId>> {
        let mut state = self.acquire(space);
        (0..count).map(|_| self.next_locked(&mut state)).collect()
    }

    /// One generation step against an already-owned space.
    pub(crate) fn poll_locked(&self, state: &mut IdSpace) -> Result<IdGenStatus> {
        let now = self.guard.sample(&self.time)?;
        state.poll(now, self.epoch, self.worker_id)
    }

    fn next_locked(&self, state: &mut IdSpace) -> Result<NoeqId> {
        let mut budget = SpinBudget::new(self.max_spin);
        loop {
            match self.poll_locked(state)? {
                IdGenStatus::Ready { id } => break Ok(id),
                IdGenStatus::Pending { .. } => {
                    budget.charge(state.last_timestamp())?;
                    core::hint::spin_loop();
                }
            }
        }
    }
}

/// Tracks how long a caller has waited on one exhausted millisecond.
///
/// The timer restarts whenever the space is found pending on a different
/// millisecond: the clock did move, another caller just used it up first.
/// `Instant` is only read once the first pending status is seen, so the
/// common path never touches it.
pub(crate) struct SpinBudget {
    max: Duration,
    stuck_on: Option<(u64, Instant)>,
}

impl SpinBudget {
    pub(crate) const fn new(max: Duration) -> Self {
        Self {
            max,
            stuck_on: None,
        }
    }

    /// Records one more pending attempt while the space is stuck on `last`.
    pub(crate) fn charge(&mut self, last: u64) -> Result<()> {
        let started = match self.stuck_on {
            Some((millis, started)) if millis == last => started,
            _ => {
                self.stuck_on = Some((last, Instant::now()));
                return Ok(());
            }
        };

        let waited = started.elapsed();
        if waited > self.max {
            #[cfg(feature = "tracing")]
            tracing::warn!(last, ?waited, "clock did not advance past exhausted millisecond");
            return Err(Error::ClockStalled { last, waited });
        }
        Ok(())
    }
}
