use portable_atomic::{AtomicU64, Ordering};

use crate::{Error, Result, TimeSource};

/// Process-wide high-water mark of every wall-clock sample admitted so far.
///
/// A single [`ClockGuard`] is shared by all id spaces. Samples are admitted
/// only if they are not earlier than the mark, and admitting a sample raises
/// the mark. The mark is never lowered for the lifetime of the guard.
///
/// The guard is lock-free, so spaces never contend on it.
#[derive(Debug, Default)]
pub struct ClockGuard {
    last: AtomicU64,
}

impl ClockGuard {
    /// Creates a guard that admits any sample.
    pub const fn new() -> Self {
        Self::with_last_timestamp(0)
    }

    /// Creates a guard seeded with a previously observed timestamp, in
    /// milliseconds since the UNIX epoch.
    ///
    /// Seeding with the last timestamp of a previous run prevents a restarted
    /// process from minting IDs while the clock sits behind that run.
    pub const fn with_last_timestamp(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Returns the current high-water mark.
    pub fn last_timestamp(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }

    /// Samples `time` and admits the sample against the high-water mark.
    ///
    /// The mark is loaded *before* the clock is read, so on a clock that only
    /// moves forward the first check never reports a spurious regression. If
    /// another caller raised the mark past the sample in between, the clock
    /// is read again and checked against the new mark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the sample is earlier than the
    /// mark. The mark is left unchanged.
    pub fn sample<T>(&self, time: &T) -> Result<u64>
    where
        T: TimeSource<u64> + ?Sized,
    {
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let now = time.current_millis();
            if now < last {
                return Err(Self::cold_regression(now, last));
            }
            let prev = self.last.fetch_max(now, Ordering::AcqRel);
            if prev <= now {
                return Ok(now);
            }
            // Raised by a concurrent sample taken after ours.
            last = prev;
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_regression(now: u64, last: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(now, last, "clock moved backwards");
        Error::ClockRegression { now, last }
    }
}
