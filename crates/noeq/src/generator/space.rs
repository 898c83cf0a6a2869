use core::cmp::Ordering;

use crate::{Error, IdGenStatus, NoeqId, Result, WorkerId};

/// Number of independent id spaces. Every `u8` addresses a valid space.
pub const ID_SPACES: usize = 256;

/// The `(last_timestamp, sequence)` pair owned by one id space.
///
/// An [`IdSpace`] is a plain state machine with no interior synchronization.
/// Whoever holds `&mut IdSpace` is its single logical owner; the
/// [`Sequencer`] hands that out through a per-space lock.
///
/// [`Sequencer`]: crate::Sequencer
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IdSpace {
    last_timestamp: u64,
    sequence: u64,
}

impl IdSpace {
    pub const fn new() -> Self {
        Self::from_components(0, 0)
    }

    /// Creates a space preloaded with explicit state.
    ///
    /// `last_timestamp` is in milliseconds since the UNIX epoch.
    pub const fn from_components(last_timestamp: u64, sequence: u64) -> Self {
        Self {
            last_timestamp,
            sequence,
        }
    }

    pub const fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Advances the space to `now` and mints the next ID.
    ///
    /// - Same millisecond: the sequence is incremented, or
    ///   [`IdGenStatus::Pending`] is returned once all 1024 values are used.
    ///   State is untouched while pending, so the next successful call lands
    ///   on a later millisecond with sequence 0.
    /// - Later millisecond: the sequence resets to 0.
    /// - Earlier millisecond: [`Error::ClockRegression`].
    ///
    /// State is only committed once the ID has been minted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if `now` precedes the last timestamp.
    /// - [`Error::EpochExhausted`] if `now - epoch` does not fit in 39 bits.
    ///   A clock before the epoch wraps to a huge delta and fails the same way.
    pub fn poll(&mut self, now: u64, epoch: u64, worker_id: WorkerId) -> Result<IdGenStatus> {
        let sequence = match now.cmp(&self.last_timestamp) {
            Ordering::Equal if self.sequence < NoeqId::MAX_SEQUENCE => self.sequence + 1,
            Ordering::Equal => return Ok(IdGenStatus::Pending { yield_for: 1 }),
            Ordering::Greater => 0,
            Ordering::Less => return Err(self.cold_clock_behind(now)),
        };

        let id = NoeqId::mint(now.wrapping_sub(epoch), worker_id, sequence)?;
        self.last_timestamp = now;
        self.sequence = sequence;
        Ok(IdGenStatus::Ready { id })
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: u64) -> Error {
        Error::ClockRegression {
            now,
            last: self.last_timestamp,
        }
    }
}
