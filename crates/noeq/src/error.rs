use core::time::Duration;

/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `noeq` can emit.
///
/// Only [`Error::EpochExhausted`] is fatal. Clock errors are scoped to the
/// single generation call that observed them; a later call may succeed once
/// the clock has caught up.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The wall clock reported a time earlier than one already observed by
    /// this process. No ID was issued.
    #[error("clock moved backwards: now {now} ms, last observed {last} ms")]
    ClockRegression {
        /// The offending sample, in milliseconds since the UNIX epoch.
        now: u64,
        /// The high-water mark the sample was compared against.
        last: u64,
    },

    /// The sequence for the current millisecond was exhausted and the clock
    /// did not advance within the configured spin bound.
    #[error("clock stalled at {last} ms for {waited:?} while the sequence was exhausted")]
    ClockStalled {
        /// The millisecond the space is stuck on.
        last: u64,
        /// How long the generator waited before giving up.
        waited: Duration,
    },

    /// The timestamp no longer fits in the 39-bit field, or precedes the
    /// epoch. The process must be redeployed with a new epoch.
    #[error("epoch exhausted: timestamp delta {timestamp:#x} is outside the 39-bit field")]
    EpochExhausted {
        /// The out-of-range delta from the epoch, in milliseconds. A clock
        /// that precedes the epoch shows up as a wrapped delta.
        timestamp: u64,
    },

    /// The worker id does not fit in the 4-bit field.
    #[error("worker id {worker_id} must be between 0 and {}", crate::NoeqId::MAX_WORKER_ID)]
    InvalidWorkerId {
        /// The rejected value.
        worker_id: u64,
    },
}

impl Error {
    /// Returns `true` when the process can no longer safely mint IDs.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::EpochExhausted { .. })
    }
}
