use core::fmt;

use crate::{Error, NoeqId};

/// A validated worker ID, unique per instance within a fleet.
///
/// Every ID minted by this process embeds the worker ID, which is what keeps
/// IDs from different instances apart. Uniqueness across the fleet is a
/// deployment concern; this type only guarantees the value fits the 4-bit
/// field.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(u8);

impl WorkerId {
    /// Creates a worker ID, keeping only the low 4 bits of `raw`.
    ///
    /// Use [`WorkerId::try_from`] to reject out-of-range values instead.
    pub const fn new(raw: u8) -> Self {
        Self(raw & NoeqId::WORKER_ID_MASK as u8)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u64> for WorkerId {
    type Error = Error;

    fn try_from(worker_id: u64) -> Result<Self, Self::Error> {
        if worker_id > NoeqId::MAX_WORKER_ID {
            return Err(Error::InvalidWorkerId { worker_id });
        }
        Ok(Self(worker_id as u8))
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
