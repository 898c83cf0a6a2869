use core::{fmt, time::Duration};

use crate::{Error, Result, WorkerId};

/// A 64-bit ID whose significant bits fit in an IEEE-754 double.
///
/// - 11 bits reserved (always zero)
/// - 39 bits timestamp (ms since the configured epoch, ~17.4 years)
/// - 4 bits worker ID
/// - 10 bits sequence
///
/// ```text
///  Bit Index:  63            53 52            14 13          10 9              0
///              +---------------+----------------+--------------+---------------+
///  Field:      | reserved (11) | timestamp (39) | worker ID (4)| sequence (10) |
///              +---------------+----------------+--------------+---------------+
///              |<----------- MSB ----------- 64 bits ----------- LSB --------->|
/// ```
///
/// Keeping the high bits clear means every ID round-trips through a
/// JavaScript `number` without loss.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NoeqId {
    id: u64,
}

impl NoeqId {
    /// Bitmask for the 39-bit timestamp field. Occupies bits 14 through 52.
    pub const TIMESTAMP_MASK: u64 = (1 << 39) - 1;

    /// Bitmask for the 4-bit worker ID field. Occupies bits 10 through 13.
    pub const WORKER_ID_MASK: u64 = (1 << 4) - 1;

    /// Bitmask for the 10-bit sequence field. Occupies bits 0 through 9.
    pub const SEQUENCE_MASK: u64 = (1 << 10) - 1;

    /// Number of bits to shift the timestamp to its position (bit 14).
    pub const TIMESTAMP_SHIFT: u64 = 14;

    /// Number of bits to shift the worker ID to its position (bit 10).
    pub const WORKER_ID_SHIFT: u64 = 10;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Largest worker ID representable in the layout.
    pub const MAX_WORKER_ID: u64 = Self::WORKER_ID_MASK;

    /// Largest sequence value before the generator must wait for the next
    /// millisecond.
    pub const MAX_SEQUENCE: u64 = Self::SEQUENCE_MASK;

    /// Mints an ID from its components.
    ///
    /// `timestamp` is the delta from the epoch in milliseconds. It is the only
    /// component checked at runtime: a delta that spills past 39 bits means the
    /// epoch has run out, and minting must stop rather than wrap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EpochExhausted`] if `timestamp` exceeds
    /// [`Self::TIMESTAMP_MASK`]. The error carries the raw delta.
    ///
    /// # Example
    ///
    /// ```
    /// use noeq::{NoeqId, WorkerId};
    ///
    /// let worker = WorkerId::try_from(3).unwrap();
    /// let id = NoeqId::mint(1_000, worker, 7).unwrap();
    /// assert_eq!(id.timestamp(), 1_000);
    /// assert_eq!(id.worker_id(), 3);
    /// assert_eq!(id.sequence(), 7);
    /// ```
    pub const fn mint(timestamp: u64, worker_id: WorkerId, sequence: u64) -> Result<Self> {
        if timestamp & !Self::TIMESTAMP_MASK != 0 {
            return Err(Error::EpochExhausted { timestamp });
        }
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Ok(Self::from(timestamp, worker_id.get() as u64, sequence))
    }

    /// Packs the components without any range checks; each field is masked
    /// to its width.
    pub const fn from(timestamp: u64, worker_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | worker_id | sequence,
        }
    }

    /// Extracts the timestamp delta from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the worker ID from the packed ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Recovers the absolute mint time in milliseconds since the UNIX epoch.
    pub const fn timestamp_millis(&self, epoch: Duration) -> u64 {
        self.timestamp() + epoch.as_millis() as u64
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// The wire representation: 8 bytes, big-endian.
    pub const fn to_be_bytes(&self) -> [u8; 8] {
        self.id.to_be_bytes()
    }

    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self {
            id: u64::from_be_bytes(bytes),
        }
    }
}

impl From<NoeqId> for u64 {
    fn from(id: NoeqId) -> Self {
        id.to_raw()
    }
}

impl fmt::Display for NoeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for NoeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoeqId")
            .field("raw", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
