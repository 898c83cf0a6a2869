//! # Wire Types and Constants
//!
//! Shared definitions that pin down the binary contract between client and
//! server.
//!
//! ## Type Aliases
//!
//! - [`Clock`] - The wall clock used by the server's sequencer
//! - [`Sequencer`] - The sequencer type the server binary runs
//! - [`IdBatch`] - One response: the IDs minted for a single request
//!
//! ## Constants
//!
//! - [`HEADER_SIZE`] - Size (in bytes) of a request header
//! - [`ID_SIZE`] - Size (in bytes) of a serialized ID

use core::num::NonZeroU8;

use noeq::{NoeqId, SystemClock};

use crate::{Error, Result};

/// The number of bytes in a request header: `{count, space}`.
pub const HEADER_SIZE: usize = 2;

/// The number of bytes required to serialize a single [`NoeqId`] in
/// big-endian format.
pub const ID_SIZE: usize = core::mem::size_of::<u64>();

/// The system clock used for timestamp embedding.
pub type Clock = SystemClock;

/// The sequencer shared by every connection of a running server.
pub type Sequencer = noeq::Sequencer<Clock>;

/// The IDs answering one request, in the order they were minted.
pub type IdBatch = Vec<NoeqId>;

/// A decoded request header.
///
/// `count` is never zero; a zero count is rejected while decoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Request {
    count: NonZeroU8,
    space: u8,
}

impl Request {
    /// Builds a request for `count` IDs from `space`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if `count` is zero.
    pub fn new(count: u8, space: u8) -> Result<Self> {
        let count = NonZeroU8::new(count).ok_or_else(|| Error::InvalidRequest {
            reason: "count must be greater than 0".to_string(),
        })?;
        Ok(Self { count, space })
    }

    pub const fn count(&self) -> usize {
        self.count.get() as usize
    }

    pub const fn space(&self) -> u8 {
        self.space
    }

    /// Size in bytes of the response this request asks for.
    pub const fn response_len(&self) -> usize {
        self.count() * ID_SIZE
    }

    pub const fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        [self.count.get(), self.space]
    }
}
