//! # `noeq`: float-safe Snowflake-style IDs in independent id spaces
//!
//! `noeq` mints 64-bit IDs whose significant bits fit in 53, so they survive a
//! round trip through a JavaScript `number`. Each ID packs a 39-bit
//! millisecond timestamp, a 4-bit worker ID and a 10-bit sequence (see
//! [`NoeqId`]).
//!
//! IDs are drawn from one of [`ID_SPACES`] independent counters. A
//! [`Sequencer`] keeps one `(timestamp, sequence)` pair per space behind its
//! own lock and shares a single [`ClockGuard`] across spaces, which refuses
//! to mint while the wall clock reads earlier than a time already observed.
//!
//! ## Feature flags
//!
//! - `tracing`: instrument generation with [`tracing`](https://docs.rs/tracing).
//! - `async-tokio`: `SequencerAsyncTokioExt` for yielding instead of spinning
//!   inside a tokio runtime.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod id;
mod runtime;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
#[cfg(feature = "async-tokio")]
pub use crate::runtime::*;
pub use crate::time::*;
