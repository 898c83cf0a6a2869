//! Per-connection request handling.
//!
//! ## Structure
//!
//! - [`handler`] - Reads headers, mints batches and writes responses for one
//!   connection.

pub mod handler;
