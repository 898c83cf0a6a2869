//! # `noeq-server`: float-safe IDs over a two-byte protocol
//!
//! A TCP (or Unix-domain socket) service built on [`noeq`] and [`tokio`].
//! Clients send a 2-byte header `{count, space}` and receive `count` IDs as
//! big-endian `u64`s. Requests are pipelinable: the length of every response
//! is implied by its request, so a client may write many headers before
//! reading anything back.
//!
//! ## Wire format
//!
//! ```text
//! request:  [ count: u8 (1..=255) ][ space: u8 ]
//! response: [ id_0: u64 BE ] ... [ id_{count-1}: u64 BE ]
//! ```
//!
//! A header with `count == 0` or a failed generation closes the connection
//! without writing a response. Nothing from a failed batch is ever written.
//!
//! ## Module Overview
//!
//! - [`common`] - Shared error type and wire constants.
//! - [`server`] - Codec, connection handler, accept loop, configuration and
//!   telemetry.
//! - [`client`] - A pipelining async client.

pub mod client;
pub mod common;
pub mod server;

pub use common::*;
