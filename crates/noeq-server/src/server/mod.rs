//! Server-side plumbing.
//!
//! - [`codec`] - Frames request headers and response batches.
//! - [`config`] - CLI and environment configuration.
//! - [`listener`] - Accept loop, connection tracking and graceful shutdown.
//! - [`service`] - Per-connection request handling.
//! - [`telemetry`] - Logging and optional metrics.

pub mod codec;
pub mod config;
pub mod listener;
pub mod service;
pub mod telemetry;
