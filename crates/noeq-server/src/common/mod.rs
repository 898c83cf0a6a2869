//! Shared types and error definitions used by both the server and the client.
//!
//! ## Submodules
//!
//! - [`error`] - Service error type used throughout request handling.
//! - [`types`] - Wire constants and the default sequencer alias.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
