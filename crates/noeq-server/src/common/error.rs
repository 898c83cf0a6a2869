//! Error types for the ID service.
//!
//! ## Error Cases
//! - `InvalidRequest`: The client sent a header the server will not serve.
//! - `Generation`: The sequencer failed to mint a batch.
//! - `Io`: The transport failed underneath the connection.
//!
//! Every error closes the connection it occurred on. Only a fatal generation
//! error (see [`Error::is_fatal`]) takes the whole server down.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the ID service.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client request was malformed.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The sequencer refused to mint the requested batch.
    #[error("ID generation error: {0}")]
    Generation(#[from] noeq::Error),

    /// Reading the request or writing the response failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the server can no longer mint IDs at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Generation(e) if e.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exhausted_epoch_is_fatal() {
        let fatal = Error::from(noeq::Error::EpochExhausted { timestamp: 1 << 39 });
        assert!(fatal.is_fatal());

        let regression = Error::from(noeq::Error::ClockRegression { now: 1, last: 2 });
        assert!(!regression.is_fatal());

        let invalid = Error::InvalidRequest {
            reason: "count must be greater than 0".into(),
        };
        assert!(!invalid.is_fatal());

        let io = Error::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(!io.is_fatal());
    }
}
