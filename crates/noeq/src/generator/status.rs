use crate::NoeqId;

/// Represents the result of attempting to generate a new ID.
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the space has used every sequence value
///   for the current millisecond and cannot produce a new ID until the clock
///   advances.
///
/// This allows non-blocking generation loops: blocking callers spin, async
/// callers yield to their runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: NoeqId,
    },
    /// No ID could be generated because the sequence has been exhausted for
    /// the current millisecond.
    Pending {
        /// Milliseconds to wait before the next attempt can succeed.
        yield_for: u64,
    },
}
