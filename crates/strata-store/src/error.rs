//! Error types for the versioned store.

use strata_backend::BackendError;

/// Errors surfaced by [`HistoryStore`](crate::HistoryStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key has no recorded versions.
    #[error("no such key")]
    MissingKey,

    /// A history offset reached past the oldest recorded version.
    #[error("history exhausted: requested {requested} versions back, only {available} recorded")]
    HistoryExhausted {
        /// The offset that was requested.
        requested: usize,
        /// How many versions are recorded for the key.
        available: usize,
    },

    /// A history offset was negative.
    #[error("history offset must be non-negative, got {0}")]
    NegativeOffset(isize),

    /// The reserved bookkeeping key was used as a user key.
    #[error("key is reserved for internal bookkeeping")]
    ReservedKey,

    /// History pruning is not implemented.
    #[error("history pruning (trim) is not implemented")]
    TrimUnimplemented,

    /// A cached value was still mutably borrowed when the store tried to
    /// encode it for comparison.
    #[error("cached value is still mutably borrowed")]
    ValueBorrowed,

    /// Durable backend failure. Fatal; never retried.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Key or value encode/decode failure.
    #[error("serialization error: {0}")]
    Codec(#[from] postcard::Error),
}
