//! Error types for record backends.

/// Errors that can occur during backend record operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Fjall database error.
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// I/O error (e.g. from Fjall guard operations or temp directories).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
