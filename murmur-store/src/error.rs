//! Error types for the murmur-store crate.

use thiserror::Error;

/// Top-level store error type.
///
/// Store failures are fatal for the operation that touched the store; no
/// retry is attempted at this layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Internal error (lock poisoning, capacity, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
