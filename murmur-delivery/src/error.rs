//! Typed error handling for delivery operations.

use thiserror::Error;

use murmur_store::StoreError;

/// Top-level delivery error type.
///
/// The unauthorized category is distinguishable because it alone triggers
/// the gateway's one-shot credential refresh-and-retry; every other failure
/// propagates without automatic retry.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The transport rejected our access credential (401-class).
    #[error("Transport rejected credential: {0}")]
    Unauthorized(String),

    /// The transport failed for a non-authentication reason.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The credential issuer could not provide an access token.
    #[error("Credential refresh failed: {0}")]
    Credential(String),

    /// The shared key-value store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A queued record could not be encoded or decoded.
    #[error("Queued message serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid queue or gateway configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DeliveryError {
    /// Returns `true` if this failure is an authentication rejection.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}
