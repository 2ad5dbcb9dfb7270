//! Relay-level error taxonomy.
//!
//! Validation and quota rejections are deterministic and synchronous;
//! transformation and store failures are categorized so the shell can tell
//! "the user should retry" from "the system is misconfigured" from "try
//! again later". Delivery failures never appear here; they happen in the
//! background after the submission has already succeeded, and are only
//! visible in the logs.

use thiserror::Error;

use murmur_delivery::DeliveryError;
use murmur_limiter::RateLimitError;
use murmur_rewrite::RewriteError;

/// Input rejected before any external call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The message was empty or whitespace-only.
    #[error("Message is empty")]
    EmptyMessage,

    /// The message exceeded the character cap.
    #[error("Message too long: {length} characters (max {max})")]
    MessageTooLong { length: usize, max: usize },
}

/// Errors returned by the relay's consumer-facing operations.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Quota rejection or rate limit store failure.
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    /// The style transformation failed; the operation fails as a whole
    /// rather than delivering untransformed text as if it were transformed.
    #[error(transparent)]
    Transform(#[from] RewriteError),

    /// Enqueueing the transformed message failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl RelayError {
    /// Stable machine-readable code for the response envelope.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::RateLimit(RateLimitError::QuotaExceeded { .. }) => "rate_limit_exceeded",
            Self::RateLimit(RateLimitError::Store(_)) => "store_error",
            Self::Transform(err) => err.code(),
            Self::Delivery(DeliveryError::Store(_)) => "store_error",
            Self::Delivery(_) => "delivery_error",
        }
    }

    /// Returns `true` for the quota rejection, which is a distinct user
    /// outcome rather than a server failure.
    #[must_use]
    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            Self::RateLimit(RateLimitError::QuotaExceeded { .. })
        )
    }
}
