use thiserror::Error;

use murmur_store::StoreError;

/// Errors returned by rate limit operations.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// The identity has exhausted its quota for the current window.
    ///
    /// Carries the observed count and the window's reset time so callers can
    /// report both; the stored counter is left unchanged.
    #[error("Rate limit exceeded: {count} requests (limit {limit}), resets at {reset_at}")]
    QuotaExceeded {
        count: u32,
        limit: u32,
        /// Unix seconds at which the window resets.
        reset_at: u64,
    },

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RateLimitError {
    /// Returns `true` if this is a quota rejection rather than a failure.
    #[must_use]
    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_display() {
        let err = RateLimitError::QuotaExceeded {
            count: 10,
            limit: 10,
            reset_at: 1_700_000_060,
        };
        assert!(err.is_quota_exceeded());
        assert!(err.to_string().contains("limit 10"));
    }

    #[test]
    fn test_store_error_is_not_quota() {
        let err = RateLimitError::Store(StoreError::Unavailable("down".to_string()));
        assert!(!err.is_quota_exceeded());
    }
}
