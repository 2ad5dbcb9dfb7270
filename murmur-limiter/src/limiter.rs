use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use murmur_common::clock::unix_now;
use murmur_store::{KeyValueStore, PutOptions};

use crate::error::RateLimitError;

/// Store key prefix for rate limit counters.
///
/// Queued messages use the disjoint `msg_` prefix, so the two components
/// never collide in the shared store.
pub const RATE_LIMIT_KEY_PREFIX: &str = "rate_limit:";

const fn default_window_secs() -> u64 {
    60
}

const fn default_max_requests() -> u32 {
    10
}

/// Configuration for the fixed-window rate limiter.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum admitted requests per identity per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

/// Snapshot of an identity's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RateLimitStatus {
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// Unix seconds at which the window resets.
    pub reset_at: u64,
    /// The configured per-window limit.
    pub limit: u32,
}

/// Fixed-window rate limiter over the shared key-value store.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// The configured per-window limit.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.config.max_requests
    }

    /// Admit one request for `key`, incrementing its counter.
    ///
    /// Fails with [`RateLimitError::QuotaExceeded`], without incrementing,
    /// once the identity has used up its window quota.
    pub async fn consume(&self, key: &str) -> Result<RateLimitStatus, RateLimitError> {
        let store_key = Self::store_key(key);
        let (count, stored_reset_at) = self.load(&store_key).await?;
        let limit = self.config.max_requests;

        // First write of a window fixes the reset time; later writes keep it
        let reset_at = stored_reset_at.unwrap_or_else(|| unix_now() + self.config.window_secs);

        if count >= limit {
            debug!(key, count, limit, reset_at, "Rate limit exceeded");
            return Err(RateLimitError::QuotaExceeded {
                count,
                limit,
                reset_at,
            });
        }

        let next = count + 1;
        self.store
            .put(
                &store_key,
                &next.to_string(),
                PutOptions::with_ttl(self.config.window_secs)
                    .metadata(serde_json::json!({ "reset_at": reset_at })),
            )
            .await?;

        Ok(RateLimitStatus {
            remaining: limit.saturating_sub(next),
            reset_at,
            limit,
        })
    }

    /// Read-only view of `key`'s quota; never mutates stored state.
    pub async fn peek(&self, key: &str) -> Result<RateLimitStatus, RateLimitError> {
        let store_key = Self::store_key(key);
        let (count, stored_reset_at) = self.load(&store_key).await?;

        Ok(RateLimitStatus {
            remaining: self.config.max_requests.saturating_sub(count),
            reset_at: stored_reset_at.unwrap_or_else(|| unix_now() + self.config.window_secs),
            limit: self.config.max_requests,
        })
    }

    /// Unconditionally remove `key`'s counter (test/administrative use).
    pub async fn clear(&self, key: &str) -> Result<(), RateLimitError> {
        self.store.delete(&Self::store_key(key)).await?;
        Ok(())
    }

    fn store_key(key: &str) -> String {
        format!("{RATE_LIMIT_KEY_PREFIX}{key}")
    }

    /// Load the current count and stored reset time for a key.
    ///
    /// Malformed or negative stored counts are normalized to zero rather
    /// than failing the request.
    async fn load(&self, store_key: &str) -> Result<(u32, Option<u64>), RateLimitError> {
        let Some(record) = self.store.get_with_metadata(store_key).await? else {
            return Ok((0, None));
        };

        let count = match record.value.trim().parse::<i64>() {
            Ok(n) if n >= 0 => u32::try_from(n).unwrap_or(u32::MAX),
            Ok(n) => {
                warn!(store_key, count = n, "Negative stored rate count, treating as zero");
                0
            }
            Err(_) => {
                warn!(store_key, value = %record.value, "Malformed stored rate count, treating as zero");
                0
            }
        };

        let reset_at = record
            .metadata
            .as_ref()
            .and_then(|meta| meta.get("reset_at"))
            .and_then(serde_json::Value::as_u64);

        Ok((count, reset_at))
    }
}
