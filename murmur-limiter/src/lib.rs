//! Fixed-window request rate limiting backed by the shared key-value store.
//!
//! Each client identity gets at most `max_requests` admitted requests per
//! `window_secs` window; the whole quota resets at the window boundary (a
//! fixed window, not a sliding one).
//!
//! The underlying store's read-modify-write is not atomic, so under true
//! concurrency two requests sharing a key can both observe the same count.
//! The limiter is a best-effort bound, not an exact one. An accepted
//! approximation of this design, not a bug to be fixed with locking.

pub mod error;
pub mod identity;
pub mod limiter;

pub use error::RateLimitError;
pub use identity::client_key;
pub use limiter::{RATE_LIMIT_KEY_PREFIX, RateLimitConfig, RateLimitStatus, RateLimiter};
