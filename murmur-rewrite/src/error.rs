//! Typed errors for style transformation.
//!
//! Upstream failures are categorized so callers can distinguish "retry
//! later" (rate limit, network) from "misconfigured" (authentication) from
//! "upstream bug" (api). Each variant carries a stable machine-readable code
//! alongside its human-readable message.

use thiserror::Error;

/// Errors returned by the style transformer.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The completion upstream rejected the request for quota reasons.
    #[error("Upstream rate limit: {message}")]
    RateLimited {
        message: String,
        /// Upstream-provided retry hint, if any.
        retry_after_secs: Option<u64>,
    },

    /// The completion upstream rejected our credentials.
    #[error("Upstream authentication failed: {message}")]
    Authentication { message: String },

    /// The upstream could not be reached, or the request timed out.
    #[error("Upstream network failure: {message}")]
    Network { message: String },

    /// The upstream answered with an unexpected status or body.
    #[error("Upstream API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Api { status: Option<u16>, message: String },

    /// The upstream returned empty or whitespace-only output.
    #[error("Upstream returned an empty completion")]
    EmptyCompletion,

    /// The requested persona is not in the catalog.
    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    /// A custom style description exceeded the length bound.
    #[error("Custom style description too long: {length} characters (max {max})")]
    StyleTooLong { length: usize, max: usize },
}

impl RewriteError {
    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limit_error",
            Self::Authentication { .. } => "authentication_error",
            Self::Network { .. } => "network_error",
            Self::Api { .. } => "api_error",
            Self::EmptyCompletion => "empty_content",
            Self::UnknownPersona(_) | Self::StyleTooLong { .. } => "invalid_request_error",
        }
    }

    /// Returns `true` for failures of the upstream call itself, as opposed
    /// to invalid input rejected before any upstream contact.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        !matches!(self, Self::UnknownPersona(_) | Self::StyleTooLong { .. })
    }
}
