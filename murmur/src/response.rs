//! Serde response envelopes for the hosting shell.
//!
//! Every operation answers with a `success` flag; failures carry a machine
//! code and message, with the quota fields present only on quota
//! rejections.

use serde::Serialize;

use murmur_limiter::RateLimitError;

use crate::error::RelayError;

/// Error payload of a failed operation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<u64>,
}

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    // A flattened `None` contributes no fields
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response wrapping `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed response for `error`.
    #[must_use]
    pub fn err(error: &RelayError) -> Self {
        let (remaining, reset_at) = match error {
            RelayError::RateLimit(RateLimitError::QuotaExceeded { reset_at, .. }) => {
                (Some(0), Some(*reset_at))
            }
            _ => (None, None),
        };

        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: error.code(),
                message: error.to_string(),
                remaining,
                reset_at,
            }),
        }
    }
}

impl<T: Serialize> From<Result<T, RelayError>> for ApiResponse<T> {
    fn from(result: Result<T, RelayError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::err(&error),
        }
    }
}
