//! The submission/preview orchestrator.
//!
//! Within one submission, rate limit admission happens before the style
//! transformation, which happens before enqueueing. The original message
//! text never reaches the queue; only the transformed text is persisted.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use murmur_delivery::DeliveryQueue;
use murmur_limiter::{RateLimitStatus, RateLimiter};
use murmur_rewrite::{Persona, Rewriter, StyleSelector};

use crate::error::{RelayError, ValidationError};

const fn default_max_message_chars() -> usize {
    1000
}

/// Validation bounds for inbound messages.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum message length in characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
        }
    }
}

/// One inbound submission or preview request, as decoded by the HTTP shell.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayRequest {
    /// The message text to disguise.
    pub message: String,

    /// Catalog persona name. Takes precedence over `style`.
    #[serde(default)]
    pub persona: Option<String>,

    /// Free-text style guidance, used when no persona is given.
    #[serde(default)]
    pub style: Option<String>,

    /// Skip the random delivery delay (test/verification paths).
    #[serde(default)]
    pub immediate: bool,
}

/// Successful submission: the message is queued for delayed delivery.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub message_id: String,
    #[serde(flatten)]
    pub rate_limit: RateLimitStatus,
}

/// Successful preview: both texts are returned, nothing is queued.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewOutcome {
    pub original: String,
    pub transformed: String,
    #[serde(flatten)]
    pub rate_limit: RateLimitStatus,
}

/// The relay pipeline: rate limiter → rewriter → delayed delivery queue.
#[derive(Debug, Clone)]
pub struct Relay {
    limiter: RateLimiter,
    rewriter: Rewriter,
    queue: DeliveryQueue,
    limits: LimitsConfig,
}

impl Relay {
    #[must_use]
    pub fn new(
        limiter: RateLimiter,
        rewriter: Rewriter,
        queue: DeliveryQueue,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            limiter,
            rewriter,
            queue,
            limits,
        }
    }

    /// Accept a message for disguised, delayed delivery.
    ///
    /// Validates, admits against the caller's quota, transforms, and
    /// enqueues. A transformation failure fails the submission; the
    /// original text is never delivered in its place.
    #[instrument(skip_all, fields(identity = %identity))]
    pub async fn submit(
        &self,
        identity: &str,
        request: &RelayRequest,
    ) -> Result<SubmitOutcome, RelayError> {
        let message = self.validate(&request.message)?;
        let selector = select_style(request)?;

        let rate_limit = self.limiter.consume(identity).await?;
        let transformed = self.rewriter.transform(message, &selector).await?;
        let message_id = self.queue.enqueue(&transformed, request.immediate).await?;

        info!(
            message_id = %message_id,
            remaining = rate_limit.remaining,
            "Submission accepted"
        );

        Ok(SubmitOutcome {
            message_id,
            rate_limit,
        })
    }

    /// Transform a message without queueing it, so the submitter can see
    /// what would be delivered.
    #[instrument(skip_all, fields(identity = %identity))]
    pub async fn preview(
        &self,
        identity: &str,
        request: &RelayRequest,
    ) -> Result<PreviewOutcome, RelayError> {
        let message = self.validate(&request.message)?;
        let selector = select_style(request)?;

        let rate_limit = self.limiter.consume(identity).await?;
        let transformed = self.rewriter.transform(message, &selector).await?;

        Ok(PreviewOutcome {
            original: message.to_string(),
            transformed,
            rate_limit,
        })
    }

    /// Read-only view of the caller's quota.
    pub async fn status(&self, identity: &str) -> Result<RateLimitStatus, RelayError> {
        Ok(self.limiter.peek(identity).await?)
    }

    fn validate<'a>(&self, message: &'a str) -> Result<&'a str, ValidationError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        let length = message.chars().count();
        if length > self.limits.max_message_chars {
            return Err(ValidationError::MessageTooLong {
                length,
                max: self.limits.max_message_chars,
            });
        }

        Ok(message)
    }
}

/// Resolve the request's style selection.
///
/// A named persona takes precedence; free-text guidance is the fallback;
/// with neither, the rewrite defaults to the casual persona.
fn select_style(request: &RelayRequest) -> Result<StyleSelector, RelayError> {
    if let Some(name) = request.persona.as_deref() {
        return Ok(StyleSelector::named(name)?);
    }
    if let Some(style) = request.style.as_deref() {
        return Ok(StyleSelector::custom(style)?);
    }
    Ok(StyleSelector::Persona(Persona::Casual))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(message: &str) -> RelayRequest {
        RelayRequest {
            message: message.to_string(),
            persona: None,
            style: None,
            immediate: false,
        }
    }

    #[test]
    fn test_select_style_precedence() {
        let mut req = request("hi");
        req.persona = Some("poetic".to_string());
        req.style = Some("like a weather report".to_string());
        assert_eq!(
            select_style(&req).unwrap(),
            StyleSelector::Persona(Persona::Poetic)
        );

        req.persona = None;
        assert_eq!(
            select_style(&req).unwrap(),
            StyleSelector::Custom("like a weather report".to_string())
        );

        req.style = None;
        assert_eq!(
            select_style(&req).unwrap(),
            StyleSelector::Persona(Persona::Casual)
        );
    }

    #[test]
    fn test_select_style_rejects_unknown_persona() {
        let mut req = request("hi");
        req.persona = Some("swashbuckler".to_string());
        let err = select_style(&req).unwrap_err();
        assert_eq!(err.code(), "invalid_request_error");
    }
}
