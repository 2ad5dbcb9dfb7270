//! HTTP completion backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RewriteError;

const fn default_timeout_secs() -> u64 {
    30
}

/// One transformation request handed to the completion backend.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The rewriting instruction, including the style directive.
    pub instruction: String,
    /// The message text to rewrite.
    pub input: String,
    /// Output token budget.
    pub max_tokens: u32,
    /// Sampling temperature, if the backend supports it.
    pub temperature: Option<f64>,
}

/// Abstraction over an external text-completion capability.
#[async_trait]
pub trait CompletionBackend: Send + Sync + std::fmt::Debug {
    /// Generate a completion for `request`.
    ///
    /// Implementations map transport and upstream failures onto the
    /// [`RewriteError`] categories; a timeout is a network failure.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RewriteError>;
}

/// Configuration for the HTTP completion client.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionClientConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Bearer credential for the upstream.
    pub api_key: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Hard request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

/// Vendor-neutral HTTP implementation of [`CompletionBackend`] speaking the
/// common chat-completions wire shape.
#[derive(Debug)]
pub struct HttpCompletionClient {
    config: CompletionClientConfig,
    client: reqwest::Client,
}

impl HttpCompletionClient {
    /// Build a client with the configured hard timeout.
    pub fn new(config: CompletionClientConfig) -> Result<Self, RewriteError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RewriteError::Network {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self { config, client })
    }

    fn map_status(status: reqwest::StatusCode, body: &str, retry_after: Option<u64>) -> RewriteError {
        let message = if body.is_empty() {
            status.to_string()
        } else {
            body.to_string()
        };

        match status.as_u16() {
            401 | 403 => RewriteError::Authentication { message },
            429 => RewriteError::RateLimited {
                message,
                retry_after_secs: retry_after,
            },
            code => RewriteError::Api {
                status: Some(code),
                message,
            },
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RewriteError> {
        let body = WireRequest {
            model: &self.config.model,
            messages: [
                WireMessage {
                    role: "system",
                    content: &request.instruction,
                },
                WireMessage {
                    role: "user",
                    content: &request.input,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "Requesting completion");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RewriteError::Network {
                message: if e.is_timeout() {
                    format!("Completion request timed out after {}s", self.config.timeout_secs)
                } else {
                    format!("Completion request failed: {e}")
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, &body, retry_after));
        }

        let parsed: WireResponse = response.json().await.map_err(|e| RewriteError::Api {
            status: None,
            message: format!("Malformed completion response: {e}"),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(RewriteError::EmptyCompletion);
        }

        Ok(content)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = HttpCompletionClient::map_status(
            reqwest::StatusCode::UNAUTHORIZED,
            "bad key",
            None,
        );
        assert_eq!(err.code(), "authentication_error");

        let err = HttpCompletionClient::map_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "slow down",
            Some(12),
        );
        assert_eq!(err.code(), "rate_limit_error");
        assert!(matches!(
            err,
            RewriteError::RateLimited {
                retry_after_secs: Some(12),
                ..
            }
        ));

        let err =
            HttpCompletionClient::map_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "", None);
        assert_eq!(err.code(), "api_error");
        assert!(matches!(err, RewriteError::Api { status: Some(500), .. }));
    }

    #[test]
    fn test_wire_request_shape() {
        let body = WireRequest {
            model: "rewriter-1",
            messages: [
                WireMessage {
                    role: "system",
                    content: "rewrite it",
                },
                WireMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            max_tokens: 1000,
            temperature: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "rewriter-1");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        // Absent temperature is omitted, not null
        assert!(json.get("temperature").is_none());
    }
}
