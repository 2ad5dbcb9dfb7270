//! Mail gateway adapter.
//!
//! Formats the minimal transport envelope (fixed recipient, fixed subject,
//! plain-text body), base64url-encodes it, and submits it through the
//! message transport with a single bounded authentication retry.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    credentials::{CredentialCache, CredentialIssuer},
    error::DeliveryError,
};

const fn default_subject() -> String {
    String::new()
}

const fn default_credential_margin_secs() -> u64 {
    300
}

/// Configuration for the mail gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// The single fixed recipient of every delivered message.
    pub recipient: String,

    /// Fixed subject line; empty means the transport default.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Expiry safety margin for cached access credentials, in seconds.
    #[serde(default = "default_credential_margin_secs")]
    pub credential_margin_secs: u64,
}

/// Abstraction over the downstream message transport.
#[async_trait]
pub trait MessageTransport: Send + Sync + std::fmt::Debug {
    /// Submit a base64url-encoded envelope, returning the transport-assigned
    /// message id.
    ///
    /// Authentication rejections must surface as
    /// [`DeliveryError::Unauthorized`]; that category alone triggers the
    /// gateway's credential refresh-and-retry.
    async fn submit(&self, access_token: &str, raw_envelope: &str) -> Result<String, DeliveryError>;
}

/// The mail gateway: credential handling plus envelope submission.
#[derive(Debug)]
pub struct MailGateway {
    issuer: Arc<dyn CredentialIssuer>,
    transport: Arc<dyn MessageTransport>,
    credentials: CredentialCache,
    config: GatewayConfig,
}

impl MailGateway {
    #[must_use]
    pub fn new(
        issuer: Arc<dyn CredentialIssuer>,
        transport: Arc<dyn MessageTransport>,
        config: GatewayConfig,
    ) -> Self {
        let credentials = CredentialCache::new(Duration::from_secs(config.credential_margin_secs));
        Self {
            issuer,
            transport,
            credentials,
            config,
        }
    }

    /// Send `body` to the fixed recipient.
    ///
    /// On an authentication rejection the cached credential is invalidated
    /// and the send retried exactly once with a fresh credential; a second
    /// rejection is fatal. Non-authentication failures propagate without
    /// retry; broader retry policy belongs to the caller.
    pub async fn send(&self, body: &str) -> Result<String, DeliveryError> {
        let envelope = build_envelope(&self.config.recipient, &self.config.subject, body);
        let raw = URL_SAFE_NO_PAD.encode(envelope);

        let mut last_rejection = None;
        for attempt in 0..=1 {
            let token = self.credentials.get(self.issuer.as_ref()).await?;

            match self.transport.submit(&token, &raw).await {
                Ok(message_id) => {
                    info!(message_id = %message_id, attempt, "Message accepted by transport");
                    return Ok(message_id);
                }
                Err(err) if err.is_unauthorized() => {
                    warn!(attempt, error = %err, "Transport rejected credential, invalidating cache");
                    self.credentials.invalidate().await;
                    last_rejection = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        // Both attempts were rejected for authentication
        Err(last_rejection
            .unwrap_or_else(|| DeliveryError::Unauthorized("credential rejected".to_string())))
    }
}

/// Build the minimal RFC 2822 envelope the transport expects.
fn build_envelope(recipient: &str, subject: &str, body: &str) -> String {
    format!(
        "To: {recipient}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{body}"
    )
}

/// Configuration for the HTTP mail transport.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Send endpoint URL.
    pub endpoint: String,
}

#[derive(Debug, serde::Serialize)]
struct SubmitRequest<'a> {
    raw: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: Option<String>,
}

/// HTTP implementation of [`MessageTransport`]: posts the encoded envelope
/// with bearer authentication.
#[derive(Debug)]
pub struct HttpMailTransport {
    config: TransportConfig,
    client: reqwest::Client,
}

impl HttpMailTransport {
    #[must_use]
    pub fn new(config: TransportConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl MessageTransport for HttpMailTransport {
    async fn submit(&self, access_token: &str, raw_envelope: &str) -> Result<String, DeliveryError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(access_token)
            .json(&SubmitRequest { raw: raw_envelope })
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(format!("Send request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Unauthorized(format!("{status}: {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Transport(format!("{status}: {body}")));
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(format!("Malformed send response: {e}")))?;

        Ok(parsed.id.unwrap_or_else(|| "unknown".to_string()))
    }
}
