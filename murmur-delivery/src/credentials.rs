//! Access-credential management for the mail capability.
//!
//! The cache is an explicitly owned object handed to the gateway, not a
//! hidden module-level singleton: it can be constructed per test, and its
//! refresh discipline is visible. Holding the cache lock across the refresh
//! round-trip makes the refresh single-flight.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::DeliveryError;

/// A freshly issued access credential and its reported lifetime.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub expires_in_secs: u64,
}

/// Abstraction over the credential issuer: exchanges long-lived refresh
/// material for a short-lived access token.
#[async_trait]
pub trait CredentialIssuer: Send + Sync + std::fmt::Debug {
    async fn issue(&self) -> Result<IssuedCredential, DeliveryError>;
}

#[derive(Debug, Clone)]
struct CachedCredential {
    token: String,
    expires_at: Instant,
}

/// Process-wide cache for the mail capability's access credential.
///
/// A cached token is never returned within the safety margin of its expiry,
/// so a one-hour token with the default five-minute margin is treated as
/// valid for fifty-five minutes.
#[derive(Debug)]
pub struct CredentialCache {
    slot: tokio::sync::Mutex<Option<CachedCredential>>,
    margin: Duration,
}

impl CredentialCache {
    /// Create a cache with the given expiry safety margin.
    #[must_use]
    pub const fn new(margin: Duration) -> Self {
        Self {
            slot: tokio::sync::Mutex::const_new(None),
            margin,
        }
    }

    /// Return a valid access token, refreshing through `issuer` if the
    /// cached one is absent or within the safety margin of expiry.
    pub async fn get(&self, issuer: &dyn CredentialIssuer) -> Result<String, DeliveryError> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref()
            && Instant::now() + self.margin < cached.expires_at
        {
            return Ok(cached.token.clone());
        }

        debug!("Refreshing mail access credential");
        let issued = issuer.issue().await?;
        let token = issued.token.clone();
        *slot = Some(CachedCredential {
            token: issued.token,
            expires_at: Instant::now() + Duration::from_secs(issued.expires_in_secs),
        });

        Ok(token)
    }

    /// Discard the cached credential so the next [`get`](Self::get)
    /// refreshes. Called after a downstream authentication failure.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

/// Configuration for the HTTP credential issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuerConfig {
    /// Token endpoint URL.
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    /// Long-lived refresh material.
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// HTTP implementation of [`CredentialIssuer`] performing a standard
/// refresh-token grant exchange.
#[derive(Debug)]
pub struct HttpCredentialIssuer {
    config: IssuerConfig,
    client: reqwest::Client,
}

impl HttpCredentialIssuer {
    #[must_use]
    pub fn new(config: IssuerConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl CredentialIssuer for HttpCredentialIssuer {
    async fn issue(&self) -> Result<IssuedCredential, DeliveryError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.config.refresh_token.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| DeliveryError::Credential(format!("Token exchange failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Credential(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Credential(format!("Malformed token response: {e}")))?;

        Ok(IssuedCredential {
            token: token.access_token,
            expires_in_secs: token.expires_in,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    /// Issuer handing out sequence-numbered tokens with a fixed lifetime.
    #[derive(Debug)]
    struct CountingIssuer {
        issued: AtomicU64,
        expires_in_secs: u64,
    }

    impl CountingIssuer {
        fn with_lifetime(expires_in_secs: u64) -> Self {
            Self {
                issued: AtomicU64::new(0),
                expires_in_secs,
            }
        }

        fn calls(&self) -> u64 {
            self.issued.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialIssuer for CountingIssuer {
        async fn issue(&self) -> Result<IssuedCredential, DeliveryError> {
            let n = self.issued.fetch_add(1, Ordering::SeqCst);
            Ok(IssuedCredential {
                token: format!("token-{n}"),
                expires_in_secs: self.expires_in_secs,
            })
        }
    }

    #[tokio::test]
    async fn test_token_is_cached_within_margin() {
        let issuer = CountingIssuer::with_lifetime(3600);
        let cache = CredentialCache::new(Duration::from_secs(60));

        let first = cache.get(&issuer).await.unwrap();
        let second = cache.get(&issuer).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn test_short_lived_token_triggers_refresh() {
        // Lifetime shorter than the margin: every get must refresh
        let issuer = CountingIssuer::with_lifetime(30);
        let cache = CredentialCache::new(Duration::from_secs(60));

        let first = cache.get(&issuer).await.unwrap();
        let second = cache.get(&issuer).await.unwrap();

        assert_eq!(first, "token-0");
        assert_eq!(second, "token-1");
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_exactly_one_refresh() {
        let issuer = CountingIssuer::with_lifetime(3600);
        let cache = CredentialCache::new(Duration::from_secs(60));

        cache.get(&issuer).await.unwrap();
        cache.invalidate().await;

        let refreshed = cache.get(&issuer).await.unwrap();
        assert_eq!(refreshed, "token-1");
        // And the refreshed token is cached again
        assert_eq!(cache.get(&issuer).await.unwrap(), "token-1");
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn test_issuer_failure_propagates() {
        #[derive(Debug)]
        struct BrokenIssuer;

        #[async_trait]
        impl CredentialIssuer for BrokenIssuer {
            async fn issue(&self) -> Result<IssuedCredential, DeliveryError> {
                Err(DeliveryError::Credential("grant revoked".to_string()))
            }
        }

        let cache = CredentialCache::new(Duration::from_secs(60));
        let err = cache.get(&BrokenIssuer).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Credential(_)));
    }
}
