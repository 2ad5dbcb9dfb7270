//! Unified relay configuration.
//!
//! Loaded from a RON file located with the following precedence:
//! 1. `MURMUR_CONFIG` environment variable
//! 2. `./murmur.config.ron` (current working directory)
//! 3. `/etc/murmur/murmur.config.ron` (system-wide config)

use std::sync::Arc;

use serde::Deserialize;

use murmur_delivery::{
    DeliveryQueue, GatewayConfig, HttpCredentialIssuer, HttpMailTransport, IssuerConfig,
    MailGateway, QueueConfig, TokioScheduler, TransportConfig,
};
use murmur_limiter::{RateLimitConfig, RateLimiter};
use murmur_rewrite::{CompletionClientConfig, HttpCompletionClient, Rewriter, RewriterConfig};
use murmur_store::MemoryStore;

use crate::relay::{LimitsConfig, Relay};

/// Top-level configuration for the relay and its collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub rewriter: RewriterConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    /// Completion upstream (endpoint, credential, model, timeout).
    pub completion: CompletionClientConfig,

    /// Credential issuer for the mail capability.
    pub issuer: IssuerConfig,

    /// Mail transport endpoint.
    pub transport: TransportConfig,

    /// Recipient, subject, and credential margin.
    pub gateway: GatewayConfig,
}

impl RelayConfig {
    /// Locate and parse the configuration file.
    pub fn load() -> anyhow::Result<Self> {
        let path = find_config_file()?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config from {}: {}", path.display(), e)
        })?;
        Ok(ron::from_str(&content)?)
    }

    /// Wire the full pipeline from this configuration.
    ///
    /// Returns the relay and the scheduler, which the host must drain before
    /// teardown so in-flight deliveries are not cut off.
    pub fn build(self) -> anyhow::Result<(Relay, Arc<TokioScheduler>)> {
        let store = Arc::new(MemoryStore::new());
        let scheduler = Arc::new(TokioScheduler::new());

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let limiter = RateLimiter::new(store.clone(), self.rate_limit);

        let completion = HttpCompletionClient::new(self.completion)
            .map_err(|e| anyhow::anyhow!("Failed to build completion client: {e}"))?;
        let rewriter = Rewriter::new(Arc::new(completion), self.rewriter);

        let gateway = Arc::new(MailGateway::new(
            Arc::new(HttpCredentialIssuer::new(self.issuer, http.clone())),
            Arc::new(HttpMailTransport::new(self.transport, http)),
            self.gateway,
        ));
        let queue = DeliveryQueue::new(store, gateway, scheduler.clone(), self.queue)?;

        Ok((
            Relay::new(limiter, rewriter, queue, self.limits),
            scheduler,
        ))
    }
}

/// Find the configuration file using the documented precedence.
fn find_config_file() -> anyhow::Result<std::path::PathBuf> {
    if let Ok(env_path) = std::env::var("MURMUR_CONFIG") {
        let path = std::path::PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "MURMUR_CONFIG points to non-existent file: {}",
            path.display()
        );
    }

    let default_paths = vec![
        std::path::PathBuf::from("./murmur.config.ron"),
        std::path::PathBuf::from("/etc/murmur/murmur.config.ron"),
    ];

    for path in &default_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - MURMUR_CONFIG environment variable\n{paths_tried}"
    )
}
