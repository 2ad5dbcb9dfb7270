//! The delayed delivery queue.
//!
//! A transformed message is persisted with a randomized release time, held
//! until that time, then sent through the mail gateway and removed. The
//! random delay defeats timing correlation between submission and delivery;
//! the stored record carries only the transformed text, never the original.
//!
//! Per-message state machine: Queued → (timer elapses) → Delivering →
//! Delivered (removed), with an implicit Expired (removed) terminal when the
//! safety TTL lapses first.
//!
//! Delivery is attempted once. A failed send leaves the record in place and
//! logs the failure; no automatic re-scheduling happens, so the record ages
//! out at the safety TTL. An accepted, visible limitation rather than a
//! masked one. A crash between a successful send and the record delete could
//! in principle duplicate a send; no transport-side idempotency key exists
//! to prevent it.

use std::{sync::Arc, time::Duration};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use murmur_common::clock::unix_now;
use murmur_store::{KeyValueStore, PutOptions};

use crate::{error::DeliveryError, gateway::MailGateway, scheduler::JobScheduler};

/// Store key prefix for queued messages.
///
/// Rate limit counters use the disjoint `rate_limit:` prefix, so the two
/// components never collide in the shared store.
pub const MESSAGE_KEY_PREFIX: &str = "msg_";

const fn default_min_delay_secs() -> u64 {
    3600 // 1 hour
}

const fn default_max_delay_secs() -> u64 {
    21600 // 6 hours
}

const fn default_safety_ttl_secs() -> u64 {
    86400 // 24 hours
}

/// Configuration for the delayed delivery queue.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Minimum delivery delay in seconds.
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,

    /// Maximum delivery delay in seconds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    /// Safety time-to-live for stored records, in seconds. Must be strictly
    /// longer than the maximum delay so a worst-case-delay message cannot be
    /// evicted before its scheduled time.
    #[serde(default = "default_safety_ttl_secs")]
    pub safety_ttl_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            safety_ttl_secs: default_safety_ttl_secs(),
        }
    }
}

impl QueueConfig {
    fn validate(&self) -> Result<(), DeliveryError> {
        if self.min_delay_secs > self.max_delay_secs {
            return Err(DeliveryError::Configuration(format!(
                "min_delay_secs ({}) exceeds max_delay_secs ({})",
                self.min_delay_secs, self.max_delay_secs
            )));
        }
        if self.safety_ttl_secs <= self.max_delay_secs {
            return Err(DeliveryError::Configuration(format!(
                "safety_ttl_secs ({}) must be strictly greater than max_delay_secs ({})",
                self.safety_ttl_secs, self.max_delay_secs
            )));
        }
        Ok(())
    }
}

/// A message awaiting delivery. Exclusively owned by the queue; the
/// transformed text is the only payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: String,
    pub transformed_text: String,
    /// Unix seconds at which the message was accepted.
    pub queued_at: u64,
    /// Unix seconds at which delivery becomes due. Never before `queued_at`.
    pub scheduled_for: u64,
}

/// The delayed delivery queue.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    store: Arc<dyn KeyValueStore>,
    gateway: Arc<MailGateway>,
    scheduler: Arc<dyn JobScheduler>,
    config: QueueConfig,
}

impl DeliveryQueue {
    /// Create a queue, validating the delay/TTL configuration.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        gateway: Arc<MailGateway>,
        scheduler: Arc<dyn JobScheduler>,
        config: QueueConfig,
    ) -> Result<Self, DeliveryError> {
        config.validate()?;
        Ok(Self {
            store,
            gateway,
            scheduler,
            config,
        })
    }

    /// Accept a transformed message for delayed delivery.
    ///
    /// Persists the message with the safety TTL and schedules the delivery
    /// job. `immediate` skips the random delay (test/verification paths).
    /// Returns the queued message id.
    pub async fn enqueue(
        &self,
        transformed_text: &str,
        immediate: bool,
    ) -> Result<String, DeliveryError> {
        let id = ulid::Ulid::new().to_string();
        let queued_at = unix_now();
        let delay_secs = if immediate { 0 } else { self.draw_delay_secs() };

        let message = QueuedMessage {
            id: id.clone(),
            transformed_text: transformed_text.to_string(),
            queued_at,
            scheduled_for: queued_at + delay_secs,
        };

        self.store
            .put(
                &store_key(&id),
                &serde_json::to_string(&message)?,
                PutOptions::with_ttl(self.config.safety_ttl_secs),
            )
            .await?;

        info!(
            message_id = %id,
            delay_secs,
            scheduled_for = message.scheduled_for,
            "Message queued for delayed delivery"
        );

        let store = self.store.clone();
        let gateway = self.gateway.clone();
        let job_id = id.clone();
        self.scheduler.schedule(
            Duration::from_secs(delay_secs),
            Box::pin(async move {
                // Failures here are invisible to the submitter by design;
                // the log is the operational error channel.
                if let Err(err) = deliver(&store, &gateway, &job_id).await {
                    error!(message_id = %job_id, error = %err, "Delayed delivery failed, record left for expiry");
                }
            }),
        );

        Ok(id)
    }

    /// Draw a uniformly random delivery delay from the configured range.
    fn draw_delay_secs(&self) -> u64 {
        rand::rng().random_range(self.config.min_delay_secs..=self.config.max_delay_secs)
    }
}

fn store_key(id: &str) -> String {
    format!("{MESSAGE_KEY_PREFIX}{id}")
}

/// Deliver a queued message by id: read it back, send, then remove.
///
/// An absent record is a no-op (the message expired or was already
/// delivered), not an error. A failed send deliberately leaves the record in
/// place.
async fn deliver(
    store: &Arc<dyn KeyValueStore>,
    gateway: &Arc<MailGateway>,
    id: &str,
) -> Result<Option<String>, DeliveryError> {
    let key = store_key(id);

    let Some(value) = store.get(&key).await? else {
        debug!(message_id = %id, "Queued message gone before delivery, skipping");
        return Ok(None);
    };

    let message: QueuedMessage = serde_json::from_str(&value)?;
    let transport_id = gateway.send(&message.transformed_text).await?;

    store.delete(&key).await?;
    info!(message_id = %id, transport_id = %transport_id, "Message delivered and removed");

    Ok(Some(transport_id))
}
