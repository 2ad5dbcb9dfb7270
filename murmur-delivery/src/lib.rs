//! Delayed, anonymized message delivery.
//!
//! This crate provides:
//! - credential management for the downstream mail capability
//!   ([`credentials`]),
//! - the mail gateway adapter with its one-shot authentication retry
//!   ([`gateway`]),
//! - the delayed delivery queue that persists a transformed message, waits a
//!   randomized interval, and dispatches it at most once ([`queue`]),
//! - the deferred-job scheduler seam ([`scheduler`]).

pub mod credentials;
pub mod error;
pub mod gateway;
pub mod queue;
pub mod scheduler;

pub use credentials::{
    CredentialCache, CredentialIssuer, HttpCredentialIssuer, IssuedCredential, IssuerConfig,
};
pub use error::DeliveryError;
pub use gateway::{
    GatewayConfig, HttpMailTransport, MailGateway, MessageTransport, TransportConfig,
};
pub use queue::{DeliveryQueue, MESSAGE_KEY_PREFIX, QueueConfig, QueuedMessage};
pub use scheduler::{Job, JobScheduler, TokioScheduler};
