//! murmur, an anonymous message relay.
//!
//! Short text messages are rewritten in a chosen persona's voice to disguise
//! the author's writing style, held for a randomized interval to defeat
//! timing correlation, and forwarded to a single fixed recipient through a
//! mail gateway.
//!
//! This crate wires the pipeline together and exposes the three
//! consumer-facing operations, [`Relay::submit`], [`Relay::preview`], and
//! [`Relay::status`], for the HTTP shell hosting it.

pub mod config;
pub mod error;
pub mod relay;
pub mod response;

pub use murmur_common::logging;

pub use config::RelayConfig;
pub use error::{RelayError, ValidationError};
pub use relay::{LimitsConfig, PreviewOutcome, Relay, RelayRequest, SubmitOutcome};
pub use response::{ApiError, ApiResponse};
