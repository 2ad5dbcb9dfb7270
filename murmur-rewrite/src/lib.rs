//! Style transformation: rewriting a message in a chosen persona's voice so
//! the original author's writing style cannot be recognized.
//!
//! The rewrite is delegated to an external text-completion capability behind
//! the [`CompletionBackend`] trait; [`HttpCompletionClient`] is the
//! vendor-neutral HTTP implementation. A failed or empty rewrite is always a
//! typed error; untransformed text is never returned as if it had been
//! transformed.

pub mod client;
pub mod error;
pub mod persona;
pub mod rewriter;

pub use client::{CompletionBackend, CompletionClientConfig, CompletionRequest, HttpCompletionClient};
pub use error::RewriteError;
pub use persona::{Persona, StyleSelector};
pub use rewriter::{Rewriter, RewriterConfig, marked_fallback, truncate_to_words};
