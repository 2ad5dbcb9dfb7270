//! The rewriter: prompt construction, input governance, output validation.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    client::{CompletionBackend, CompletionRequest},
    error::RewriteError,
    persona::StyleSelector,
};

const fn default_max_words() -> usize {
    150
}

const fn default_max_output_tokens() -> u32 {
    1000
}

const fn default_temperature() -> f64 {
    0.8
}

/// Configuration for the rewriter.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriterConfig {
    /// Inputs longer than this many words are truncated at a whitespace
    /// boundary before the upstream call, bounding cost and latency.
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Output token budget for the upstream call.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature for the upstream call.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Rewrites messages in a requested style via a completion backend.
#[derive(Debug, Clone)]
pub struct Rewriter {
    backend: Arc<dyn CompletionBackend>,
    config: RewriterConfig,
}

impl Rewriter {
    #[must_use]
    pub fn new(backend: Arc<dyn CompletionBackend>, config: RewriterConfig) -> Self {
        Self { backend, config }
    }

    /// Rewrite `text` in the selected style.
    ///
    /// The rewrite preserves meaning and approximate length while adopting
    /// the requested tone. Empty upstream output is an error
    /// ([`RewriteError::EmptyCompletion`]), never a silent pass-through.
    #[instrument(skip_all, fields(words = text.split_whitespace().count()))]
    pub async fn transform(
        &self,
        text: &str,
        selector: &StyleSelector,
    ) -> Result<String, RewriteError> {
        let input = truncate_to_words(text, self.config.max_words);
        if input.len() < text.len() {
            debug!(max_words = self.config.max_words, "Input truncated to word limit");
        }

        let request = CompletionRequest {
            instruction: build_instruction(selector.directive()),
            input,
            max_tokens: self.config.max_output_tokens,
            temperature: Some(self.config.temperature),
        };

        let output = self.backend.complete(&request).await?;
        let output = output.trim();
        if output.is_empty() {
            return Err(RewriteError::EmptyCompletion);
        }

        Ok(output.to_string())
    }
}

fn build_instruction(directive: &str) -> String {
    format!(
        "Rewrite the message you are given so that its meaning is preserved, \
         its length stays roughly the same, and it adopts {directive}. \
         Do not add new information, do not address the reader directly, and \
         reply with the rewritten message only."
    )
}

/// Truncate `text` to at most `max_words` words at a whitespace boundary.
///
/// Never splits a word. Inputs at or under the limit are returned verbatim.
#[must_use]
pub fn truncate_to_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    words[..max_words].join(" ")
}

/// Explicit fallback body for callers that choose to deliver on a failed
/// transformation instead of failing the operation.
///
/// The marker keeps the failure visible end-to-end; the original text is
/// never delivered disguised as a transformed one.
#[must_use]
pub fn marked_fallback(original: &str) -> String {
    format!("[style transformation unavailable] {original}")
}
