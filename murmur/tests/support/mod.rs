//! Shared fixtures for relay integration tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use murmur::{LimitsConfig, Relay};
use murmur_delivery::{
    CredentialIssuer, DeliveryError, DeliveryQueue, GatewayConfig, IssuedCredential, MailGateway,
    MessageTransport, QueueConfig, TokioScheduler,
};
use murmur_limiter::{RateLimitConfig, RateLimiter};
use murmur_rewrite::{
    CompletionBackend, CompletionRequest, RewriteError, Rewriter, RewriterConfig,
};
use murmur_store::MemoryStore;

pub const RECIPIENT: &str = "inbox@example.org";

/// Completion backend with a scripted behavior per call.
#[derive(Debug)]
pub enum ScriptedCompletion {
    /// Reply with a fixed rewrite regardless of input.
    Rewrite(&'static str),
    /// Fail every call with a network timeout.
    TimedOut,
    /// Reply with whitespace only.
    Blank,
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, RewriteError> {
        match self {
            Self::Rewrite(text) => Ok((*text).to_string()),
            Self::TimedOut => Err(RewriteError::Network {
                message: "Completion request timed out after 30s".to_string(),
            }),
            Self::Blank => Ok("   ".to_string()),
        }
    }
}

/// Issuer handing out sequence-numbered long-lived tokens.
#[derive(Debug, Default)]
pub struct CountingIssuer {
    issued: AtomicU64,
}

impl CountingIssuer {
    pub fn calls(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialIssuer for CountingIssuer {
    async fn issue(&self) -> Result<IssuedCredential, DeliveryError> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(IssuedCredential {
            token: format!("token-{n}"),
            expires_in_secs: 3600,
        })
    }
}

/// Transport recording every submission, decoded back to envelope text.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    failures: Mutex<Vec<DeliveryError>>,
    pub deliveries: Mutex<Vec<Delivery>>,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub token: String,
    pub envelope: String,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next submissions with `failures` (popped in order), then
    /// succeed.
    pub fn failing_with(mut failures: Vec<DeliveryError>) -> Self {
        failures.reverse();
        Self {
            failures: Mutex::new(failures),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn last_envelope(&self) -> Option<String> {
        self.deliveries
            .lock()
            .unwrap()
            .last()
            .map(|delivery| delivery.envelope.clone())
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn submit(&self, access_token: &str, raw_envelope: &str) -> Result<String, DeliveryError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(raw_envelope)
            .map_err(|e| DeliveryError::Transport(format!("Envelope not base64url: {e}")))?;
        let envelope = String::from_utf8(decoded)
            .map_err(|e| DeliveryError::Transport(format!("Envelope not UTF-8: {e}")))?;

        self.deliveries.lock().unwrap().push(Delivery {
            token: access_token.to_string(),
            envelope,
        });

        match self.failures.lock().unwrap().pop() {
            Some(err) => Err(err),
            None => Ok(format!(
                "transport-msg-{}",
                self.deliveries.lock().unwrap().len()
            )),
        }
    }
}

/// A fully wired relay over in-memory collaborators.
pub struct TestRelay {
    pub relay: Relay,
    pub store: Arc<MemoryStore>,
    pub scheduler: Arc<TokioScheduler>,
    pub transport: Arc<RecordingTransport>,
    pub issuer: Arc<CountingIssuer>,
}

pub struct TestRelayBuilder {
    completion: ScriptedCompletion,
    transport: RecordingTransport,
    max_requests: u32,
}

impl TestRelayBuilder {
    pub fn new() -> Self {
        Self {
            completion: ScriptedCompletion::Rewrite("I hereby declare this establishment excellent."),
            transport: RecordingTransport::new(),
            max_requests: 10,
        }
    }

    pub fn completion(mut self, completion: ScriptedCompletion) -> Self {
        self.completion = completion;
        self
    }

    pub fn transport(mut self, transport: RecordingTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    pub fn build(self) -> TestRelay {
        let store = Arc::new(MemoryStore::new());
        let scheduler = Arc::new(TokioScheduler::new());
        let transport = Arc::new(self.transport);
        let issuer = Arc::new(CountingIssuer::default());

        let limiter = RateLimiter::new(
            store.clone(),
            RateLimitConfig {
                window_secs: 60,
                max_requests: self.max_requests,
            },
        );
        let rewriter = Rewriter::new(Arc::new(self.completion), RewriterConfig::default());
        let gateway = Arc::new(MailGateway::new(
            issuer.clone(),
            transport.clone(),
            GatewayConfig {
                recipient: RECIPIENT.to_string(),
                subject: "You received an anonymous message".to_string(),
                credential_margin_secs: 60,
            },
        ));
        let queue = DeliveryQueue::new(
            store.clone(),
            gateway,
            scheduler.clone(),
            QueueConfig::default(),
        )
        .expect("queue config is valid");

        TestRelay {
            relay: Relay::new(limiter, rewriter, queue, LimitsConfig::default()),
            store,
            scheduler,
            transport,
            issuer,
        }
    }
}

impl Default for TestRelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
