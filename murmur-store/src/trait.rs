use async_trait::async_trait;

use crate::error::Result;

/// Options applied when writing a record.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Time-to-live in seconds. `None` means the record never expires.
    pub ttl_seconds: Option<u64>,
    /// Opaque metadata stored alongside the value and returned by
    /// [`KeyValueStore::get_with_metadata`].
    pub metadata: Option<serde_json::Value>,
}

impl PutOptions {
    /// Options with a TTL and no metadata.
    #[must_use]
    pub const fn with_ttl(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds: Some(ttl_seconds),
            metadata: None,
        }
    }

    /// Attach metadata to these options.
    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A stored value together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub value: String,
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over a durable key-value store with TTL support.
///
/// Implementations must treat an expired record exactly like an absent one:
/// reads return `None`, regardless of whether physical eviction has happened
/// yet.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Read the value and metadata for `key`, or `None` if absent or expired.
    async fn get_with_metadata(&self, key: &str) -> Result<Option<Record>>;

    /// Write `value` under `key`, replacing any existing record.
    async fn put(&self, key: &str, value: &str, options: PutOptions) -> Result<()>;

    /// Remove the record for `key`. Removing an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<()>;
}
