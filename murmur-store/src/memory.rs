use std::{
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use ahash::AHashMap;
use async_trait::async_trait;

use crate::{
    error::{Result, StoreError},
    r#trait::{KeyValueStore, PutOptions, Record},
};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    metadata: Option<serde_json::Value>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// In-memory key-value store implementation.
///
/// Records live in an `AHashMap` protected by an `RwLock`. Expiry is lazy:
/// an expired record is indistinguishable from an absent one on read, and is
/// physically removed the first time a read or sweep encounters it.
///
/// # Capacity Management
/// The store can be configured with a maximum record count. When capacity is
/// reached, writes of new keys fail; overwriting an existing key always
/// succeeds.
///
/// # Concurrency
/// Uses an `RwLock` for interior mutability. Primarily intended for tests
/// and single-process deployments; a production deployment would back this
/// trait with an external store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<AHashMap<String, Entry>>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Create a new empty store with unlimited capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store bounded to `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(AHashMap::new())),
            capacity: Some(capacity),
        }
    }

    /// Current number of records, including not-yet-evicted expired ones.
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the
    /// underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured capacity (`None` = unlimited).
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Remove all expired records, returning how many were evicted.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    fn read_entry(&self, key: &str) -> Result<Option<Entry>> {
        let now = Instant::now();
        let expired = {
            let entries = self.entries.read()?;
            match entries.get(key) {
                Some(entry) if entry.is_expired(now) => true,
                Some(entry) => return Ok(Some(entry.clone())),
                None => return Ok(None),
            }
        };

        if expired {
            // Evict under the write lock; re-check in case of a racing put.
            let mut entries = self.entries.write()?;
            if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
                entries.remove(key);
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entry(key)?.map(|entry| entry.value))
    }

    async fn get_with_metadata(&self, key: &str) -> Result<Option<Record>> {
        Ok(self.read_entry(key)?.map(|entry| Record {
            value: entry.value,
            metadata: entry.metadata,
        }))
    }

    async fn put(&self, key: &str, value: &str, options: PutOptions) -> Result<()> {
        let expires_at = options
            .ttl_seconds
            .map(|ttl| Instant::now() + Duration::from_secs(ttl));

        let mut entries = self.entries.write()?;

        if let Some(cap) = self.capacity
            && !entries.contains_key(key)
            && entries.len() >= cap
        {
            return Err(StoreError::Internal(format!(
                "Memory store capacity exceeded: {}/{} records",
                entries.len(),
                cap
            )));
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                metadata: options.metadata,
                expires_at,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write()?.remove(key);
        Ok(())
    }
}
