//! In-process TTL store.
//!
//! Backs tests and single-node deployments. Entries carry an absolute
//! deadline; expired entries are purged opportunistically on access.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, TtlStore};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// `TtlStore` over a mutex-guarded map.
#[derive(Default)]
pub struct MemoryTtlStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryTtlStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.live());
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        match entries.remove(key) {
            Some(entry) => Ok(entry.live()),
            None => Ok(false),
        }
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(key) {
            if entry.live() {
                let count = entry.value.parse::<u64>().unwrap_or(0).saturating_add(1);
                entry.value = count.to_string();
                return Ok(count);
            }
            entries.remove(key);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: "1".to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(1)
    }
}
