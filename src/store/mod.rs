//! Shared ephemeral store abstraction.
//!
//! Blacklist entries, MFA one-time codes, and lockout counters all live in a
//! fast store with native TTL support. The store is injected explicitly into
//! every component that needs it; there is no process-global state, so tests
//! can swap in their own implementation (including a failing one to exercise
//! fail-open/fail-closed behavior).

pub(crate) mod memory;

pub use memory::MemoryTtlStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure talking to a backing store (ephemeral or relational).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Key/value store with native TTL semantics.
///
/// Keys expire on their own; callers never see an expired entry. `increment`
/// applies the TTL only when it creates the key, so a burst of failures
/// counts within one fixed window rather than a sliding one.
#[async_trait]
pub trait TtlStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Delete a key, reporting whether it was present. The boolean is what
    /// makes single-use consumption race-safe: exactly one caller sees `true`.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Increment a counter, returning the new value. TTL is set on creation
    /// only.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, StoreError>;
}
