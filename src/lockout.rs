//! Brute-force lockout counters.
//!
//! One counter per identity+origin pair, with the window TTL set on the first
//! failure only. Counters reset on successful authentication or when the
//! window expires.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::store::{StoreError, TtlStore};

const LOCKOUT_KEY_PREFIX: &str = "lockout";

#[derive(Clone)]
pub struct LockoutGuard {
    store: Arc<dyn TtlStore>,
    threshold: u32,
    window: Duration,
}

impl LockoutGuard {
    #[must_use]
    pub fn new(store: Arc<dyn TtlStore>, threshold: u32, window: Duration) -> Self {
        Self {
            store,
            threshold,
            window,
        }
    }

    /// Record a failed attempt for this identity+origin.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn record_failure(&self, identity: &str, origin: &str) -> Result<(), StoreError> {
        let count = self
            .store
            .increment(&key(identity, origin), self.window)
            .await?;
        if count >= u64::from(self.threshold) {
            info!(identity, origin, count, "lockout threshold reached");
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn is_locked(&self, identity: &str, origin: &str) -> Result<bool, StoreError> {
        let count = self
            .store
            .get(&key(identity, origin))
            .await?
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);
        Ok(count >= u64::from(self.threshold))
    }

    /// Clear the counter after a successful authentication.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn reset(&self, identity: &str, origin: &str) -> Result<(), StoreError> {
        self.store.delete(&key(identity, origin)).await?;
        Ok(())
    }
}

fn key(identity: &str, origin: &str) -> String {
    format!("{LOCKOUT_KEY_PREFIX}:{identity}:{origin}")
}
