//! TTL-bounded registry of revoked token identifiers.
//!
//! The single source of truth for logged-out or force-invalidated access
//! tokens. Entries never outlive the token they revoke, which bounds the
//! registry's size: once a token has expired on its own, its blacklist entry
//! has expired too.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::store::{StoreError, TtlStore};

const REVOKED_KEY_PREFIX: &str = "revoked";

#[derive(Clone)]
pub struct RevocationRegistry {
    store: Arc<dyn TtlStore>,
}

impl RevocationRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self { store }
    }

    /// Blacklist a `jti` until the token's own expiry.
    ///
    /// A zero-or-negative remaining lifetime is a no-op: the token is already
    /// expired and will never validate again. Re-revoking is idempotent.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn revoke(&self, jti: Uuid, expires_at_unix: i64) -> Result<(), StoreError> {
        let remaining = expires_at_unix - Utc::now().timestamp();
        if remaining <= 0 {
            return Ok(());
        }
        #[allow(clippy::cast_sign_loss)]
        let ttl = Duration::from_secs(remaining as u64);
        self.store.put(&key(jti), "1", ttl).await
    }

    /// # Errors
    ///
    /// Propagates store failures; the caller's revocation policy decides what
    /// an unreachable registry means.
    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool, StoreError> {
        Ok(self.store.get(&key(jti)).await?.is_some())
    }
}

fn key(jti: Uuid) -> String {
    format!("{REVOKED_KEY_PREFIX}:{jti}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTtlStore;

    fn registry() -> RevocationRegistry {
        RevocationRegistry::new(Arc::new(MemoryTtlStore::new()))
    }

    #[tokio::test]
    async fn revoke_then_lookup() -> Result<(), StoreError> {
        let registry = registry();
        let jti = Uuid::new_v4();
        assert!(!registry.is_revoked(jti).await?);
        registry.revoke(jti, Utc::now().timestamp() + 60).await?;
        assert!(registry.is_revoked(jti).await?);
        // Idempotent.
        registry.revoke(jti, Utc::now().timestamp() + 60).await?;
        assert!(registry.is_revoked(jti).await?);
        Ok(())
    }

    #[tokio::test]
    async fn expired_token_is_a_noop() -> Result<(), StoreError> {
        let registry = registry();
        let jti = Uuid::new_v4();
        registry.revoke(jti, Utc::now().timestamp() - 1).await?;
        assert!(!registry.is_revoked(jti).await?);
        registry.revoke(jti, Utc::now().timestamp()).await?;
        assert!(!registry.is_revoked(jti).await?);
        Ok(())
    }
}
