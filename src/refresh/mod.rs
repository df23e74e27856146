//! Refresh-token records and single-use rotation.

pub(crate) mod memory;
pub(crate) mod postgres;
mod service;

pub use memory::MemoryRefreshRepo;
pub use postgres::PgRefreshRepo;
pub use service::RotationManager;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::StoreError;

/// Persisted record for one issued refresh token.
///
/// The record id is the refresh token's `jti`; the paired access token shares
/// it. Records are never deleted eagerly, only marked revoked, so a replayed
/// token is distinguishable from one that never existed.
#[derive(Clone, Debug)]
pub struct RefreshRecord {
    pub jti: Uuid,
    pub account_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshRecord {
    /// Usable for rotation: neither revoked nor past expiry.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Result of an atomic rotation attempt.
#[derive(Debug)]
pub enum RotateOutcome {
    /// This caller revoked the old record and owns the new one.
    Rotated,
    /// The record was missing, expired, or already revoked.
    Reused,
}

/// Durable storage for refresh records.
#[async_trait]
pub trait RefreshRepo: Send + Sync {
    async fn insert(&self, record: &RefreshRecord) -> Result<(), StoreError>;

    async fn get(&self, jti: Uuid) -> Result<Option<RefreshRecord>, StoreError>;

    /// Atomically revoke `old_jti` (only if still active) and insert `new`.
    /// Two concurrent calls with the same `old_jti` must not both observe
    /// [`RotateOutcome::Rotated`].
    async fn rotate(
        &self,
        old_jti: Uuid,
        new: &RefreshRecord,
    ) -> Result<RotateOutcome, StoreError>;

    /// Mark a single record revoked. Idempotent; reports whether this call
    /// performed the revocation.
    async fn revoke(&self, jti: Uuid) -> Result<bool, StoreError>;

    /// Revoke every unrevoked record for the account and return all of the
    /// account's records, including previously revoked ones, so the caller
    /// can blacklist any paired access token still in flight.
    async fn revoke_all_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<RefreshRecord>, StoreError>;
}
