//! In-process refresh-record storage.
//!
//! A single mutex guards the map, which is what makes `rotate` a CAS: the
//! revoke-or-bail check and the insert happen under one lock acquisition.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RefreshRecord, RefreshRepo, RotateOutcome};
use crate::store::StoreError;

#[derive(Default)]
pub struct MemoryRefreshRepo {
    records: Mutex<HashMap<Uuid, RefreshRecord>>,
}

impl MemoryRefreshRepo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshRepo for MemoryRefreshRepo {
    async fn insert(&self, record: &RefreshRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .await
            .insert(record.jti, record.clone());
        Ok(())
    }

    async fn get(&self, jti: Uuid) -> Result<Option<RefreshRecord>, StoreError> {
        Ok(self.records.lock().await.get(&jti).cloned())
    }

    async fn rotate(
        &self,
        old_jti: Uuid,
        new: &RefreshRecord,
    ) -> Result<RotateOutcome, StoreError> {
        let now = Utc::now();
        let mut records = self.records.lock().await;
        match records.get_mut(&old_jti) {
            Some(old) if old.is_active(now) => {
                old.revoked_at = Some(now);
                records.insert(new.jti, new.clone());
                Ok(RotateOutcome::Rotated)
            }
            _ => Ok(RotateOutcome::Reused),
        }
    }

    async fn revoke(&self, jti: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        match records.get_mut(&jti) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<RefreshRecord>, StoreError> {
        let now = Utc::now();
        let mut records = self.records.lock().await;
        let mut affected = Vec::new();
        for record in records.values_mut() {
            if record.account_id == account_id {
                if record.revoked_at.is_none() {
                    record.revoked_at = Some(now);
                }
                affected.push(record.clone());
            }
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(account_id: Uuid) -> RefreshRecord {
        let now = Utc::now();
        RefreshRecord {
            jti: Uuid::new_v4(),
            account_id,
            issued_at: now,
            expires_at: now + Duration::days(7),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn rotate_wins_once() -> Result<(), StoreError> {
        let repo = MemoryRefreshRepo::new();
        let account = Uuid::new_v4();
        let old = record(account);
        repo.insert(&old).await?;

        let first = repo.rotate(old.jti, &record(account)).await?;
        assert!(matches!(first, RotateOutcome::Rotated));
        let second = repo.rotate(old.jti, &record(account)).await?;
        assert!(matches!(second, RotateOutcome::Reused));
        Ok(())
    }

    #[tokio::test]
    async fn rotate_of_expired_record_is_reuse() -> Result<(), StoreError> {
        let repo = MemoryRefreshRepo::new();
        let account = Uuid::new_v4();
        let mut old = record(account);
        old.expires_at = Utc::now() - Duration::seconds(1);
        repo.insert(&old).await?;
        let outcome = repo.rotate(old.jti, &record(account)).await?;
        assert!(matches!(outcome, RotateOutcome::Reused));
        Ok(())
    }

    #[tokio::test]
    async fn revoke_is_idempotent() -> Result<(), StoreError> {
        let repo = MemoryRefreshRepo::new();
        let rec = record(Uuid::new_v4());
        repo.insert(&rec).await?;
        assert!(repo.revoke(rec.jti).await?);
        assert!(!repo.revoke(rec.jti).await?);
        assert!(!repo.revoke(Uuid::new_v4()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn revoke_all_returns_already_revoked_records_too() -> Result<(), StoreError> {
        let repo = MemoryRefreshRepo::new();
        let account = Uuid::new_v4();
        let first = record(account);
        let second = record(account);
        let other = record(Uuid::new_v4());
        repo.insert(&first).await?;
        repo.insert(&second).await?;
        repo.insert(&other).await?;
        repo.revoke(first.jti).await?;

        let affected = repo.revoke_all_for_account(account).await?;
        assert_eq!(affected.len(), 2);
        assert!(affected.iter().all(|r| r.revoked_at.is_some()));
        // Unrelated account untouched.
        assert!(repo.get(other.jti).await?.unwrap().revoked_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_rotation_has_one_winner() -> Result<(), StoreError> {
        use std::sync::Arc;
        let repo = Arc::new(MemoryRefreshRepo::new());
        let account = Uuid::new_v4();
        let old = record(account);
        repo.insert(&old).await?;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = Arc::clone(&repo);
            let old_jti = old.jti;
            let new = record(account);
            handles.push(tokio::spawn(async move {
                repo.rotate(old_jti, &new).await
            }));
        }
        let mut wins = 0;
        for handle in handles {
            if matches!(handle.await.unwrap()?, RotateOutcome::Rotated) {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        Ok(())
    }
}
