//! In-process account storage for tests and embedded use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::repo::{AccountRepo, InsertOutcome};
use super::{Account, Role};
use crate::store::StoreError;

#[derive(Default)]
pub struct MemoryAccountRepo {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl MemoryAccountRepo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self.accounts.lock().await;
        if let Some(account) = accounts.get_mut(&id) {
            apply(account);
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepo for MemoryAccountRepo {
    async fn insert(&self, account: &Account) -> Result<InsertOutcome, StoreError> {
        let mut accounts = self.accounts.lock().await;
        if accounts.values().any(|existing| existing.email == account.email) {
            return Ok(InsertOutcome::Conflict);
        }
        accounts.insert(account.id, account.clone());
        Ok(InsertOutcome::Created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.lock().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .await
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn update_secret_hash(&self, id: Uuid, secret_hash: &str) -> Result<(), StoreError> {
        let hash = secret_hash.to_string();
        self.update(id, |account| account.secret_hash = hash).await
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        self.update(id, |account| account.role = role).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<(), StoreError> {
        self.update(id, |account| account.active = active).await
    }

    async fn set_mfa_enabled(&self, id: Uuid, enabled: bool) -> Result<(), StoreError> {
        self.update(id, |account| account.mfa_enabled = enabled).await
    }
}
