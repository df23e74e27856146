//! Durable account storage seam.

use async_trait::async_trait;
use uuid::Uuid;

use super::{Account, Role};
use crate::store::StoreError;

/// Outcome of an insert against the unique identifier constraint.
#[derive(Debug)]
pub enum InsertOutcome {
    Created,
    Conflict,
}

/// Relational storage for accounts.
///
/// Lookups by id and by normalized identifier; mutations cover registration,
/// password change, role change, deactivation, and the MFA flag.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn insert(&self, account: &Account) -> Result<InsertOutcome, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn update_secret_hash(&self, id: Uuid, secret_hash: &str) -> Result<(), StoreError>;

    async fn update_role(&self, id: Uuid, role: Role) -> Result<(), StoreError>;

    async fn set_active(&self, id: Uuid, active: bool) -> Result<(), StoreError>;

    async fn set_mfa_enabled(&self, id: Uuid, enabled: bool) -> Result<(), StoreError>;
}
