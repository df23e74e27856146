//! Postgres-backed account storage.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::repo::{AccountRepo, InsertOutcome};
use super::{Account, Role};
use crate::store::StoreError;

pub struct PgAccountRepo {
    pool: PgPool,
}

impl PgAccountRepo {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Account {
    let role_text: String = row.get("role");
    Account {
        id: row.get("id"),
        email: row.get("email"),
        secret_hash: row.get("secret_hash"),
        // Unknown role text cannot authenticate anything; map it to the
        // least-privileged role.
        role: Role::from_str(&role_text).unwrap_or(Role::Student),
        active: row.get("active"),
        mfa_enabled: row.get("mfa_enabled"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl AccountRepo for PgAccountRepo {
    async fn insert(&self, account: &Account) -> Result<InsertOutcome, StoreError> {
        let query = r"
            INSERT INTO accounts
                (id, email, secret_hash, role, active, mfa_enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(account.id)
            .bind(&account.email)
            .bind(&account.secret_hash)
            .bind(account.role.as_str())
            .bind(account.active)
            .bind(account.mfa_enabled)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = r"
            SELECT id, email, secret_hash, role, active, mfa_enabled
            FROM accounts
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.as_ref().map(row_to_account))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = r"
            SELECT id, email, secret_hash, role, active, mfa_enabled
            FROM accounts
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.as_ref().map(row_to_account))
    }

    async fn update_secret_hash(&self, id: Uuid, secret_hash: &str) -> Result<(), StoreError> {
        let query = "UPDATE accounts SET secret_hash = $2, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(secret_hash)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        let query = "UPDATE accounts SET role = $2, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<(), StoreError> {
        let query = "UPDATE accounts SET active = $2, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn set_mfa_enabled(&self, id: Uuid, enabled: bool) -> Result<(), StoreError> {
        let query = "UPDATE accounts SET mfa_enabled = $2, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(enabled)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }
}
