//! Postgres-backed refresh-record storage.
//!
//! Rotation runs revoke-then-insert inside one transaction; the conditional
//! `UPDATE .. RETURNING` is the compare-and-swap that lets exactly one of two
//! concurrent rotations win.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{RefreshRecord, RefreshRepo, RotateOutcome};
use crate::store::StoreError;

pub struct PgRefreshRepo {
    pool: PgPool,
}

impl PgRefreshRepo {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> RefreshRecord {
    RefreshRecord {
        jti: row.get("jti"),
        account_id: row.get("account_id"),
        issued_at: row.get("issued_at"),
        expires_at: row.get("expires_at"),
        revoked_at: row.get("revoked_at"),
    }
}

#[async_trait]
impl RefreshRepo for PgRefreshRepo {
    async fn insert(&self, record: &RefreshRecord) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO refresh_tokens
                (jti, account_id, issued_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(record.jti)
            .bind(record.account_id)
            .bind(record.issued_at)
            .bind(record.expires_at)
            .bind(record.revoked_at)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn get(&self, jti: Uuid) -> Result<Option<RefreshRecord>, StoreError> {
        let query = r"
            SELECT jti, account_id, issued_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE jti = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(jti)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn rotate(
        &self,
        old_jti: Uuid,
        new: &RefreshRecord,
    ) -> Result<RotateOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = r"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE jti = $1
              AND revoked_at IS NULL
              AND expires_at > NOW()
            RETURNING jti
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let won = sqlx::query(query)
            .bind(old_jti)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await?
            .is_some();

        if !won {
            tx.rollback().await?;
            return Ok(RotateOutcome::Reused);
        }

        let query = r"
            INSERT INTO refresh_tokens
                (jti, account_id, issued_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(new.jti)
            .bind(new.account_id)
            .bind(new.issued_at)
            .bind(new.expires_at)
            .bind(new.revoked_at)
            .execute(&mut *tx)
            .instrument(span)
            .await?;

        tx.commit().await?;
        Ok(RotateOutcome::Rotated)
    }

    async fn revoke(&self, jti: Uuid) -> Result<bool, StoreError> {
        let query = r"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE jti = $1
              AND revoked_at IS NULL
            RETURNING jti
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(jti)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.is_some())
    }

    async fn revoke_all_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<RefreshRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = r"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE account_id = $1
              AND revoked_at IS NULL
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(account_id)
            .execute(&mut *tx)
            .instrument(span)
            .await?;

        let query = r"
            SELECT jti, account_id, issued_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE account_id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(account_id)
            .fetch_all(&mut *tx)
            .instrument(span)
            .await?;

        tx.commit().await?;
        Ok(rows.iter().map(row_to_record).collect())
    }
}
