//! Refresh rotation, reuse detection, and logout.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::{RefreshRecord, RefreshRepo, RotateOutcome};
use crate::account::{Account, AccountRepo};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::revocation::RevocationRegistry;
use crate::token::{TokenKind, TokenPair, TokenService};

/// Issues access/refresh pairs and enforces single-use rotation.
///
/// Every pair shares one `jti` with its refresh record, so the set of record
/// jtis is exactly the set of access tokens ever issued for an account. Reuse
/// of a rotated refresh token is treated as theft: every session for the
/// account is revoked before the error is surfaced.
#[derive(Clone)]
pub struct RotationManager {
    tokens: Arc<TokenService>,
    repo: Arc<dyn RefreshRepo>,
    accounts: Arc<dyn AccountRepo>,
    revocation: RevocationRegistry,
    config: AuthConfig,
}

impl RotationManager {
    #[must_use]
    pub fn new(
        tokens: Arc<TokenService>,
        repo: Arc<dyn RefreshRepo>,
        accounts: Arc<dyn AccountRepo>,
        revocation: RevocationRegistry,
        config: AuthConfig,
    ) -> Self {
        Self {
            tokens,
            repo,
            accounts,
            revocation,
            config,
        }
    }

    fn new_record(&self, account_id: Uuid) -> RefreshRecord {
        let now = Utc::now();
        RefreshRecord {
            jti: Uuid::new_v4(),
            account_id,
            issued_at: now,
            expires_at: now + Duration::seconds(self.config.refresh_ttl_seconds()),
            revoked_at: None,
        }
    }

    fn pair_for_record(
        &self,
        account: &Account,
        record: &RefreshRecord,
    ) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.tokens.issue_with_jti(
            TokenKind::Access,
            account.id,
            record.jti,
            Some(account.role),
        )?;
        let (refresh_token, _) =
            self.tokens
                .issue_with_jti(TokenKind::Refresh, account.id, record.jti, None)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Create a refresh record and issue the initial pair for a session.
    ///
    /// # Errors
    ///
    /// Store and signing failures.
    pub async fn issue_initial(&self, account: &Account) -> Result<TokenPair, AuthError> {
        let record = self.new_record(account.id);
        self.repo.insert(&record).await?;
        self.pair_for_record(account, &record)
    }

    /// Exchange a refresh token for a new pair, invalidating the old one.
    ///
    /// # Errors
    ///
    /// Validator errors propagate unchanged; a missing, expired, or already
    /// revoked record fails with `RefreshTokenReused` after revoking every
    /// session for the account.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .tokens
            .validate(refresh_token, TokenKind::Refresh)
            .await?;
        let Some(account) = self.accounts.get(claims.sub).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !account.is_usable() {
            return Err(AuthError::AccountInactive);
        }
        let new_record = self.new_record(claims.sub);
        match self.repo.rotate(claims.jti, &new_record).await? {
            RotateOutcome::Rotated => self.pair_for_record(&account, &new_record),
            RotateOutcome::Reused => {
                warn!(account_id = %claims.sub, jti = %claims.jti, "refresh token reuse detected");
                self.revoke_all_for_account(claims.sub).await?;
                Err(AuthError::RefreshTokenReused)
            }
        }
    }

    /// Revoke one session: blacklist the access token and revoke the refresh
    /// record. Other sessions of the same account are unaffected.
    ///
    /// An access token past its own expiry is benign here: it can never
    /// validate again, so its blacklist entry would be a no-op, and the
    /// refresh record must still die.
    ///
    /// # Errors
    ///
    /// Local validation errors for either token, and store failures.
    pub async fn logout(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), AuthError> {
        // Local verification only: logging out an already-blacklisted token
        // must stay idempotent.
        match self.tokens.verify_local(access_token, TokenKind::Access) {
            Ok(access) => self.revocation.revoke(access.jti, access.exp).await?,
            Err(AuthError::TokenExpired) => {}
            Err(err) => return Err(err),
        }
        let refresh = self
            .tokens
            .verify_local(refresh_token, TokenKind::Refresh)?;
        self.repo.revoke(refresh.jti).await?;
        info!(account_id = %refresh.sub, "session logged out");
        Ok(())
    }

    /// Revoke every session for the account: all refresh records plus any
    /// paired access token still within its lifetime.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn revoke_all_for_account(&self, account_id: Uuid) -> Result<(), AuthError> {
        let records = self.repo.revoke_all_for_account(account_id).await?;
        let revoked = records.len();
        for record in records {
            // The paired access token was issued when the record was created;
            // blacklisting past its own expiry would outlive the token.
            let access_exp =
                (record.issued_at + Duration::seconds(self.config.access_ttl_seconds()))
                    .timestamp();
            self.revocation.revoke(record.jti, access_exp).await?;
        }
        info!(%account_id, revoked, "revoked all sessions for account");
        Ok(())
    }
}
