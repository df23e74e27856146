//! Multi-factor challenge tokens and one-time codes.
//!
//! Invoked only after credentials have verified for an MFA-enabled account.
//! The challenge token and its 6-digit code are keyed by the same `jti` and
//! expire together. Only the code's hash is cached server-side; the raw code
//! goes to the account's out-of-band channel.

use std::sync::Arc;
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::account::{Account, AccountRepo};
use crate::error::AuthError;
use crate::refresh::RotationManager;
use crate::store::TtlStore;
use crate::token::{Claims, TokenKind, TokenPair, TokenService};

const MFA_CODE_KEY_PREFIX: &str = "mfa:code";
const MFA_CODE_DIGITS: u32 = 6;

/// Challenge handed back to the login caller instead of usable tokens.
#[derive(Clone, Debug)]
pub struct MfaChallenge {
    pub challenge_token: String,
    /// Delivered to the user out-of-band, never logged.
    pub code: String,
}

pub struct MfaChallengeManager {
    tokens: Arc<TokenService>,
    store: Arc<dyn TtlStore>,
    accounts: Arc<dyn AccountRepo>,
    rotation: RotationManager,
    challenge_ttl: Duration,
}

impl MfaChallengeManager {
    #[must_use]
    pub fn new(
        tokens: Arc<TokenService>,
        store: Arc<dyn TtlStore>,
        accounts: Arc<dyn AccountRepo>,
        rotation: RotationManager,
        challenge_ttl: Duration,
    ) -> Self {
        Self {
            tokens,
            store,
            accounts,
            rotation,
            challenge_ttl,
        }
    }

    /// Issue a challenge token plus one-time code for a verified account.
    ///
    /// # Errors
    ///
    /// Signing and store failures.
    pub async fn create_challenge(&self, account: &Account) -> Result<MfaChallenge, AuthError> {
        let (challenge_token, claims) =
            self.tokens
                .issue(TokenKind::MfaChallenge, account.id, None)?;
        let code = generate_code();
        self.store
            .put(&key(claims.jti), &hash_code(&code), self.challenge_ttl)
            .await?;
        info!(account_id = %account.id, jti = %claims.jti, "mfa challenge created");
        Ok(MfaChallenge {
            challenge_token,
            code,
        })
    }

    /// Validate the challenge token and return its claims.
    ///
    /// An expired challenge surfaces as `MFACodeExpired`: from the caller's
    /// point of view the code is simply no longer redeemable.
    ///
    /// # Errors
    ///
    /// `MfaCodeExpired` for expired challenges; other validator errors
    /// propagate.
    pub async fn validate_challenge(&self, challenge_token: &str) -> Result<Claims, AuthError> {
        self.tokens
            .validate(challenge_token, TokenKind::MfaChallenge)
            .await
            .map_err(|err| match err {
                AuthError::TokenExpired => AuthError::MfaCodeExpired,
                other => other,
            })
    }

    /// Check the one-time code for a challenge and consume it on match.
    ///
    /// A mismatch keeps the stored code so limited retries remain possible
    /// until expiry or lockout. Consumption is single-use: losing the delete
    /// race counts as already consumed.
    ///
    /// # Errors
    ///
    /// `MfaCodeExpired` when absent or already consumed, `MfaCodeInvalid` on
    /// mismatch, store failures.
    pub async fn consume_code(&self, jti: Uuid, code: &str) -> Result<(), AuthError> {
        let Some(stored_hash) = self.store.get(&key(jti)).await? else {
            return Err(AuthError::MfaCodeExpired);
        };
        if stored_hash != hash_code(code) {
            return Err(AuthError::MfaCodeInvalid);
        }
        if !self.store.delete(&key(jti)).await? {
            return Err(AuthError::MfaCodeExpired);
        }
        Ok(())
    }

    /// Full verification: challenge token + code to a fresh token pair.
    ///
    /// # Errors
    ///
    /// As [`Self::validate_challenge`] and [`Self::consume_code`], plus
    /// `AccountInactive` when the account was deactivated mid-challenge.
    pub async fn verify(&self, challenge_token: &str, code: &str) -> Result<TokenPair, AuthError> {
        let claims = self.validate_challenge(challenge_token).await?;
        let Some(account) = self.accounts.get(claims.sub).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !account.is_usable() {
            return Err(AuthError::AccountInactive);
        }
        self.consume_code(claims.jti, code).await?;
        info!(account_id = %account.id, "mfa challenge verified");
        self.rotation.issue_initial(&account).await
    }
}

fn key(jti: Uuid) -> String {
    format!("{MFA_CODE_KEY_PREFIX}:{jti}")
}

fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    Base64UrlUnpadded::encode_string(&hasher.finalize())
}

/// Generate a uniformly drawn, zero-padded numeric one-time code.
fn generate_code() -> String {
    let value = OsRng.gen_range(0..10u32.pow(MFA_CODE_DIGITS));
    format!("{value:0width$}", width = MFA_CODE_DIGITS as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..32 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn code_hash_is_stable_and_distinct() {
        assert_eq!(hash_code("123456"), hash_code("123456"));
        assert_ne!(hash_code("123456"), hash_code("654321"));
    }
}
