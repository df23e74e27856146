//! Token issuance and validation.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretSlice};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{sign_hs256, verify_hs256};
use super::{Claims, TokenKind};
use crate::account::Role;
use crate::config::{AuthConfig, RevocationPolicy};
use crate::error::AuthError;
use crate::revocation::RevocationRegistry;

/// Issues and validates purpose-scoped signed tokens.
///
/// The signature and expiry checks are local; only access-token validation
/// consults the revocation registry. Behavior when the registry is
/// unreachable follows the configured [`RevocationPolicy`].
pub struct TokenService {
    key: SecretSlice<u8>,
    config: AuthConfig,
    revocation: RevocationRegistry,
}

impl TokenService {
    #[must_use]
    pub fn new(key: SecretSlice<u8>, config: AuthConfig, revocation: RevocationRegistry) -> Self {
        Self {
            key,
            config,
            revocation,
        }
    }

    /// Issue a token of the given kind with a fresh `jti`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: Uuid,
        role: Option<Role>,
    ) -> Result<(String, Claims), AuthError> {
        self.issue_with_jti(kind, subject, Uuid::new_v4(), role)
    }

    /// Issue a token bound to a caller-chosen `jti` (refresh-record linkage).
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn issue_with_jti(
        &self,
        kind: TokenKind,
        subject: Uuid,
        jti: Uuid,
        role: Option<Role>,
    ) -> Result<(String, Claims), AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject,
            kind,
            jti,
            iat: now,
            exp: now + self.config.token_ttl_seconds(kind),
            role,
        };
        let token = sign_hs256(self.key.expose_secret(), &claims)?;
        Ok((token, claims))
    }

    /// Validate a token against an expected kind, including the revocation
    /// check for access tokens.
    ///
    /// # Errors
    ///
    /// `TokenInvalidSignature` / `TokenExpired` from the local checks,
    /// `TokenTypeMismatch` when the purpose tag differs from `expected`,
    /// `TokenRevoked` for blacklisted access tokens, and `StoreUnavailable`
    /// when the registry is unreachable under the fail-closed policy.
    pub async fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = self.verify_local(token, expected)?;

        if expected == TokenKind::Access {
            match self.revocation.is_revoked(claims.jti).await {
                Ok(true) => return Err(AuthError::TokenRevoked),
                Ok(false) => {}
                Err(err) => match self.config.revocation_policy() {
                    RevocationPolicy::FailClosed => return Err(AuthError::StoreUnavailable(err)),
                    RevocationPolicy::FailOpen => {
                        warn!(jti = %claims.jti, error = %err, "revocation check degraded, accepting token");
                    }
                },
            }
        }

        Ok(claims)
    }

    /// Signature, expiry, and kind checks only; the registry is not consulted.
    ///
    /// Logout uses this so an already-blacklisted access token can still be
    /// logged out idempotently.
    ///
    /// # Errors
    ///
    /// Same as [`TokenService::validate`] minus `TokenRevoked` and
    /// `StoreUnavailable`.
    pub fn verify_local(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = verify_hs256(token, self.key.expose_secret(), Utc::now().timestamp())?;
        if claims.kind != expected {
            return Err(AuthError::TokenTypeMismatch);
        }
        Ok(claims)
    }
}
