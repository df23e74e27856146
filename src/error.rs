//! Error taxonomy for the identity core.
//!
//! Every error is terminal for the current call; nothing here is retried
//! internally. The embedding layer (HTTP or otherwise) maps each variant to
//! its own response.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is inactive")]
    AccountInactive,
    #[error("account is locked")]
    AccountLocked,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token signature")]
    TokenInvalidSignature,
    #[error("token type mismatch")]
    TokenTypeMismatch,
    #[error("token revoked")]
    TokenRevoked,
    #[error("multi-factor challenge required")]
    MfaRequired,
    #[error("invalid one-time code")]
    MfaCodeInvalid,
    #[error("one-time code expired")]
    MfaCodeExpired,
    #[error("refresh token reused")]
    RefreshTokenReused,
    #[error("store unavailable")]
    StoreUnavailable(#[from] StoreError),
}

impl AuthError {
    /// True for failures that count toward the brute-force lockout window.
    #[must_use]
    pub fn counts_toward_lockout(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::MfaCodeInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::AuthError;

    #[test]
    fn lockout_relevant_variants() {
        assert!(AuthError::InvalidCredentials.counts_toward_lockout());
        assert!(AuthError::MfaCodeInvalid.counts_toward_lockout());
        assert!(!AuthError::AccountInactive.counts_toward_lockout());
        assert!(!AuthError::TokenExpired.counts_toward_lockout());
    }

    #[test]
    fn display_is_terse() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
        assert_eq!(AuthError::RefreshTokenReused.to_string(), "refresh token reused");
    }
}
