//! Runtime configuration for the identity core.

use crate::token::TokenKind;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_PASSWORD_RESET_TTL_SECONDS: i64 = 30 * 60;
const DEFAULT_EMAIL_VERIFICATION_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_MFA_CHALLENGE_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_LOCKOUT_THRESHOLD: u32 = 5;
const DEFAULT_LOCKOUT_WINDOW_SECONDS: u64 = 15 * 60;

/// What the validator does when the revocation registry cannot be reached.
///
/// This is a construction-time decision, never inferred per call, so both
/// modes can be exercised deterministically.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevocationPolicy {
    /// Reject the token with `StoreUnavailable`.
    FailClosed,
    /// Accept the token and log the degraded check.
    FailOpen,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    password_reset_ttl_seconds: i64,
    email_verification_ttl_seconds: i64,
    mfa_challenge_ttl_seconds: i64,
    lockout_threshold: u32,
    lockout_window_seconds: u64,
    revocation_policy: RevocationPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            password_reset_ttl_seconds: DEFAULT_PASSWORD_RESET_TTL_SECONDS,
            email_verification_ttl_seconds: DEFAULT_EMAIL_VERIFICATION_TTL_SECONDS,
            mfa_challenge_ttl_seconds: DEFAULT_MFA_CHALLENGE_TTL_SECONDS,
            lockout_threshold: DEFAULT_LOCKOUT_THRESHOLD,
            lockout_window_seconds: DEFAULT_LOCKOUT_WINDOW_SECONDS,
            revocation_policy: RevocationPolicy::FailClosed,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_password_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.password_reset_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_email_verification_ttl_seconds(mut self, seconds: i64) -> Self {
        self.email_verification_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_mfa_challenge_ttl_seconds(mut self, seconds: i64) -> Self {
        self.mfa_challenge_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_lockout_threshold(mut self, threshold: u32) -> Self {
        self.lockout_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_lockout_window_seconds(mut self, seconds: u64) -> Self {
        self.lockout_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_revocation_policy(mut self, policy: RevocationPolicy) -> Self {
        self.revocation_policy = policy;
        self
    }

    /// Lifetime for a given token kind, in seconds.
    #[must_use]
    pub fn token_ttl_seconds(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_seconds,
            TokenKind::Refresh => self.refresh_ttl_seconds,
            TokenKind::PasswordReset => self.password_reset_ttl_seconds,
            TokenKind::EmailVerification => self.email_verification_ttl_seconds,
            TokenKind::MfaChallenge => self.mfa_challenge_ttl_seconds,
        }
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn mfa_challenge_ttl_seconds(&self) -> i64 {
        self.mfa_challenge_ttl_seconds
    }

    #[must_use]
    pub fn lockout_threshold(&self) -> u32 {
        self.lockout_threshold
    }

    #[must_use]
    pub fn lockout_window_seconds(&self) -> u64 {
        self.lockout_window_seconds
    }

    #[must_use]
    pub fn revocation_policy(&self) -> RevocationPolicy {
        self.revocation_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = AuthConfig::new();
        assert_eq!(config.access_ttl_seconds(), DEFAULT_ACCESS_TTL_SECONDS);
        assert_eq!(config.refresh_ttl_seconds(), DEFAULT_REFRESH_TTL_SECONDS);
        assert_eq!(config.lockout_threshold(), DEFAULT_LOCKOUT_THRESHOLD);
        assert_eq!(config.revocation_policy(), RevocationPolicy::FailClosed);

        let config = config
            .with_access_ttl_seconds(60)
            .with_lockout_threshold(3)
            .with_revocation_policy(RevocationPolicy::FailOpen);
        assert_eq!(config.access_ttl_seconds(), 60);
        assert_eq!(config.lockout_threshold(), 3);
        assert_eq!(config.revocation_policy(), RevocationPolicy::FailOpen);
    }

    #[test]
    fn ttl_lookup_is_exhaustive_per_kind() {
        let config = AuthConfig::new()
            .with_access_ttl_seconds(1)
            .with_refresh_ttl_seconds(2)
            .with_password_reset_ttl_seconds(3)
            .with_email_verification_ttl_seconds(4)
            .with_mfa_challenge_ttl_seconds(5);
        assert_eq!(config.token_ttl_seconds(TokenKind::Access), 1);
        assert_eq!(config.token_ttl_seconds(TokenKind::Refresh), 2);
        assert_eq!(config.token_ttl_seconds(TokenKind::PasswordReset), 3);
        assert_eq!(config.token_ttl_seconds(TokenKind::EmailVerification), 4);
        assert_eq!(config.token_ttl_seconds(TokenKind::MfaChallenge), 5);
    }
}
