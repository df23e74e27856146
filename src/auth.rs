//! The authentication facade.
//!
//! Composes the credential store, lockout guard, MFA challenge manager,
//! token service, and rotation manager into the login state machine:
//!
//! ```text
//! AwaitingCredentials -(locked)------------------> Locked
//! AwaitingCredentials -(bad secret)--------------> AwaitingCredentials (+failure)
//! AwaitingCredentials -(good secret, no MFA)-----> Authenticated
//! AwaitingCredentials -(good secret, MFA)--------> AwaitingMFACode
//! AwaitingMFACode     -(bad code)----------------> AwaitingMFACode (+failure) | Locked
//! AwaitingMFACode     -(good code)---------------> Authenticated
//! ```

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretSlice;
use tracing::info;
use uuid::Uuid;

use crate::account::{
    normalize_email, AccountRepo, CredentialStore, RegisterOutcome, Role,
};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::lockout::LockoutGuard;
use crate::mfa::{MfaChallenge, MfaChallengeManager};
use crate::refresh::{RefreshRepo, RotationManager};
use crate::revocation::RevocationRegistry;
use crate::store::TtlStore;
use crate::token::{TokenKind, TokenPair, TokenService};

/// What a successful `login` hands back.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(TokenPair),
    /// Credentials verified but the account requires a second factor; the
    /// pair is only issued after `verify_mfa`.
    ChallengeIssued(MfaChallenge),
}

impl LoginOutcome {
    /// Unwrap the token pair for callers that do not handle MFA.
    ///
    /// # Errors
    ///
    /// `MfaRequired` when a challenge was issued instead.
    pub fn into_tokens(self) -> Result<TokenPair, AuthError> {
        match self {
            Self::Authenticated(pair) => Ok(pair),
            Self::ChallengeIssued(_) => Err(AuthError::MfaRequired),
        }
    }
}

/// Subject and role extracted from a valid access token.
///
/// This is the whole authorization contract consumed by the rest of the
/// system.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AccessContext {
    pub subject: Uuid,
    pub role: Role,
}

pub struct AuthService {
    credentials: CredentialStore,
    accounts: Arc<dyn AccountRepo>,
    tokens: Arc<TokenService>,
    rotation: RotationManager,
    mfa: MfaChallengeManager,
    lockout: LockoutGuard,
}

impl AuthService {
    /// Wire up the full identity core from its injected stores.
    #[must_use]
    pub fn new(
        config: AuthConfig,
        signing_key: SecretSlice<u8>,
        accounts: Arc<dyn AccountRepo>,
        refresh: Arc<dyn RefreshRepo>,
        ephemeral: Arc<dyn TtlStore>,
    ) -> Self {
        let revocation = RevocationRegistry::new(Arc::clone(&ephemeral));
        let tokens = Arc::new(TokenService::new(
            signing_key,
            config.clone(),
            revocation.clone(),
        ));
        let rotation = RotationManager::new(
            Arc::clone(&tokens),
            refresh,
            Arc::clone(&accounts),
            revocation,
            config.clone(),
        );
        #[allow(clippy::cast_sign_loss)]
        let mfa = MfaChallengeManager::new(
            Arc::clone(&tokens),
            Arc::clone(&ephemeral),
            Arc::clone(&accounts),
            rotation.clone(),
            Duration::from_secs(config.mfa_challenge_ttl_seconds().max(0) as u64),
        );
        let lockout = LockoutGuard::new(
            ephemeral,
            config.lockout_threshold(),
            Duration::from_secs(config.lockout_window_seconds()),
        );
        Self {
            credentials: CredentialStore::new(Arc::clone(&accounts)),
            accounts,
            tokens,
            rotation,
            mfa,
            lockout,
        }
    }

    /// Authenticate with identifier/secret from a given origin.
    ///
    /// # Errors
    ///
    /// `AccountLocked` when the lockout window has tripped, otherwise the
    /// credential-store errors; `InvalidCredentials` records a failure.
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
        origin: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let identity = normalize_email(identifier);
        if self.lockout.is_locked(&identity, origin).await? {
            return Err(AuthError::AccountLocked);
        }

        let account = match self.credentials.verify(identifier, secret).await {
            Ok(account) => account,
            Err(err) => {
                if err.counts_toward_lockout() {
                    self.lockout.record_failure(&identity, origin).await?;
                }
                return Err(err);
            }
        };

        self.lockout.reset(&identity, origin).await?;

        if account.mfa_enabled {
            let challenge = self.mfa.create_challenge(&account).await?;
            return Ok(LoginOutcome::ChallengeIssued(challenge));
        }

        info!(account_id = %account.id, "login succeeded");
        let pair = self.rotation.issue_initial(&account).await?;
        Ok(LoginOutcome::Authenticated(pair))
    }

    /// Redeem an MFA challenge with its one-time code.
    ///
    /// # Errors
    ///
    /// `AccountLocked` once the threshold trips; `MfaCodeInvalid` records a
    /// failure; `MfaCodeExpired` for consumed or expired challenges.
    pub async fn verify_mfa(
        &self,
        challenge_token: &str,
        code: &str,
        origin: &str,
    ) -> Result<TokenPair, AuthError> {
        // The lockout key follows the account identity, not the token.
        let claims = self.mfa.validate_challenge(challenge_token).await?;
        let Some(account) = self.accounts.get(claims.sub).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if self.lockout.is_locked(&account.email, origin).await? {
            return Err(AuthError::AccountLocked);
        }

        match self.mfa.verify(challenge_token, code).await {
            Ok(pair) => {
                self.lockout.reset(&account.email, origin).await?;
                Ok(pair)
            }
            Err(err) => {
                if err.counts_toward_lockout() {
                    self.lockout.record_failure(&account.email, origin).await?;
                }
                Err(err)
            }
        }
    }

    /// Validate an access token. The sole authorization primitive exposed to
    /// the rest of the system.
    ///
    /// # Errors
    ///
    /// Token validation errors, including `TokenRevoked` and the configured
    /// fail-open/fail-closed behavior for an unreachable registry.
    pub async fn validate(&self, access_token: &str) -> Result<AccessContext, AuthError> {
        let claims = self.tokens.validate(access_token, TokenKind::Access).await?;
        // Access tokens always carry a role; its absence means the token was
        // not issued by this core.
        let role = claims.role.ok_or(AuthError::TokenTypeMismatch)?;
        Ok(AccessContext {
            subject: claims.sub,
            role,
        })
    }

    /// Exchange a refresh token for a fresh pair.
    ///
    /// # Errors
    ///
    /// See [`RotationManager::rotate`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.rotation.rotate(refresh_token).await
    }

    /// End one session.
    ///
    /// # Errors
    ///
    /// See [`RotationManager::logout`].
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), AuthError> {
        self.rotation.logout(access_token, refresh_token).await
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// See [`CredentialStore::register`].
    pub async fn register(
        &self,
        identifier: &str,
        secret: &str,
        role: Role,
    ) -> Result<RegisterOutcome, AuthError> {
        self.credentials.register(identifier, secret, role).await
    }

    /// Start a password reset. Returns `None` for unknown identifiers so
    /// callers cannot probe for accounts.
    ///
    /// # Errors
    ///
    /// Signing and store failures.
    pub async fn begin_password_reset(
        &self,
        identifier: &str,
    ) -> Result<Option<String>, AuthError> {
        let email = normalize_email(identifier);
        let Some(account) = self.accounts.get_by_email(&email).await? else {
            return Ok(None);
        };
        let (token, _) = self
            .tokens
            .issue(TokenKind::PasswordReset, account.id, None)?;
        Ok(Some(token))
    }

    /// Complete a password reset and revoke every session for the account.
    ///
    /// # Errors
    ///
    /// Validator errors for the reset token, hash and store failures.
    pub async fn complete_password_reset(
        &self,
        reset_token: &str,
        new_secret: &str,
    ) -> Result<(), AuthError> {
        let claims = self
            .tokens
            .validate(reset_token, TokenKind::PasswordReset)
            .await?;
        self.credentials.change_secret(claims.sub, new_secret).await?;
        // A reset implies the old secret may be compromised.
        self.rotation.revoke_all_for_account(claims.sub).await?;
        info!(account_id = %claims.sub, "password reset completed");
        Ok(())
    }

    /// Issue an email-verification token for an account.
    ///
    /// # Errors
    ///
    /// Signing failures.
    pub fn request_email_verification(&self, account_id: Uuid) -> Result<String, AuthError> {
        let (token, _) = self
            .tokens
            .issue(TokenKind::EmailVerification, account_id, None)?;
        Ok(token)
    }

    /// Confirm an email-verification token, returning the verified subject.
    ///
    /// # Errors
    ///
    /// Validator errors for the verification token.
    pub async fn confirm_email(&self, verification_token: &str) -> Result<Uuid, AuthError> {
        let claims = self
            .tokens
            .validate(verification_token, TokenKind::EmailVerification)
            .await?;
        Ok(claims.sub)
    }

    /// Deactivate an account and revoke every session it holds.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn deactivate(&self, account_id: Uuid) -> Result<(), AuthError> {
        self.accounts.set_active(account_id, false).await?;
        self.rotation.revoke_all_for_account(account_id).await?;
        Ok(())
    }

    /// Change an account's role. Existing access tokens keep their old role
    /// until they expire or are revoked.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn set_role(&self, account_id: Uuid, role: Role) -> Result<(), AuthError> {
        self.accounts.update_role(account_id, role).await?;
        Ok(())
    }

    /// Toggle the MFA requirement for an account.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn set_mfa_enabled(&self, account_id: Uuid, enabled: bool) -> Result<(), AuthError> {
        self.accounts.set_mfa_enabled(account_id, enabled).await?;
        Ok(())
    }
}
