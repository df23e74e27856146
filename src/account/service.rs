//! Credential verification and account registration.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use uuid::Uuid;

use super::repo::{AccountRepo, InsertOutcome};
use super::{normalize_email, Account, Role};
use crate::error::AuthError;

/// Outcome of a registration attempt.
#[derive(Debug)]
pub enum RegisterOutcome {
    Created(Account),
    /// The identifier is already taken.
    Conflict,
}

/// Verifies secrets against stored salted adaptive hashes.
///
/// Raw secrets are never compared or persisted; only Argon2id PHC strings are
/// stored.
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn AccountRepo>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(repo: Arc<dyn AccountRepo>) -> Self {
        Self { repo }
    }

    /// Verify an identifier/secret pair.
    ///
    /// An inactive account fails with `AccountInactive` regardless of secret
    /// correctness.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for unknown identifiers or wrong secrets,
    /// `AccountInactive` for deactivated accounts, `StoreUnavailable` when
    /// the account store cannot be reached.
    pub async fn verify(&self, identifier: &str, secret: &str) -> Result<Account, AuthError> {
        let email = normalize_email(identifier);
        let Some(account) = self.repo.get_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !account.is_usable() {
            return Err(AuthError::AccountInactive);
        }
        verify_secret(secret, &account.secret_hash)?;
        Ok(account)
    }

    /// Register a new account. The secret is hashed before it is stored.
    ///
    /// # Errors
    ///
    /// Hash failures surface as `InvalidCredentials`; store failures as
    /// `StoreUnavailable`.
    pub async fn register(
        &self,
        identifier: &str,
        secret: &str,
        role: Role,
    ) -> Result<RegisterOutcome, AuthError> {
        let account = Account {
            id: Uuid::new_v4(),
            email: normalize_email(identifier),
            secret_hash: hash_secret(secret)?,
            role,
            active: true,
            mfa_enabled: false,
        };
        match self.repo.insert(&account).await? {
            InsertOutcome::Created => Ok(RegisterOutcome::Created(account)),
            InsertOutcome::Conflict => Ok(RegisterOutcome::Conflict),
        }
    }

    /// Replace an account's secret hash.
    ///
    /// # Errors
    ///
    /// Hash failures and store failures.
    pub async fn change_secret(&self, id: Uuid, new_secret: &str) -> Result<(), AuthError> {
        let hash = hash_secret(new_secret)?;
        self.repo.update_secret_hash(id, &hash).await?;
        Ok(())
    }
}

/// Hash a secret into an Argon2id PHC string.
pub(crate) fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::InvalidCredentials)
}

fn verify_secret(secret: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::MemoryAccountRepo;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryAccountRepo::new()))
    }

    #[tokio::test]
    async fn register_then_verify() -> Result<(), AuthError> {
        let store = store();
        let outcome = store
            .register("Ada@Example.com", "correct horse", Role::Student)
            .await?;
        let RegisterOutcome::Created(account) = outcome else {
            panic!("expected created");
        };
        assert_eq!(account.email, "ada@example.com");
        assert!(account.secret_hash.starts_with("$argon2"));

        let verified = store.verify(" ada@example.com ", "correct horse").await?;
        assert_eq!(verified.id, account.id);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_identifier_fail_alike() -> Result<(), AuthError> {
        let store = store();
        store
            .register("ada@example.com", "correct horse", Role::Student)
            .await?;
        let wrong = store.verify("ada@example.com", "battery staple").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        let unknown = store.verify("ghost@example.com", "anything").await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn inactive_account_fails_even_with_correct_secret() -> Result<(), AuthError> {
        let repo = Arc::new(MemoryAccountRepo::new());
        let store = CredentialStore::new(repo.clone());
        let RegisterOutcome::Created(account) = store
            .register("ada@example.com", "correct horse", Role::Student)
            .await?
        else {
            panic!("expected created");
        };
        repo.set_active(account.id, false).await?;
        let result = store.verify("ada@example.com", "correct horse").await;
        assert!(matches!(result, Err(AuthError::AccountInactive)));
        let result = store.verify("ada@example.com", "wrong").await;
        assert!(matches!(result, Err(AuthError::AccountInactive)));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() -> Result<(), AuthError> {
        let store = store();
        store
            .register("ada@example.com", "one", Role::Student)
            .await?;
        let outcome = store
            .register("ADA@example.com", "two", Role::Instructor)
            .await?;
        assert!(matches!(outcome, RegisterOutcome::Conflict));
        Ok(())
    }

    #[tokio::test]
    async fn change_secret_invalidates_the_old_one() -> Result<(), AuthError> {
        let store = store();
        let RegisterOutcome::Created(account) = store
            .register("ada@example.com", "old secret", Role::Student)
            .await?
        else {
            panic!("expected created");
        };
        store.change_secret(account.id, "new secret").await?;
        assert!(store.verify("ada@example.com", "old secret").await.is_err());
        assert!(store.verify("ada@example.com", "new secret").await.is_ok());
        Ok(())
    }
}
