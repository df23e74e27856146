//! # Identeco (Identity & Session Lifecycle Core)
//!
//! `identeco` is the identity and session authority for a larger platform.
//! It owns credential verification, purpose-scoped signed tokens, refresh
//! rotation with reuse detection, TTL-bounded revocation, multi-factor
//! challenges, and brute-force lockout. Everything else in the platform is a
//! consumer: protected operations call [`AuthService::validate`] and act on
//! the returned subject and role.
//!
//! ## Flow Overview
//!
//! 1) `login` verifies credentials behind the lockout guard; MFA-enabled
//!    accounts get a short-lived challenge instead of tokens.
//! 2) `verify_mfa` redeems the challenge with its one-time code.
//! 3) Every API call validates the access token; only this path consults the
//!    revocation registry.
//! 4) `refresh` rotates the refresh token: single use, atomic, with reuse
//!    treated as theft (all sessions for the account are revoked).
//!
//! ## Security Boundaries
//!
//! - Secrets are stored only as salted adaptive hashes; raw values are never
//!   compared or persisted.
//! - Tokens are purpose-tagged and the tag is matched exhaustively, so a
//!   token issued for one purpose never validates as another.
//! - Blacklist entries never outlive the token they revoke, which bounds the
//!   registry's size.
//! - Behavior when the revocation registry is unreachable is an explicit
//!   construction-time policy ([`RevocationPolicy`]), never guessed per call.
//!
//! ## Storage
//!
//! Accounts and refresh records live in durable relational storage
//! (`Pg*` adapters); blacklist entries, one-time codes, and lockout counters
//! live in an injected TTL store. In-memory implementations of both seams
//! back tests and single-node use.

pub mod account;
pub mod auth;
pub mod config;
pub mod error;
pub mod lockout;
pub mod mfa;
pub mod refresh;
pub mod revocation;
pub mod store;
pub mod token;

pub use account::{Account, AccountRepo, CredentialStore, RegisterOutcome, Role};
pub use auth::{AccessContext, AuthService, LoginOutcome};
pub use config::{AuthConfig, RevocationPolicy};
pub use error::AuthError;
pub use lockout::LockoutGuard;
pub use mfa::{MfaChallenge, MfaChallengeManager};
pub use refresh::{RefreshRecord, RefreshRepo, RotationManager};
pub use revocation::RevocationRegistry;
pub use store::{MemoryTtlStore, StoreError, TtlStore};
pub use token::{Claims, TokenKind, TokenPair, TokenService};
