//! Accounts and credential verification.

pub(crate) mod memory;
pub(crate) mod postgres;
mod repo;
mod service;

pub use memory::MemoryAccountRepo;
pub use postgres::PgAccountRepo;
pub use repo::{AccountRepo, InsertOutcome};
pub use service::{CredentialStore, RegisterOutcome};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of roles carried by access tokens.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }

    pub(crate) fn from_str(value: &str) -> Option<Self> {
        match value.trim() {
            "student" => Some(Self::Student),
            "instructor" => Some(Self::Instructor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// A stored identity. The secret is only ever held as a salted adaptive hash.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub secret_hash: String,
    pub role: Role,
    pub active: bool,
    pub mfa_enabled: bool,
}

impl Account {
    /// An account that may authenticate at all.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.active
    }
}

/// Normalize an identifier for lookup and lockout keying.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
