//! Purpose-scoped signed tokens.
//!
//! Tokens are three-part `header.payload.signature` structures signed with a
//! symmetric key. Every token carries a purpose tag; a token issued for one
//! purpose never validates as another, so a password-reset token cannot be
//! replayed as an access token.

pub(crate) mod jwt;
mod service;

pub use service::TokenService;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::Role;

/// Purpose tag for an issued token.
///
/// The tag is matched exhaustively everywhere; an unknown or missing tag
/// fails decoding rather than defaulting.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    PasswordReset,
    EmailVerification,
    MfaChallenge,
}

/// Signed payload fields.
///
/// `role` is present on access tokens only.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Access/refresh pair returned on successful authentication.
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
