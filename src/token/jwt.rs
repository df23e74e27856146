//! HS256 signing and verification for the three-part token format.
//!
//! `verify_hs256` takes the current time as a parameter so expiry handling is
//! deterministic under test.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::Claims;
use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Header {
    alg: String,
    typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(|_| AuthError::TokenInvalidSignature)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, AuthError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| AuthError::TokenInvalidSignature)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::TokenInvalidSignature)
}

fn mac(key: &[u8], signing_input: &[u8]) -> Result<HmacSha256, AuthError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|_| AuthError::TokenInvalidSignature)?;
    mac.update(signing_input);
    Ok(mac)
}

/// Create an HS256 signed token.
///
/// # Errors
///
/// Returns an error if the header or claims cannot be encoded.
pub(crate) fn sign_hs256(key: &[u8], claims: &Claims) -> Result<String, AuthError> {
    let header_b64 = b64e_json(&Header::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature = mac(key, signing_input.as_bytes())?.finalize().into_bytes();
    let signature_b64 = Base64UrlUnpadded::encode_string(&signature);
    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 token and return its decoded claims.
///
/// Signature is checked before anything is decoded from the payload;
/// malformed input of any shape fails as an invalid signature. Expiry is
/// checked against `now_unix_seconds`.
///
/// # Errors
///
/// `TokenInvalidSignature` for malformed or tampered tokens, `TokenExpired`
/// when `exp` has passed.
pub(crate) fn verify_hs256(
    token: &str,
    key: &[u8],
    now_unix_seconds: i64,
) -> Result<Claims, AuthError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(AuthError::TokenInvalidSignature)?;
    let claims_b64 = parts.next().ok_or(AuthError::TokenInvalidSignature)?;
    let sig_b64 = parts.next().ok_or(AuthError::TokenInvalidSignature)?;
    if parts.next().is_some() {
        return Err(AuthError::TokenInvalidSignature);
    }

    let signature =
        Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| AuthError::TokenInvalidSignature)?;
    let signing_input = format!("{header_b64}.{claims_b64}");
    mac(key, signing_input.as_bytes())?
        .verify_slice(&signature)
        .map_err(|_| AuthError::TokenInvalidSignature)?;

    let header: Header = b64d_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(AuthError::TokenInvalidSignature);
    }

    let claims: Claims = b64d_json(claims_b64)?;
    if claims.exp <= now_unix_seconds {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}
