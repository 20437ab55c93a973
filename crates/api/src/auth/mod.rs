//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- locally issued HS256 session and service tokens.
//! - [`key_cache`] -- signing-key cache for federated tokens, with an
//!   injectable clock and optional expiry.
//! - [`federated`] -- verification of identity-provider (RS256) tokens.

pub mod federated;
pub mod jwt;
pub mod key_cache;
pub mod password;

/// Why a caller could not be authenticated.
///
/// Every variant surfaces as HTTP 401; the distinction only exists for the
/// response code and the logs.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Could not load signing keys: {0}")]
    KeyFetch(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(err.to_string()),
        }
    }
}
