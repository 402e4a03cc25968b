use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::User;

/// Authorization header keyword for token credentials
pub const TOKEN_KEYWORD: &str = "Token";

/// External identity collaborator.
///
/// Token issuance and user management live outside the recipe API; the
/// handlers only need to resolve a presented key to a user and to check
/// that an author id refers to somebody.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a raw token key, `None` when no token matches
    async fn user_for_token(&self, key: &str) -> Result<Option<User>, DatabaseError>;

    async fn user_exists(&self, user_id: i64) -> Result<bool, DatabaseError>;
}

/// Reasons a request fails token authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,
    #[error("Invalid token header. No credentials provided.")]
    EmptyToken,
    #[error("Invalid token header. Token string should not contain spaces.")]
    TokenContainsSpaces,
    #[error("Invalid token header. Token string should not contain invalid characters.")]
    InvalidCharacters,
    #[error("Invalid token.")]
    InvalidToken,
    #[error("User inactive or deleted.")]
    InactiveUser,
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Pull the token key out of an `Authorization` header value.
///
/// A header using some other scheme counts as no credentials at all, so a
/// `Bearer` header is rejected the same way as a missing one.
pub fn parse_token_header(header: Option<&[u8]>) -> Result<String, AuthError> {
    let raw = header.ok_or(AuthError::MissingCredentials)?;
    let value = std::str::from_utf8(raw).map_err(|_| AuthError::InvalidCharacters)?;

    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case(TOKEN_KEYWORD) => {}
        _ => return Err(AuthError::MissingCredentials),
    }

    let key = parts.next().ok_or(AuthError::EmptyToken)?;
    if parts.next().is_some() {
        return Err(AuthError::TokenContainsSpaces);
    }

    Ok(key.to_string())
}

/// Fresh random token key, handed to the user exactly once
pub fn generate_token_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Digest stored in place of the raw key
pub fn token_digest(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// A newly issued token and the user it belongs to
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedToken {
    pub user_id: i64,
    pub username: String,
    pub key: String,
}
