//! Credentials: password hashing, bearer tokens and identity resolution

pub mod password;
pub mod service;
pub mod token;

pub use password::PasswordHasher;
pub use service::{AccessToken, CredentialService, require_admin};
pub use token::{Claims, DEFAULT_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES, TokenService};

use crate::core::error::{AuthError, StoreResult};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// The token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively. A missing header, another
/// scheme or an empty token is `InvalidCredentials`.
pub fn bearer_token(headers: &HeaderMap) -> StoreResult<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidCredentials.into())
}
