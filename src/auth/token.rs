//! JWT issuing and validation

use crate::config::AuthConfig;
use crate::core::error::{ConfigError, StoreError, StoreResult};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Default lifetime of an issued token
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

/// Longest lifetime settings may configure (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Signed claim set
///
/// `sub` names the account handle. Any other claims ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiry as unix seconds; set by [`TokenService::issue_token`]
    #[serde(default)]
    pub exp: i64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Claims {
    pub fn for_subject(sub: impl Into<String>) -> Self {
        Self {
            sub: Some(sub.into()),
            ..Self::default()
        }
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Why a token was rejected
///
/// Only for logging; callers outside this crate see `InvalidCredentials`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature does not verify")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token has no subject")]
    MissingSubject,
    #[error("token algorithm not accepted")]
    Unsupported,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::Unsupported
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Map an algorithm name to one of the HMAC algorithms
pub fn parse_algorithm(name: &str) -> StoreResult<Algorithm> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::InvalidValue {
            field: "auth.algorithm".to_string(),
            value: other.to_string(),
            message: "expected HS256, HS384 or HS512".to_string(),
        }
        .into()),
    }
}

/// Issues and verifies HMAC-signed tokens
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Service signing with `secret` under the named algorithm, issuing
    /// 15-minute tokens by default
    pub fn new(secret: &str, algorithm: &str) -> StoreResult<Self> {
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: parse_algorithm(algorithm)?,
            default_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        })
    }

    pub fn from_config(config: &AuthConfig) -> StoreResult<Self> {
        Ok(Self::new(&config.secret_key, &config.algorithm)?.with_default_ttl(config.token_ttl()?))
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a copy of `claims` expiring `ttl` from now (default ttl if `None`)
    pub fn issue_token(&self, claims: &Claims, ttl: Option<Duration>) -> StoreResult<String> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            StoreError::Internal(format!("token lifetime of {} overflows", ttl))
        })?;

        let mut claims = claims.clone();
        claims.exp = expires.timestamp();

        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| StoreError::Internal(format!("failed to sign token: {}", e)))?;

        tracing::debug!(sub = ?claims.sub, exp = claims.exp, "issued token");
        Ok(token)
    }

    /// Verify signature, algorithm and expiry, and require a subject
    pub(crate) fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)?;
        match data.claims.sub.as_deref() {
            Some(sub) if !sub.is_empty() => Ok(data.claims),
            _ => Err(TokenError::MissingSubject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-key-12345", "HS256").unwrap()
    }

    #[test]
    fn test_issue_and_decode() {
        let token = service()
            .issue_token(&Claims::for_subject("alice").with_claim("scope", "shop"), None)
            .unwrap();
        let claims = service().decode(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("alice"));
        assert_eq!(claims.extra.get("scope"), Some(&Value::from("shop")));
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_default_ttl_is_fifteen_minutes() {
        let before = Utc::now().timestamp();
        let token = service().issue_token(&Claims::for_subject("a"), None).unwrap();
        let exp = service().decode(&token).unwrap().exp;
        assert!(exp >= before + 15 * 60 && exp <= before + 15 * 60 + 5);
    }

    #[test]
    fn test_expired_token() {
        let token = service()
            .issue_token(&Claims::for_subject("alice"), Some(Duration::seconds(-60)))
            .unwrap();
        assert_eq!(service().decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_overflowing_ttl_is_error() {
        let huge = Duration::try_minutes(10_000_000_000_000).unwrap();
        let err = service()
            .issue_token(&Claims::for_subject("a"), Some(huge))
            .unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));

        let err = service()
            .with_default_ttl(Duration::MAX)
            .issue_token(&Claims::for_subject("a"), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }

    #[test]
    fn test_wrong_secret() {
        let other = TokenService::new("another-secret", "HS256").unwrap();
        let token = other.issue_token(&Claims::for_subject("alice"), None).unwrap();
        assert_eq!(service().decode(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_algorithm_is_pinned() {
        let other = TokenService::new("test-secret-key-12345", "HS512").unwrap();
        let token = other.issue_token(&Claims::for_subject("alice"), None).unwrap();
        assert_eq!(service().decode(&token), Err(TokenError::Unsupported));
    }

    #[test]
    fn test_missing_subject() {
        let token = service().issue_token(&Claims::default(), None).unwrap();
        assert_eq!(service().decode(&token), Err(TokenError::MissingSubject));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(service().decode("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(service().decode(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_unsupported_algorithm_name() {
        let err = TokenService::new("secret", "RS256").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Config(ConfigError::InvalidValue { .. })
        ));
    }
}
