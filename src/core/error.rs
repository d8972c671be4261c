//! Typed error handling for storefront
//!
//! Every failure a repository, document store or credential check can raise is
//! one of the categories below. Each category knows the HTTP status an endpoint
//! should answer with, so callers can return a [`StoreError`] straight from an
//! axum handler.
//!
//! # Error Categories
//!
//! - [`EntityError`]: lookups that miss, uniqueness clashes, unsupported operations
//! - [`AuthError`]: invalid credentials and missing privileges
//! - [`ConfigError`]: settings that cannot be loaded or are invalid
//! - [`ValidationError`]: malformed input handed to the repository
//! - [`StorageError`]: anything the backing store reports that is not one of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront::prelude::*;
//!
//! async fn owner(accounts: &Repository<Account>, id: i64) -> Response {
//!     match accounts.get_or_fail(id).await {
//!         Ok(account) => Json(AccountView::from(account)).into_response(),
//!         Err(err) if err.is_not_found() => {
//!             tracing::info!(id, "owner lookup missed");
//!             err.into_response()
//!         }
//!         Err(err) => err.into_response(),
//!     }
//! }
//! ```

use axum::Json;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for storefront operations
#[derive(Debug)]
pub enum StoreError {
    /// Record/document errors (lookups, uniqueness)
    Entity(EntityError),

    /// Credential and privilege errors
    Auth(AuthError),

    /// Configuration errors
    Config(ConfigError),

    /// Input validation errors
    Validation(ValidationError),

    /// Backend errors passed through unchanged
    Storage(StorageError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Entity(e) => write!(f, "{}", e),
            StoreError::Auth(e) => write!(f, "{}", e),
            StoreError::Config(e) => write!(f, "{}", e),
            StoreError::Validation(e) => write!(f, "{}", e),
            StoreError::Storage(e) => write!(f, "{}", e),
            StoreError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Entity(e) => Some(e),
            StoreError::Auth(e) => Some(e),
            StoreError::Config(e) => Some(e),
            StoreError::Validation(e) => Some(e),
            StoreError::Storage(e) => Some(e),
            StoreError::Internal(_) => None,
        }
    }
}

/// JSON body of an error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code, e.g. `ENTITY_NOT_FOUND`
    pub code: String,
    pub message: String,
    /// The fields that identify what failed, when there are any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl StoreError {
    /// Status an endpoint should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Entity(e) => e.status_code(),
            StoreError::Auth(e) => e.status_code(),
            StoreError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Entity(e) => e.error_code(),
            StoreError::Auth(e) => e.error_code(),
            StoreError::Config(_) => "CONFIG_ERROR",
            StoreError::Validation(_) => "VALIDATION_ERROR",
            StoreError::Storage(_) => "STORAGE_ERROR",
            StoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Body for the error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// True when this is the "record does not exist" signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Entity(EntityError::NotFound { .. }))
    }

    /// True when this is a uniqueness clash
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Entity(EntityError::AlreadyExists { .. }))
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            StoreError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id
                }))
            }
            StoreError::Entity(EntityError::AlreadyExists {
                entity_type,
                detail,
            }) => Some(serde_json::json!({
                "entity_type": entity_type,
                "detail": detail
            })),
            StoreError::Validation(ValidationError::UnknownField { entity_type, field }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "field": field
                }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let challenge = matches!(self, StoreError::Auth(AuthError::InvalidCredentials));
        let body = Json(self.to_response());
        let mut response = (status, body).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to records and documents
#[derive(Debug)]
pub enum EntityError {
    /// Lookup by identifier found nothing
    NotFound { entity_type: String, id: String },

    /// A unique field already holds this value
    AlreadyExists { entity_type: String, detail: String },

    /// The record type does not support the requested operation
    OperationFailed {
        entity_type: String,
        operation: String,
        message: String,
    },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotFound { entity_type, id } => {
                write!(f, "{} with id '{}' not found", entity_type, id)
            }
            EntityError::AlreadyExists {
                entity_type,
                detail,
            } => {
                write!(f, "{} already exists: {}", entity_type, detail)
            }
            EntityError::OperationFailed {
                entity_type,
                operation,
                message,
            } => {
                write!(f, "Failed to {} {}: {}", operation, entity_type, message)
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl EntityError {
    pub fn not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        EntityError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::AlreadyExists { .. } => StatusCode::CONFLICT,
            EntityError::OperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::AlreadyExists { .. } => "ENTITY_ALREADY_EXISTS",
            EntityError::OperationFailed { .. } => "ENTITY_OPERATION_FAILED",
        }
    }
}

impl From<EntityError> for StoreError {
    fn from(err: EntityError) -> Self {
        StoreError::Entity(err)
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Errors raised by the credential checks
///
/// `InvalidCredentials` deliberately carries no cause: a bad signature, an
/// expired token, a missing subject and an unknown handle all look the same
/// from the outside.
#[derive(Debug)]
pub enum AuthError {
    /// Token or password could not be validated
    InvalidCredentials,

    /// Authenticated, but lacking the required privilege
    NotAuthorized { message: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Could not validate credentials"),
            AuthError::NotAuthorized { message } => write!(f, "Forbidden: {}", message),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::NotAuthorized { .. } => "NOT_AUTHORIZED",
        }
    }
}

impl From<AuthError> for StoreError {
    fn from(err: AuthError) -> Self {
        StoreError::Auth(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Missing required field in configuration
    MissingField { field: String },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                match file {
                    Some(file) => write!(f, "Cannot parse settings from '{}': {}", file, message),
                    None => write!(f, "Cannot parse settings: {}", message),
                }
            }
            ConfigError::MissingField { field } => {
                write!(f, "Missing required setting '{}'", field)
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for setting '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => {
                write!(f, "Cannot read settings: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for StoreError {
    fn from(err: ConfigError) -> Self {
        StoreError::Config(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Field name does not exist on the record type
    UnknownField { entity_type: String, field: String },

    /// A field holds a value of the wrong shape
    FieldError { field: String, message: String },

    /// Input is not the JSON the operation expects
    InvalidJson { message: String },

    /// A required value (usually an id) was not supplied
    MissingArgument { argument: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownField { entity_type, field } => {
                write!(f, "{} has no field '{}'", entity_type, field)
            }
            ValidationError::FieldError { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Malformed input: {}", message)
            }
            ValidationError::MissingArgument { argument } => {
                write!(f, "Missing {}", argument)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Validation(err)
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(|e| e.code.to_string())
                    .unwrap_or_else(|| "invalid".to_string());
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("input".to_string(), errors.to_string()));
        StoreError::Validation(ValidationError::FieldError { field, message })
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors reported by a storage backend
#[derive(Debug)]
pub enum StorageError {
    /// Could not reach the backend
    ConnectionError { backend: String, message: String },

    /// The backend rejected or failed a query
    QueryError { backend: String, message: String },

    /// A write referenced a row that does not exist
    IntegrityError { message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Cannot reach {}: {}", backend, message)
            }
            StorageError::QueryError { backend, message } => {
                write!(f, "{}: {}", backend, message)
            }
            StorageError::IntegrityError { message } => {
                write!(f, "Referential integrity violated: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    /// A persisted row that no longer maps onto its type
    pub fn undecodable(backend: &str, err: impl fmt::Display) -> Self {
        StorageError::QueryError {
            backend: backend.to_string(),
            message: format!("stored row does not decode: {}", err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::Storage(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        StoreError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Internal(format!("blocking task failed: {}", err))
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Storage(StorageError::QueryError {
            backend: "PostgreSQL".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "mongodb_backend")]
impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Storage(StorageError::QueryError {
            backend: "MongoDB".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "lmdb")]
impl From<heed::Error> for StoreError {
    fn from(err: heed::Error) -> Self {
        StoreError::Storage(StorageError::QueryError {
            backend: "LMDB".to_string(),
            message: err.to_string(),
        })
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for storefront operations
pub type StoreResult<T> = Result<T, StoreError>;
