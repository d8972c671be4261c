//! # Storefront
//!
//! Accounts, payment methods and catalog products behind a generic
//! repository, with bearer-token authentication.
//!
//! ## Features
//!
//! - **Generic Repository**: one `Repository<T>` gives every record type
//!   create / get / partial update / filtered list / delete / soft delete
//! - **Uniform Not-Found**: every missed lookup is the same typed error naming the type
//! - **Automatic Timestamps**: created_at and updated_at managed by the repository
//! - **Pluggable Backends**: in-memory, PostgreSQL, LMDB and MongoDB behind two traits
//! - **Bearer Tokens**: HMAC-signed JWTs, bcrypt passwords and an admin gate
//! - **Typed Errors**: every error knows its HTTP status and renders as a JSON body
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use storefront::prelude::*;
//!
//! let settings = Settings::from_env()?;
//! storefront::telemetry::init(&settings.logging);
//!
//! let state = AppState::connect(settings).await?;
//!
//! // Register and log in
//! state.account_service().register(new_account).await?;
//! let token = state.credentials.login("alice", "s3cret").await?;
//!
//! // Resolve the caller of a later request
//! let caller = state.credentials.resolve_identity(&token.access_token).await?;
//! let profile = state.account_service().profile(&caller).await?;
//! ```

pub mod auth;
pub mod config;
pub mod core;
pub mod entities;
pub mod services;
pub mod state;
pub mod storage;
pub mod telemetry;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        document::{Document, DocumentStore},
        query::Filters,
        record::Record,
        repository::Repository,
        service::RecordStore,
    };

    // === Errors ===
    pub use crate::core::error::{
        AuthError, ConfigError, EntityError, ErrorResponse, StorageError, StoreError,
        StoreResult, ValidationError,
    };

    // === Macros ===
    pub use crate::impl_record;

    // === Entities ===
    pub use crate::entities::{
        Account, AccountProfile, AccountView, NewAccount, NewPaymentMethod, NewProduct,
        PaymentMethod, PaymentMethodView, PaymentWithOwner, Product,
    };

    // === Auth ===
    pub use crate::auth::{
        AccessToken, Claims, CredentialService, MAX_TOKEN_TTL_MINUTES, PasswordHasher,
        TokenService, bearer_token, require_admin,
    };

    // === Services ===
    pub use crate::services::{AccountService, CatalogService, PaymentService};

    // === Storage ===
    pub use crate::storage::{InMemoryDocumentStore, InMemoryRecordStore};
    #[cfg(feature = "lmdb")]
    pub use crate::storage::LmdbRecordStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoDocumentStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresRecordStore;

    // === Config & State ===
    pub use crate::config::{
        AuthConfig, DatabaseConfig, DocumentStoreConfig, LoggingConfig, Settings, TlsConfig,
    };
    pub use crate::state::AppState;

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, NaiveDateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
}
