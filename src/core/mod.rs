//! Core module containing the record model, the repository and the error types

pub mod document;
pub mod error;
pub mod query;
pub mod record;
pub mod repository;
pub mod service;

pub use document::{Document, DocumentStore};
pub use error::{
    AuthError, ConfigError, EntityError, StorageError, StoreError, StoreResult, ValidationError,
};
pub use query::Filters;
pub use record::Record;
pub use repository::Repository;
pub use service::RecordStore;
