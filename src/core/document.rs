//! Document model: types kept in a document collection under a business key

use crate::core::error::StoreResult;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A type stored as a whole document, identified by a unique business key
/// rather than a store-generated id.
pub trait Document: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Label naming the type in not-found and conflict errors
    const TYPE_NAME: &'static str;

    /// Collection the documents live in
    const COLLECTION: &'static str;

    /// Serialized name of the business key field
    const KEY_FIELD: &'static str;

    /// The business key value
    fn key(&self) -> &str;
}

/// Backend trait for document collections
#[async_trait]
pub trait DocumentStore<T: Document>: Send + Sync {
    /// Store a new document
    ///
    /// Fails with `EntityError::AlreadyExists` if the key is taken; the
    /// stored document is left untouched.
    async fn insert(&self, document: T) -> StoreResult<T>;

    /// Every document in the collection
    async fn find_all(&self) -> StoreResult<Vec<T>>;

    /// Fetch by business key, failing with `EntityError::NotFound`
    async fn find_by_key(&self, key: &str) -> StoreResult<T>;
}
