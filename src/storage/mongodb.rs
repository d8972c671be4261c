//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides `MongoDocumentStore<T>`, a `DocumentStore` backed by a MongoDB
//! database via `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! storefront-rs = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One collection per document type, named `T::COLLECTION`. Documents keep
//! their business key as a regular field with a unique index on it
//! ([`MongoDocumentStore::ensure_indexes`]); MongoDB's own `_id` is left to
//! the server and never surfaces in the domain type.
//!
//! # Serialization strategy
//!
//! Documents are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents, so timestamps are stored as ISO 8601
//! strings exactly as they serialize everywhere else.

use crate::config::DocumentStoreConfig;
use crate::core::document::{Document, DocumentStore};
use crate::core::error::{EntityError, StorageError, StoreError, StoreResult, ValidationError};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document as BsonDocument, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::marker::PhantomData;

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

// ---------------------------------------------------------------------------
// Connection and conversion helpers
// ---------------------------------------------------------------------------

/// Connect to the document store and select its database
pub async fn connect(config: &DocumentStoreConfig) -> StoreResult<Database> {
    let client = Client::with_uri_str(&config.uri).await.map_err(|e| {
        StoreError::Storage(StorageError::ConnectionError {
            backend: "MongoDB".to_string(),
            message: e.to_string(),
        })
    })?;

    tracing::info!(database = %config.database, "connected to MongoDB");
    Ok(client.database(&config.database))
}

/// Convert a serde_json::Value (expected to be an Object) into a BSON document.
fn json_to_document(json: serde_json::Value) -> StoreResult<BsonDocument> {
    let bson_val = mongodb::bson::to_bson(&json).map_err(|e| ValidationError::InvalidJson {
        message: format!("Failed to convert JSON to BSON: {}", e),
    })?;

    match bson_val {
        Bson::Document(d) => Ok(d),
        _ => Err(ValidationError::InvalidJson {
            message: "Expected BSON document, got non-object".to_string(),
        }
        .into()),
    }
}

/// Convert a BSON document back into a serde_json::Value, dropping the
/// server-assigned `_id`.
fn document_to_json(mut doc: BsonDocument) -> serde_json::Value {
    doc.remove("_id");
    Bson::Document(doc).into_relaxed_extjson()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == DUPLICATE_KEY
    )
}

// ---------------------------------------------------------------------------
// MongoDocumentStore<T>
// ---------------------------------------------------------------------------

/// Document store backed by the MongoDB collection `T::COLLECTION`
///
/// # Example
///
/// ```rust,ignore
/// use storefront::storage::mongodb::{self, MongoDocumentStore};
///
/// let db = mongodb::connect(&settings.document_store).await?;
/// let products = MongoDocumentStore::<Product>::new(db);
/// products.ensure_indexes().await?;
/// ```
#[derive(Debug)]
pub struct MongoDocumentStore<T> {
    database: Database,
    _marker: PhantomData<T>,
}

impl<T> Clone for MongoDocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> MongoDocumentStore<T> {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: PhantomData,
        }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl<T: Document> MongoDocumentStore<T> {
    fn collection(&self) -> Collection<BsonDocument> {
        self.database.collection(T::COLLECTION)
    }

    /// Create the unique index on the business key (idempotent)
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { T::KEY_FIELD: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection().create_index(index).await?;
        tracing::debug!(collection = T::COLLECTION, key = T::KEY_FIELD, "ensured unique index");
        Ok(())
    }

    fn to_document(document: &T) -> StoreResult<BsonDocument> {
        json_to_document(serde_json::to_value(document)?)
    }

    fn from_document(doc: BsonDocument) -> StoreResult<T> {
        serde_json::from_value(document_to_json(doc))
            .map_err(|e| StorageError::undecodable("MongoDB", e).into())
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for MongoDocumentStore<T> {
    async fn insert(&self, document: T) -> StoreResult<T> {
        let doc = Self::to_document(&document)?;

        match self.collection().insert_one(doc).await {
            Ok(_) => Ok(document),
            Err(e) if is_duplicate_key(&e) => Err(EntityError::AlreadyExists {
                entity_type: T::TYPE_NAME.to_string(),
                detail: format!("{} '{}' is taken", T::KEY_FIELD, document.key()),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_all(&self) -> StoreResult<Vec<T>> {
        let cursor = self.collection().find(doc! {}).await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;

        docs.into_iter().map(Self::from_document).collect()
    }

    async fn find_by_key(&self, key: &str) -> StoreResult<T> {
        let found = self
            .collection()
            .find_one(doc! { T::KEY_FIELD: key })
            .await?;

        match found {
            Some(doc) => Self::from_document(doc),
            None => Err(EntityError::not_found(T::TYPE_NAME, key).into()),
        }
    }
}
