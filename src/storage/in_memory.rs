//! In-memory record and document stores for testing and development

use crate::core::document::{Document, DocumentStore};
use crate::core::error::{EntityError, StoreError, StoreResult};
use crate::core::query::{Filters, value_in};
use crate::core::record::{Record, unique_clash};
use crate::core::service::RecordStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

fn lock_poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::Internal(format!("Failed to acquire lock: {}", e))
}

// ---------------------------------------------------------------------------
// InMemoryRecordStore
// ---------------------------------------------------------------------------

struct Rows<T> {
    next_id: i64,
    by_id: BTreeMap<i64, T>,
}

/// In-memory record store
///
/// Rows live in a `BTreeMap` keyed by id, so listings come back in id order
/// like the relational backends. Ids start at 1 and are never reused.
pub struct InMemoryRecordStore<T: Record> {
    rows: Arc<RwLock<Rows<T>>>,
}

impl<T: Record> InMemoryRecordStore<T> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Rows {
                next_id: 1,
                by_id: BTreeMap::new(),
            })),
        }
    }

    fn select(&self, keep: impl Fn(&Value) -> bool) -> StoreResult<Vec<T>> {
        let rows = self.rows.read().map_err(lock_poisoned)?;
        let mut out = Vec::new();
        for record in rows.by_id.values() {
            let row = serde_json::to_value(record)
                .map_err(|e| StoreError::Internal(format!("stored row does not encode: {}", e)))?;
            if keep(&row) {
                out.push(record.clone());
            }
        }
        Ok(out)
    }

    fn check_unique<'a>(record: &T, others: impl Iterator<Item = &'a T>) -> StoreResult<()> {
        for other in others {
            if let Some((field, value)) = unique_clash(record, other) {
                return Err(EntityError::AlreadyExists {
                    entity_type: T::TYPE_NAME.to_string(),
                    detail: format!("{} '{}' is taken", field, value),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl<T: Record> Default for InMemoryRecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Clone for InMemoryRecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for InMemoryRecordStore<T> {
    async fn insert(&self, mut record: T) -> StoreResult<T> {
        let mut rows = self.rows.write().map_err(lock_poisoned)?;
        Self::check_unique(&record, rows.by_id.values())?;

        let id = rows.next_id;
        rows.next_id += 1;
        record.set_id(id);
        rows.by_id.insert(id, record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: i64) -> StoreResult<Option<T>> {
        let rows = self.rows.read().map_err(lock_poisoned)?;
        Ok(rows.by_id.get(&id).cloned())
    }

    async fn fetch_all(&self, filters: &Filters) -> StoreResult<Vec<T>> {
        self.select(|row| filters.matches(row))
    }

    async fn fetch_in(&self, column: &str, ids: &[Value]) -> StoreResult<Vec<T>> {
        self.select(|row| value_in(row, column, ids))
    }

    async fn replace(&self, record: T) -> StoreResult<Option<T>> {
        let Some(id) = record.id() else {
            return Ok(None);
        };
        let mut rows = self.rows.write().map_err(lock_poisoned)?;
        if !rows.by_id.contains_key(&id) {
            return Ok(None);
        }
        Self::check_unique(&record, rows.by_id.values())?;
        rows.by_id.insert(id, record.clone());
        Ok(Some(record))
    }

    async fn remove(&self, id: i64) -> StoreResult<bool> {
        let mut rows = self.rows.write().map_err(lock_poisoned)?;
        Ok(rows.by_id.remove(&id).is_some())
    }
}

// ---------------------------------------------------------------------------
// InMemoryDocumentStore
// ---------------------------------------------------------------------------

/// In-memory document store, listing documents in insertion order
pub struct InMemoryDocumentStore<T: Document> {
    documents: Arc<RwLock<Vec<T>>>,
}

impl<T: Document> InMemoryDocumentStore<T> {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T: Document> Default for InMemoryDocumentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> Clone for InMemoryDocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
        }
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for InMemoryDocumentStore<T> {
    async fn insert(&self, document: T) -> StoreResult<T> {
        let mut documents = self.documents.write().map_err(lock_poisoned)?;
        if documents.iter().any(|d| d.key() == document.key()) {
            return Err(EntityError::AlreadyExists {
                entity_type: T::TYPE_NAME.to_string(),
                detail: format!("{} '{}' is taken", T::KEY_FIELD, document.key()),
            }
            .into());
        }
        documents.push(document.clone());
        Ok(document)
    }

    async fn find_all(&self) -> StoreResult<Vec<T>> {
        let documents = self.documents.read().map_err(lock_poisoned)?;
        Ok(documents.clone())
    }

    async fn find_by_key(&self, key: &str) -> StoreResult<T> {
        let documents = self.documents.read().map_err(lock_poisoned)?;
        documents
            .iter()
            .find(|d| d.key() == key)
            .cloned()
            .ok_or_else(|| EntityError::not_found(T::TYPE_NAME, key).into())
    }
}
