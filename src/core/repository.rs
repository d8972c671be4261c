//! Generic entity repository
//!
//! [`Repository<T>`] gives every record type the same create / read / update /
//! delete / list operations over any [`RecordStore`] backend:
//!
//! - `create` stamps `created_at` and `updated_at`
//! - `update` overwrites only the supplied fields and stamps `updated_at`
//! - every lookup that misses fails with the same `EntityError::NotFound`
//!   naming `T::TYPE_NAME`
//! - backend failures pass through unchanged

use crate::core::error::{EntityError, StoreError, StoreResult, ValidationError};
use crate::core::query::Filters;
use crate::core::record::Record;
use crate::core::service::RecordStore;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Typed CRUD operations for one record type
///
/// Cheap to clone; clones share the underlying store.
pub struct Repository<T: Record> {
    store: Arc<dyn RecordStore<T>>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore<T>>) -> Self {
        Self { store }
    }

    /// Wrap a concrete store
    pub fn from_store<S: RecordStore<T> + 'static>(store: S) -> Self {
        Self::new(Arc::new(store))
    }

    /// Persist a new record, stamping its creation and update timestamps
    pub async fn create(&self, mut record: T) -> StoreResult<T> {
        let now = Utc::now();
        record.stamp_created(now);
        record.stamp_updated(now);

        let stored = self.store.insert(record).await?;
        tracing::debug!(entity_type = T::TYPE_NAME, id = ?stored.id(), "created record");
        Ok(stored)
    }

    /// Fetch by primary key or fail with not-found
    pub async fn get_or_fail(&self, id: i64) -> StoreResult<T> {
        match self.store.fetch(id).await? {
            Some(record) => Ok(record),
            None => Err(Self::not_found(id)),
        }
    }

    /// Apply a partial update
    ///
    /// `data` must be a JSON object holding the record's `"id"`. Every other
    /// key overwrites the field of the same name; fields not mentioned keep
    /// their stored value.
    pub async fn update(&self, data: Value) -> StoreResult<T> {
        let Value::Object(patch) = data else {
            return Err(ValidationError::InvalidJson {
                message: format!("{} update must be a JSON object", T::TYPE_NAME),
            }
            .into());
        };

        let id = patch
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| ValidationError::MissingArgument {
                argument: "id".to_string(),
            })?;

        if let Some(field) = patch.keys().find(|k| !T::has_field(k)) {
            return Err(ValidationError::UnknownField {
                entity_type: T::TYPE_NAME.to_string(),
                field: field.clone(),
            }
            .into());
        }

        let existing = self.get_or_fail(id).await?;
        let merged = merge(existing, patch)?;
        self.persist(merged).await
    }

    /// Overwrite a whole record, stamping its update timestamp
    pub async fn save(&self, record: T) -> StoreResult<T> {
        let Some(id) = record.id() else {
            return Err(ValidationError::MissingArgument {
                argument: "id".to_string(),
            }
            .into());
        };
        self.get_or_fail(id).await?;
        self.persist(record).await
    }

    /// All records matching every filter clause
    pub async fn list_all(&self, filters: Filters) -> StoreResult<Vec<T>> {
        filters.validate::<T>()?;
        self.store.fetch_all(&filters).await
    }

    /// Remove a record
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        if !self.store.remove(id).await? {
            return Err(Self::not_found(id));
        }
        tracing::debug!(entity_type = T::TYPE_NAME, id, "deleted record");
        Ok(())
    }

    /// Mark a record deleted by stamping `deleted_at` instead of removing it
    pub async fn soft_delete(&self, id: i64) -> StoreResult<T> {
        let mut record = self.get_or_fail(id).await?;
        if !record.stamp_deleted(Utc::now()) {
            return Err(EntityError::OperationFailed {
                entity_type: T::TYPE_NAME.to_string(),
                operation: "soft delete".to_string(),
                message: "type has no deleted_at field".to_string(),
            }
            .into());
        }
        let stored = self.replace_or_fail(id, record).await?;
        tracing::debug!(entity_type = T::TYPE_NAME, id, "soft-deleted record");
        Ok(stored)
    }

    /// Records whose `column` holds one of `ids`
    pub async fn list_by_key_in<V>(&self, column: &str, ids: &[V]) -> StoreResult<Vec<T>>
    where
        V: Clone + Into<Value>,
    {
        if !T::has_field(column) {
            return Err(ValidationError::UnknownField {
                entity_type: T::TYPE_NAME.to_string(),
                field: column.to_string(),
            }
            .into());
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Value> = ids.iter().cloned().map(Into::into).collect();
        self.store.fetch_in(column, &ids).await
    }

    async fn persist(&self, mut record: T) -> StoreResult<T> {
        let id = record
            .id()
            .ok_or_else(|| ValidationError::MissingArgument {
                argument: "id".to_string(),
            })?;
        record.stamp_updated(Utc::now());
        let stored = self.replace_or_fail(id, record).await?;
        tracing::debug!(entity_type = T::TYPE_NAME, id, "updated record");
        Ok(stored)
    }

    async fn replace_or_fail(&self, id: i64, record: T) -> StoreResult<T> {
        self.store
            .replace(record)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    fn not_found(id: i64) -> StoreError {
        tracing::warn!(entity_type = T::TYPE_NAME, id, "{} not found", T::TYPE_NAME);
        EntityError::not_found(T::TYPE_NAME, id).into()
    }
}

/// Overlay `patch` onto the serialized form of `existing`
fn merge<T: Record>(existing: T, patch: Map<String, Value>) -> StoreResult<T> {
    let mut current = match serde_json::to_value(existing)? {
        Value::Object(map) => map,
        _ => {
            return Err(ValidationError::InvalidJson {
                message: format!("{} does not serialize to an object", T::TYPE_NAME),
            }
            .into());
        }
    };
    for (field, value) in patch {
        current.insert(field, value);
    }
    serde_json::from_value(Value::Object(current)).map_err(|e| {
        ValidationError::FieldError {
            field: T::TYPE_NAME.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRecordStore;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        id: Option<i64>,
        title: String,
        body: String,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    }

    crate::impl_record! {
        Note => "Note", table "notes",
        fields [id, title, body, created_at, updated_at],
        unique [title],
        created created_at,
        updated updated_at,
    }

    fn note(title: &str) -> Note {
        Note {
            id: None,
            title: title.to_string(),
            body: "body".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct Voucher {
        id: Option<i64>,
        code: String,
        created_at: Option<DateTime<Utc>>,
        deleted_at: Option<DateTime<Utc>>,
    }

    crate::impl_record! {
        Voucher => "Voucher", table "vouchers",
        fields [id, code, created_at, deleted_at],
        unique [code],
        created created_at,
        deleted deleted_at,
    }

    fn repo() -> Repository<Note> {
        Repository::from_store(InMemoryRecordStore::<Note>::new())
    }

    #[tokio::test]
    async fn test_create_stamps_both_timestamps() {
        let created = repo().create(note("a")).await.unwrap();
        assert!(created.id.is_some());
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_non_object() {
        let err = repo().update(json!([1, 2])).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::InvalidJson { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let err = repo().update(json!({"title": "b"})).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::MissingArgument { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_field() {
        let repo = repo();
        let created = repo.create(note("a")).await.unwrap();
        let err = repo
            .update(json!({"id": created.id, "colour": "red"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::UnknownField { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_with_wrong_type_is_validation_error() {
        let repo = repo();
        let created = repo.create(note("a")).await.unwrap();
        let err = repo
            .update(json!({"id": created.id, "title": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_unsupported_type() {
        let repo = repo();
        let created = repo.create(note("a")).await.unwrap();
        let err = repo.soft_delete(created.id.unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Entity(EntityError::OperationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_stamps_and_keeps_record() {
        let vouchers = Repository::from_store(InMemoryRecordStore::<Voucher>::new());
        let created = vouchers
            .create(Voucher {
                id: None,
                code: "SPRING10".to_string(),
                created_at: None,
                deleted_at: None,
            })
            .await
            .unwrap();
        let id = created.id.unwrap();
        assert!(created.deleted_at.is_none());

        let deleted = vouchers.soft_delete(id).await.unwrap();
        assert!(deleted.deleted_at.is_some());
        assert_eq!(deleted.code, "SPRING10");
        assert_eq!(deleted.created_at, created.created_at);

        let fetched = vouchers.get_or_fail(id).await.unwrap();
        assert_eq!(fetched.deleted_at, deleted.deleted_at);
        assert_eq!(vouchers.list_all(Filters::new()).await.unwrap().len(), 1);

        assert!(vouchers.soft_delete(id + 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_by_key_in_empty_ids() {
        let repo = repo();
        repo.create(note("a")).await.unwrap();
        let none: Vec<i64> = Vec::new();
        assert!(repo.list_by_key_in("id", &none).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_unknown_id_is_not_found() {
        let mut ghost = note("ghost");
        ghost.id = Some(41);
        let err = repo().save(ghost).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
