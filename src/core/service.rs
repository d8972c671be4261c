//! Storage seam for record types

use crate::core::error::StoreResult;
use crate::core::query::Filters;
use crate::core::record::Record;
use async_trait::async_trait;
use serde_json::Value;

/// Backend trait for persisting records of one type
///
/// Implementations only move rows in and out; stamping timestamps, merging
/// partial updates and raising not-found errors is the job of
/// [`Repository`](crate::core::repository::Repository), so every backend
/// behaves the same from the caller's side.
#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    /// Persist a new record, assigning its primary key
    ///
    /// Fails with `EntityError::AlreadyExists` when a unique field clashes.
    async fn insert(&self, record: T) -> StoreResult<T>;

    /// Fetch by primary key
    async fn fetch(&self, id: i64) -> StoreResult<Option<T>>;

    /// All records matching every filter clause, ordered by id
    async fn fetch_all(&self, filters: &Filters) -> StoreResult<Vec<T>>;

    /// Records whose `column` value is one of `ids`, ordered by id
    async fn fetch_in(&self, column: &str, ids: &[Value]) -> StoreResult<Vec<T>>;

    /// Overwrite an existing record; `None` if its id is unknown
    async fn replace(&self, record: T) -> StoreResult<Option<T>>;

    /// Remove by primary key; `false` if nothing was removed
    async fn remove(&self, id: i64) -> StoreResult<bool>;
}

