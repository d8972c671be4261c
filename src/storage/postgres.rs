//! PostgreSQL storage backend using sqlx.
//!
//! Provides `PostgresRecordStore<T>`, a `RecordStore` over one table per
//! record type, backed by a `sqlx::PgPool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! storefront-rs = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! Tables are created by the migrations under `migrations/` (see
//! [`migrate`]). Each table has a `BIGSERIAL id` and one column per
//! record field, named exactly like the serialized field.
//!
//! # Row mapping
//!
//! Records cross the wire as JSONB, so one implementation serves every
//! record type:
//! - writes go through `jsonb_populate_record(NULL::table, $1)`
//! - reads come back as `to_jsonb(t)` and are deserialized into `T`
//! - equality filters use JSONB containment (`to_jsonb(t) @> $1`)

use crate::config::DatabaseConfig;
use crate::core::error::{EntityError, StorageError, StoreError, StoreResult};
use crate::core::query::Filters;
use crate::core::record::Record;
use crate::core::service::RecordStore;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::marker::PhantomData;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Pool and schema management
// ---------------------------------------------------------------------------

/// Open a connection pool for `config`
///
/// Connections are recycled after `pool_recycle_secs` so the server never
/// sees a connection older than that.
pub async fn connect(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .max_lifetime(Duration::from_secs(config.pool_recycle_secs))
        .connect(&config.connection_string())
        .await
        .map_err(|e| {
            StoreError::Storage(StorageError::ConnectionError {
                backend: "PostgreSQL".to_string(),
                message: e.to_string(),
            })
        })?;

    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.name,
        "connected to PostgreSQL"
    );
    Ok(pool)
}

/// Apply the bundled migrations (idempotent).
///
/// Safe to call on every startup.
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        StoreError::Storage(StorageError::QueryError {
            backend: "PostgreSQL".to_string(),
            message: format!("migration failed: {}", e),
        })
    })
}

// ---------------------------------------------------------------------------
// PostgresRecordStore<T>
// ---------------------------------------------------------------------------

/// Record store backed by the PostgreSQL table `T::TABLE`
///
/// # Example
///
/// ```rust,ignore
/// use storefront::storage::postgres::{self, PostgresRecordStore};
///
/// let pool = postgres::connect(&settings.database).await?;
/// postgres::migrate(&pool).await?;
/// let accounts = Repository::from_store(PostgresRecordStore::<Account>::new(pool));
/// ```
#[derive(Debug)]
pub struct PostgresRecordStore<T> {
    pool: PgPool,
    _marker: PhantomData<T>,
}

impl<T> Clone for PostgresRecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PostgresRecordStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<T: Record> PostgresRecordStore<T> {
    /// Quoted, comma separated data columns (everything but `id`)
    fn column_list() -> String {
        T::data_fields()
            .iter()
            .map(|f| format!("\"{}\"", f))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn decode(row: Value) -> StoreResult<T> {
        serde_json::from_value(row).map_err(|e| StorageError::undecodable("PostgreSQL", e).into())
    }

    fn decode_all(rows: Vec<Value>) -> StoreResult<Vec<T>> {
        rows.into_iter().map(Self::decode).collect()
    }

    /// Translate constraint violations into domain errors
    fn classify(err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return EntityError::AlreadyExists {
                    entity_type: T::TYPE_NAME.to_string(),
                    detail: db.message().to_string(),
                }
                .into();
            }
            if db.is_foreign_key_violation() {
                return StorageError::IntegrityError {
                    message: db.message().to_string(),
                }
                .into();
            }
        }
        err.into()
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for PostgresRecordStore<T> {
    async fn insert(&self, record: T) -> StoreResult<T> {
        let columns = Self::column_list();
        let sql = format!(
            "INSERT INTO {table} AS t ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING to_jsonb(t)",
            table = T::TABLE,
            columns = columns,
        );

        let row: Value = sqlx::query_scalar(&sql)
            .bind(serde_json::to_value(&record)?)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::classify)?;

        Self::decode(row)
    }

    async fn fetch(&self, id: i64) -> StoreResult<Option<T>> {
        let sql = format!("SELECT to_jsonb(t) FROM {} t WHERE t.id = $1", T::TABLE);

        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::decode).transpose()
    }

    async fn fetch_all(&self, filters: &Filters) -> StoreResult<Vec<T>> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t WHERE to_jsonb(t) @> $1 ORDER BY t.id",
            T::TABLE
        );

        let rows: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(filters.to_object())
            .fetch_all(&self.pool)
            .await?;

        Self::decode_all(rows)
    }

    async fn fetch_in(&self, column: &str, ids: &[Value]) -> StoreResult<Vec<T>> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t \
             WHERE $2 @> jsonb_build_array(to_jsonb(t) -> $1) ORDER BY t.id",
            T::TABLE
        );

        let rows: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(column)
            .bind(Value::Array(ids.to_vec()))
            .fetch_all(&self.pool)
            .await?;

        Self::decode_all(rows)
    }

    async fn replace(&self, record: T) -> StoreResult<Option<T>> {
        let Some(id) = record.id() else {
            return Ok(None);
        };
        let columns = Self::column_list();
        let sql = format!(
            "UPDATE {table} AS t SET ({columns}) = \
             (SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)) \
             WHERE t.id = $2 RETURNING to_jsonb(t)",
            table = T::TABLE,
            columns = columns,
        );

        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(serde_json::to_value(&record)?)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::classify)?;

        row.map(Self::decode).transpose()
    }

    async fn remove(&self, id: i64) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }
}
