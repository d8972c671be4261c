//! LMDB storage backend using heed (memory-mapped B-tree).
//!
//! LMDB is an embedded key-value store with no external server, which makes
//! it the file-backed store for development mode. All operations are
//! synchronous (memory-mapped I/O) and are wrapped in
//! `tokio::task::spawn_blocking` for async compatibility.
//!
//! # Databases (named LMDB sub-databases)
//!
//! - one per record type, named `T::TABLE`, keyed by the zero-padded id so
//!   key order is id order
//! - `sequences`: last id handed out per table, so ids are never reused
//!
//! # Serialization
//!
//! Values are stored as JSON bytes via `serde_json`, the same representation
//! the filters are evaluated against.
//!
//! # Feature flag
//!
//! Enable with `--features lmdb`. Requires the `heed` crate.

use crate::core::error::{EntityError, StorageError, StoreError, StoreResult};
use crate::core::query::{Filters, value_in};
use crate::core::record::{Record, unique_clash};
use crate::core::service::RecordStore;
use async_trait::async_trait;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions, RwTxn};
use serde_json::Value;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

const SEQUENCES: &str = "sequences";

// ---------------------------------------------------------------------------
// Environment and serialization helpers
// ---------------------------------------------------------------------------

/// Open (or create) an LMDB environment at `path`.
///
/// One environment is shared by every record store; each store opens its own
/// named database inside it. The map size is a virtual address space
/// reservation, not an allocation.
pub fn open_env(path: impl AsRef<Path>) -> StoreResult<Arc<Env>> {
    std::fs::create_dir_all(path.as_ref())?;

    let env = unsafe {
        EnvOpenOptions::new()
            .map_size(256 * 1024 * 1024)
            .max_dbs(16)
            .max_readers(126)
            .open(path.as_ref())?
    };

    tracing::info!(path = %path.as_ref().display(), "opened LMDB environment");
    Ok(Arc::new(env))
}

fn row_key(id: i64) -> String {
    format!("{:020}", id)
}

fn lmdb_encode<T: serde::Serialize>(item: &T) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(item)?)
}

fn lmdb_decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::undecodable("LMDB", e).into())
}

// ---------------------------------------------------------------------------
// LmdbRecordStore<T>
// ---------------------------------------------------------------------------

/// LMDB-backed implementation of `RecordStore<T>`.
///
/// The `Env` is wrapped in an `Arc` for cheap cloning across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use storefront::storage::lmdb::{self, LmdbRecordStore};
///
/// let env = lmdb::open_env("./data/storefront.lmdb")?;
/// let accounts = Repository::from_store(LmdbRecordStore::<Account>::new(env)?);
/// ```
pub struct LmdbRecordStore<T: Record> {
    env: Arc<Env>,
    db: Database<Str, Bytes>,
    sequences: Database<Str, Str>,
    _marker: PhantomData<T>,
}

impl<T: Record> LmdbRecordStore<T> {
    /// Open the `T::TABLE` database inside `env`, creating it if needed
    pub fn new(env: Arc<Env>) -> StoreResult<Self> {
        let mut wtxn = env.write_txn()?;
        let db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(T::TABLE))?;
        let sequences: Database<Str, Str> = env.create_database(&mut wtxn, Some(SEQUENCES))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            db,
            sequences,
            _marker: PhantomData,
        })
    }

    /// Every row, in id order, as seen by a write transaction
    fn scan(db: Database<Str, Bytes>, txn: &RwTxn) -> StoreResult<Vec<T>> {
        let mut results = Vec::new();
        for item in db.iter(txn)? {
            let (_key, bytes) = item?;
            results.push(lmdb_decode(bytes)?);
        }
        Ok(results)
    }

    /// Rows whose JSON form satisfies `keep`, in id order
    async fn select<F>(&self, keep: F) -> StoreResult<Vec<T>>
    where
        F: Fn(&Value) -> bool + Send + 'static,
    {
        let env = self.env.clone();
        let db = self.db;

        tokio::task::spawn_blocking(move || {
            let rtxn = env.read_txn()?;
            let mut results = Vec::new();
            for item in db.iter(&rtxn)? {
                let (_key, bytes) = item?;
                let row: Value = lmdb_decode(bytes)?;
                if keep(&row) {
                    results.push(
                        serde_json::from_value(row)
                            .map_err(|e| StorageError::undecodable("LMDB", e))?,
                    );
                }
            }
            Ok(results)
        })
        .await?
    }

    fn check_unique(record: &T, existing: &[T]) -> StoreResult<()> {
        match existing.iter().find_map(|other| unique_clash(record, other)) {
            Some((field, value)) => Err(EntityError::AlreadyExists {
                entity_type: T::TYPE_NAME.to_string(),
                detail: format!("{} '{}' is taken", field, value),
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl<T: Record> Clone for LmdbRecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            env: Arc::clone(&self.env),
            db: self.db,
            sequences: self.sequences,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for LmdbRecordStore<T> {
    async fn insert(&self, mut record: T) -> StoreResult<T> {
        let env = self.env.clone();
        let db = self.db;
        let sequences = self.sequences;

        tokio::task::spawn_blocking(move || {
            let mut wtxn = env.write_txn()?;
            Self::check_unique(&record, &Self::scan(db, &wtxn)?)?;

            let last = match sequences.get(&wtxn, T::TABLE)? {
                Some(value) => value.parse::<i64>().map_err(|e| {
                    StoreError::Internal(format!("corrupt sequence for {}: {}", T::TABLE, e))
                })?,
                None => 0,
            };
            let id = last + 1;
            record.set_id(id);

            db.put(&mut wtxn, &row_key(id), &lmdb_encode(&record)?)?;
            sequences.put(&mut wtxn, T::TABLE, &id.to_string())?;
            wtxn.commit()?;
            Ok(record)
        })
        .await?
    }

    async fn fetch(&self, id: i64) -> StoreResult<Option<T>> {
        let env = self.env.clone();
        let db = self.db;

        tokio::task::spawn_blocking(move || {
            let rtxn = env.read_txn()?;
            match db.get(&rtxn, &row_key(id))? {
                Some(bytes) => Ok(Some(lmdb_decode(bytes)?)),
                None => Ok(None),
            }
        })
        .await?
    }

    async fn fetch_all(&self, filters: &Filters) -> StoreResult<Vec<T>> {
        let filters = filters.clone();
        self.select(move |row| filters.matches(row)).await
    }

    async fn fetch_in(&self, column: &str, ids: &[Value]) -> StoreResult<Vec<T>> {
        let column = column.to_string();
        let ids = ids.to_vec();
        self.select(move |row| value_in(row, &column, &ids)).await
    }

    async fn replace(&self, record: T) -> StoreResult<Option<T>> {
        let Some(id) = record.id() else {
            return Ok(None);
        };
        let env = self.env.clone();
        let db = self.db;

        tokio::task::spawn_blocking(move || {
            let mut wtxn = env.write_txn()?;
            let key = row_key(id);
            if db.get(&wtxn, &key)?.is_none() {
                return Ok(None);
            }
            Self::check_unique(&record, &Self::scan(db, &wtxn)?)?;
            db.put(&mut wtxn, &key, &lmdb_encode(&record)?)?;
            wtxn.commit()?;
            Ok(Some(record))
        })
        .await?
    }

    async fn remove(&self, id: i64) -> StoreResult<bool> {
        let env = self.env.clone();
        let db = self.db;

        tokio::task::spawn_blocking(move || {
            let mut wtxn = env.write_txn()?;
            let removed = db.delete(&mut wtxn, &row_key(id))?;
            wtxn.commit()?;
            Ok(removed)
        })
        .await?
    }
}
