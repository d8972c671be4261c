//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "lmdb")]
pub mod lmdb;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::{InMemoryDocumentStore, InMemoryRecordStore};
#[cfg(feature = "lmdb")]
pub use self::lmdb::LmdbRecordStore;
#[cfg(feature = "mongodb_backend")]
pub use self::mongodb::MongoDocumentStore;
#[cfg(feature = "postgres")]
pub use self::postgres::PostgresRecordStore;
