//! Record trait: the schema every relationally stored type describes

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Base trait for everything a [`Repository`](crate::core::repository::Repository) persists.
///
/// A record type knows:
/// - `TYPE_NAME`: the label used in errors and logs (e.g. "Account")
/// - `TABLE`: the table / sub-database it lives in
/// - `FIELDS`: every serialized field name, `id` included
/// - which of its fields must be unique across all rows
/// - which timestamp fields it carries
///
/// Timestamp hooks default to no-ops, so a type without `created_at`,
/// `updated_at` or `deleted_at` simply ignores the stamp. Use
/// [`impl_record!`](crate::impl_record) rather than writing this by hand.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Label naming the type in not-found and conflict errors
    const TYPE_NAME: &'static str;

    /// Table (or collection / sub-database) name
    const TABLE: &'static str;

    /// All serialized field names
    const FIELDS: &'static [&'static str];

    /// Store-generated primary key, `None` before the first insert
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Values that must not repeat across rows, as `(field, value)` pairs
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn stamp_created(&mut self, _at: DateTime<Utc>) {}

    fn stamp_updated(&mut self, _at: DateTime<Utc>) {}

    /// Mark the record deleted. Returns `false` if the type has no `deleted_at`.
    fn stamp_deleted(&mut self, _at: DateTime<Utc>) -> bool {
        false
    }

    /// Whether `field` is one of this type's serialized fields
    fn has_field(field: &str) -> bool {
        Self::FIELDS.contains(&field)
    }

    /// Fields other than the primary key, in declaration order
    fn data_fields() -> Vec<&'static str> {
        Self::FIELDS.iter().copied().filter(|f| *f != "id").collect()
    }
}

/// Two records collide when any unique field holds the same value.
///
/// Returns the `(field, value)` pair that clashed.
pub fn unique_clash<T: Record>(candidate: &T, existing: &T) -> Option<(&'static str, String)> {
    if candidate.id().is_some() && candidate.id() == existing.id() {
        return None;
    }
    let theirs = existing.unique_keys();
    candidate
        .unique_keys()
        .into_iter()
        .find(|key| theirs.contains(key))
}
