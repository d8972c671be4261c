//! Equality filters for repository list queries

use crate::core::error::{StoreResult, ValidationError};
use crate::core::record::Record;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A set of `field == value` clauses, ANDed together.
///
/// Each field appears at most once; adding the same field twice keeps the
/// last value. An empty set matches every record.
///
/// # Example
/// ```rust,ignore
/// let admins = accounts
///     .list_all(Filters::new().eq("is_admin", true))
///     .await?;
///
/// let mine = payments
///     .list_all(Filters::new().eq("user_id", account_id))
///     .await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    clauses: BTreeMap<String, Value>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality clause
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reject clauses naming fields `T` does not have
    pub fn validate<T: Record>(&self) -> StoreResult<()> {
        match self.clauses.keys().find(|field| !T::has_field(field)) {
            Some(field) => Err(ValidationError::UnknownField {
                entity_type: T::TYPE_NAME.to_string(),
                field: field.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Whether a serialized record satisfies every clause
    pub fn matches(&self, record: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| record.get(field).is_some_and(|v| v == expected))
    }

    /// The clauses as a JSON object (usable as a containment document)
    pub fn to_object(&self) -> Value {
        Value::Object(
            self.clauses
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Filters::new(), |filters, (k, v)| filters.eq(k, v))
    }
}

/// Whether the serialized record's `column` value is one of `ids`
pub fn value_in(record: &Value, column: &str, ids: &[Value]) -> bool {
    record.get(column).is_some_and(|v| ids.contains(v))
}
