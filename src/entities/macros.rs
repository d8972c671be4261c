//! Macros for reducing boilerplate when defining record types
//!
//! A record type is a plain serde struct with an `id: Option<i64>` field.
//! [`impl_record!`] generates its [`Record`](crate::core::record::Record)
//! implementation from the list of fields and the roles some of them play.

/// Implement `Record` for a struct
///
/// The `unique`, `created`, `updated` and `deleted` clauses are optional and
/// must appear in that order. Timestamp fields must be
/// `Option<DateTime<Utc>>`.
///
/// # Example
///
/// ```rust,ignore
/// use storefront::prelude::*;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Coupon {
///     pub id: Option<i64>,
///     pub code: String,
///     pub created_at: Option<DateTime<Utc>>,
///     pub deleted_at: Option<DateTime<Utc>>,
/// }
///
/// impl_record! {
///     Coupon => "Coupon", table "coupons",
///     fields [id, code, created_at, deleted_at],
///     unique [code],
///     created created_at,
///     deleted deleted_at,
/// }
/// ```
#[macro_export]
macro_rules! impl_record {
    (
        $type:ident => $type_name:literal, table $table:literal,
        fields [ $( $field:ident ),* $(,)? ],
        $( unique [ $( $unique:ident ),* $(,)? ], )?
        $( created $created:ident, )?
        $( updated $updated:ident, )?
        $( deleted $deleted:ident, )?
    ) => {
        impl $crate::core::record::Record for $type {
            const TYPE_NAME: &'static str = $type_name;
            const TABLE: &'static str = $table;
            const FIELDS: &'static [&'static str] = &[ $( stringify!($field) ),* ];

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = Some(id);
            }

            fn unique_keys(&self) -> Vec<(&'static str, String)> {
                vec![ $( $( (stringify!($unique), self.$unique.to_string()) ),* )? ]
            }

            fn stamp_created(&mut self, _at: ::chrono::DateTime<::chrono::Utc>) {
                $( self.$created = Some(_at); )?
            }

            fn stamp_updated(&mut self, _at: ::chrono::DateTime<::chrono::Utc>) {
                $( self.$updated = Some(_at); )?
            }

            fn stamp_deleted(&mut self, _at: ::chrono::DateTime<::chrono::Utc>) -> bool {
                false $( || { self.$deleted = Some(_at); true } )?
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::record::Record;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Coupon {
        id: Option<i64>,
        code: String,
        created_at: Option<DateTime<Utc>>,
        deleted_at: Option<DateTime<Utc>>,
    }

    crate::impl_record! {
        Coupon => "Coupon", table "coupons",
        fields [id, code, created_at, deleted_at],
        unique [code],
        created created_at,
        deleted deleted_at,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Tag {
        id: Option<i64>,
        label: String,
    }

    crate::impl_record! {
        Tag => "Tag", table "tags",
        fields [id, label],
    }

    #[test]
    fn test_generated_metadata() {
        assert_eq!(Coupon::TYPE_NAME, "Coupon");
        assert_eq!(Coupon::TABLE, "coupons");
        assert_eq!(Coupon::FIELDS, &["id", "code", "created_at", "deleted_at"]);
    }

    #[test]
    fn test_generated_hooks() {
        let mut coupon = Coupon {
            id: None,
            code: "SPRING".to_string(),
            created_at: None,
            deleted_at: None,
        };
        let now = Utc::now();
        coupon.set_id(4);
        coupon.stamp_created(now);
        coupon.stamp_updated(now);
        assert!(coupon.stamp_deleted(now));

        assert_eq!(coupon.id(), Some(4));
        assert_eq!(coupon.created_at, Some(now));
        assert_eq!(coupon.deleted_at, Some(now));
        assert_eq!(coupon.unique_keys(), vec![("code", "SPRING".to_string())]);
    }

    #[test]
    fn test_optional_clauses_omitted() {
        let mut tag = Tag {
            id: None,
            label: "new".to_string(),
        };
        assert!(!tag.stamp_deleted(Utc::now()));
        assert!(tag.unique_keys().is_empty());
    }
}
