//! Contract suite for `Repository<T>` over a `RecordStore` backend
//!
//! The macro takes one expression evaluating to an
//! `(Repository<Account>, Repository<PaymentMethod>)` pair over EMPTY stores
//! sharing one backend (payment methods reference accounts). It is
//! re-evaluated for each test.
//!
//! ## Create & Read
//! - `test_create_assigns_id_and_timestamps`
//! - `test_get_or_fail_missing_names_type`
//!
//! ## Update
//! - `test_update_overwrites_only_supplied_fields`
//! - `test_update_missing_record_is_not_found`
//! - `test_update_rejects_unknown_field`
//! - `test_update_rejects_wrong_type`
//! - `test_save_overwrites_whole_record`
//!
//! ## List
//! - `test_list_all_unfiltered_in_id_order`
//! - `test_list_all_filters_by_equality`
//! - `test_list_all_rejects_unknown_filter_field`
//! - `test_list_by_key_in`
//!
//! ## Delete
//! - `test_delete_then_get_is_not_found`
//! - `test_soft_delete_unsupported_type`
//!
//! ## Uniqueness
//! - `test_duplicate_username_is_conflict`
//! - `test_ids_are_distinct`

/// Generate the `Repository` conformance suite for one backend.
#[macro_export]
macro_rules! repository_tests {
    ($factory:expr) => {
        mod repository_contract_tests {
            use super::*;
            use serde_json::json;
            use storefront::core::error::{EntityError, StoreError, ValidationError};
            use storefront::core::query::Filters;

            // ==================================================================
            // Create & Read
            // ==================================================================

            #[tokio::test]
            async fn test_create_assigns_id_and_timestamps() {
                let (accounts, _payments) = $factory;

                let created = accounts.create(sample_account("alice")).await.unwrap();
                let id = created.id.expect("create should assign an id");
                assert_eq!(created.username, "alice");
                assert!(created.created_at.is_some());
                assert!(created.updated_at.is_some());

                let fetched = accounts.get_or_fail(id).await.unwrap();
                assert_eq!(fetched.username, "alice");
                assert_eq!(fetched.email, "alice@example.com");
                assert_eq!(fetched.created_at, created.created_at);
            }

            #[tokio::test]
            async fn test_get_or_fail_missing_names_type() {
                let (accounts, payments) = $factory;

                match accounts.get_or_fail(999).await {
                    Err(StoreError::Entity(EntityError::NotFound { entity_type, id })) => {
                        assert_eq!(entity_type, "Account");
                        assert_eq!(id, "999");
                    }
                    other => panic!("expected NotFound, got {:?}", other),
                }

                match payments.get_or_fail(999).await {
                    Err(StoreError::Entity(EntityError::NotFound { entity_type, .. })) => {
                        assert_eq!(entity_type, "PaymentMethod");
                    }
                    other => panic!("expected NotFound, got {:?}", other),
                }
            }

            // ==================================================================
            // Update
            // ==================================================================

            #[tokio::test]
            async fn test_update_overwrites_only_supplied_fields() {
                let (accounts, _payments) = $factory;
                let created = accounts.create(sample_account("bob")).await.unwrap();
                let id = created.id.unwrap();

                let updated = accounts
                    .update(json!({ "id": id, "address": "2 Side Street", "age": 41 }))
                    .await
                    .unwrap();

                assert_eq!(updated.address, "2 Side Street");
                assert_eq!(updated.age, 41);
                assert_eq!(updated.username, created.username);
                assert_eq!(updated.email, created.email);
                assert_eq!(updated.password, created.password);
                assert_eq!(updated.created_at, created.created_at);
                assert!(updated.updated_at >= created.updated_at);

                let fetched = accounts.get_or_fail(id).await.unwrap();
                assert_eq!(fetched.address, "2 Side Street");
                assert_eq!(fetched.name, created.name);
            }

            #[tokio::test]
            async fn test_update_missing_record_is_not_found() {
                let (accounts, _payments) = $factory;

                let err = accounts
                    .update(json!({ "id": 4242, "name": "ghost" }))
                    .await
                    .unwrap_err();
                assert!(err.is_not_found());
            }

            #[tokio::test]
            async fn test_update_rejects_unknown_field() {
                let (accounts, _payments) = $factory;
                let created = accounts.create(sample_account("carol")).await.unwrap();

                let err = accounts
                    .update(json!({ "id": created.id, "nickname": "cc" }))
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    StoreError::Validation(ValidationError::UnknownField { ref field, .. })
                        if field == "nickname"
                ));

                let fetched = accounts.get_or_fail(created.id.unwrap()).await.unwrap();
                assert_eq!(fetched, created);
            }

            #[tokio::test]
            async fn test_update_rejects_wrong_type() {
                let (accounts, _payments) = $factory;
                let created = accounts.create(sample_account("dave")).await.unwrap();

                let err = accounts
                    .update(json!({ "id": created.id, "age": "forty" }))
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    StoreError::Validation(ValidationError::FieldError { .. })
                ));
            }

            #[tokio::test]
            async fn test_save_overwrites_whole_record() {
                let (accounts, _payments) = $factory;
                let mut account = accounts.create(sample_account("erin")).await.unwrap();

                account.is_admin = true;
                account.name = "Erin Admin".to_string();
                let saved = accounts.save(account.clone()).await.unwrap();
                assert!(saved.is_admin);
                assert_eq!(saved.name, "Erin Admin");

                let mut ghost = sample_account("ghost");
                ghost.id = Some(31337);
                assert!(accounts.save(ghost).await.unwrap_err().is_not_found());
            }

            // ==================================================================
            // List
            // ==================================================================

            #[tokio::test]
            async fn test_list_all_unfiltered_in_id_order() {
                let (accounts, _payments) = $factory;
                assert!(accounts.list_all(Filters::new()).await.unwrap().is_empty());

                for handle in ["u1", "u2", "u3"] {
                    accounts.create(sample_account(handle)).await.unwrap();
                }

                let all = accounts.list_all(Filters::new()).await.unwrap();
                let names: Vec<&str> = all.iter().map(|a| a.username.as_str()).collect();
                assert_eq!(names, vec!["u1", "u2", "u3"]);
                assert!(all.windows(2).all(|w| w[0].id < w[1].id));
            }

            #[tokio::test]
            async fn test_list_all_filters_by_equality() {
                let (accounts, payments) = $factory;
                let owner = accounts.create(sample_account("frank")).await.unwrap();
                let other = accounts.create(sample_account("grace")).await.unwrap();
                let owner_id = owner.id.unwrap();

                payments.create(sample_payment(owner_id, "4111111111111111")).await.unwrap();
                payments.create(sample_payment(owner_id, "5500000000000004")).await.unwrap();
                payments
                    .create(sample_payment(other.id.unwrap(), "340000000000009"))
                    .await
                    .unwrap();

                let mine = payments
                    .list_all(Filters::new().eq("user_id", owner_id))
                    .await
                    .unwrap();
                assert_eq!(mine.len(), 2);
                assert!(mine.iter().all(|p| p.user_id == owner_id));

                let one = payments
                    .list_all(
                        Filters::new()
                            .eq("user_id", owner_id)
                            .eq("card_number", "5500000000000004"),
                    )
                    .await
                    .unwrap();
                assert_eq!(one.len(), 1);
                assert_eq!(one[0].expires_at, sample_expiry());

                let none = accounts
                    .list_all(Filters::new().eq("username", "nobody"))
                    .await
                    .unwrap();
                assert!(none.is_empty());
            }

            #[tokio::test]
            async fn test_list_all_rejects_unknown_filter_field() {
                let (accounts, _payments) = $factory;

                let err = accounts
                    .list_all(Filters::new().eq("favourite_colour", "blue"))
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    StoreError::Validation(ValidationError::UnknownField { .. })
                ));
            }

            #[tokio::test]
            async fn test_list_by_key_in() {
                let (accounts, _payments) = $factory;
                let a = accounts.create(sample_account("hank")).await.unwrap();
                let _b = accounts.create(sample_account("ivy")).await.unwrap();
                let c = accounts.create(sample_account("jack")).await.unwrap();

                let ids = vec![a.id.unwrap(), c.id.unwrap(), 777];
                let found = accounts.list_by_key_in("id", &ids).await.unwrap();
                let mut names: Vec<String> = found.into_iter().map(|a| a.username).collect();
                names.sort();
                assert_eq!(names, vec!["hank", "jack"]);

                let empty: Vec<i64> = Vec::new();
                assert!(accounts.list_by_key_in("id", &empty).await.unwrap().is_empty());

                assert!(accounts.list_by_key_in("shoe_size", &ids).await.is_err());
            }

            // ==================================================================
            // Delete
            // ==================================================================

            #[tokio::test]
            async fn test_delete_then_get_is_not_found() {
                let (accounts, _payments) = $factory;
                let created = accounts.create(sample_account("kate")).await.unwrap();
                let id = created.id.unwrap();

                accounts.delete(id).await.unwrap();
                assert!(accounts.get_or_fail(id).await.unwrap_err().is_not_found());
                assert!(accounts.delete(id).await.unwrap_err().is_not_found());
            }

            #[tokio::test]
            async fn test_soft_delete_unsupported_type() {
                let (accounts, _payments) = $factory;
                let created = accounts.create(sample_account("liam")).await.unwrap();
                let id = created.id.unwrap();

                let err = accounts.soft_delete(id).await.unwrap_err();
                assert!(matches!(
                    err,
                    StoreError::Entity(EntityError::OperationFailed { .. })
                ));
                assert!(accounts.get_or_fail(id).await.is_ok());

                assert!(accounts.soft_delete(9001).await.unwrap_err().is_not_found());
            }

            // ==================================================================
            // Uniqueness
            // ==================================================================

            #[tokio::test]
            async fn test_duplicate_username_is_conflict() {
                let (accounts, _payments) = $factory;
                accounts.create(sample_account("mia")).await.unwrap();

                let mut clash = sample_account("other");
                clash.username = "mia".to_string();
                let err = accounts.create(clash).await.unwrap_err();
                assert!(err.is_conflict(), "expected conflict, got {:?}", err);

                let all = accounts.list_all(Filters::new()).await.unwrap();
                assert_eq!(all.len(), 1);
            }

            #[tokio::test]
            async fn test_ids_are_distinct() {
                let (accounts, _payments) = $factory;
                let first = accounts.create(sample_account("ned")).await.unwrap();
                accounts.delete(first.id.unwrap()).await.unwrap();
                let second = accounts.create(sample_account("olga")).await.unwrap();

                assert_ne!(first.id, second.id);
            }
        }
    };
}
