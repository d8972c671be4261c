//! Contract suite for `DocumentStore<Product>` backends
//!
//! `$factory` must evaluate to a value implementing `DocumentStore<Product>`
//! over an empty collection. It is re-evaluated for each test.

/// Generate the `DocumentStore` conformance suite for one backend.
#[macro_export]
macro_rules! document_store_tests {
    ($factory:expr) => {
        mod document_store_contract_tests {
            use super::*;
            use storefront::core::document::DocumentStore;
            use storefront::core::error::{EntityError, StoreError};

            #[tokio::test]
            async fn test_insert_and_find_by_key() {
                let store = $factory;
                let product = sample_product("sku-100", 7);

                let stored = store.insert(product.clone()).await.unwrap();
                assert_eq!(stored, product);

                let found = store.find_by_key("sku-100").await.unwrap();
                assert_eq!(found, product);
            }

            #[tokio::test]
            async fn test_find_missing_key_names_type() {
                let store = $factory;

                match store.find_by_key("sku-missing").await {
                    Err(StoreError::Entity(EntityError::NotFound { entity_type, id })) => {
                        assert_eq!(entity_type, "Product");
                        assert_eq!(id, "sku-missing");
                    }
                    other => panic!("expected NotFound, got {:?}", other),
                }
            }

            #[tokio::test]
            async fn test_find_all_returns_every_product() {
                let store = $factory;
                assert!(store.find_all().await.unwrap().is_empty());

                for key in ["sku-1", "sku-2", "sku-3"] {
                    store.insert(sample_product(key, 1)).await.unwrap();
                }

                let mut keys: Vec<String> = store
                    .find_all()
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|p| p.product_id)
                    .collect();
                keys.sort();
                assert_eq!(keys, vec!["sku-1", "sku-2", "sku-3"]);
            }

            #[tokio::test]
            async fn test_duplicate_key_is_conflict_and_keeps_original() {
                let store = $factory;
                store.insert(sample_product("sku-dup", 1)).await.unwrap();

                let mut clash = sample_product("sku-dup", 2);
                clash.name = "Impostor".to_string();
                let err = store.insert(clash).await.unwrap_err();
                assert!(err.is_conflict(), "expected conflict, got {:?}", err);

                let kept = store.find_by_key("sku-dup").await.unwrap();
                assert_eq!(kept.owner_id, 1);
                assert_eq!(store.find_all().await.unwrap().len(), 1);
            }

            #[tokio::test]
            async fn test_optional_fields_round_trip() {
                let store = $factory;
                let mut product = sample_product("sku-bare", 3);
                product.description = None;

                store.insert(product.clone()).await.unwrap();
                let found = store.find_by_key("sku-bare").await.unwrap();
                assert_eq!(found.description, None);
                assert_eq!(found.updated_at, None);
            }
        }
    };
}
