//! Catalog products

use crate::core::document::DocumentStore;
use crate::core::error::StoreResult;
use crate::entities::{Account, NewProduct, Product};
use crate::services::account_id;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

/// Catalog operations for authenticated callers
///
/// The `&Account` arguments are the resolved caller; any account may read
/// the catalog.
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn DocumentStore<Product>>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn DocumentStore<Product>>) -> Self {
        Self { products }
    }

    /// List a product owned by the caller
    ///
    /// A `product_id` already in the catalog fails with
    /// `EntityError::AlreadyExists`; the existing product is kept.
    pub async fn create(&self, caller: &Account, input: NewProduct) -> StoreResult<Product> {
        let owner = account_id(caller)?;
        input.validate()?;

        let product = self
            .products
            .insert(input.into_product(owner, Utc::now()))
            .await?;
        tracing::info!(product_id = %product.product_id, owner_id = owner, "listed product");
        Ok(product)
    }

    pub async fn list(&self, _caller: &Account) -> StoreResult<Vec<Product>> {
        self.products.find_all().await
    }

    pub async fn get(&self, _caller: &Account, product_id: &str) -> StoreResult<Product> {
        self.products.find_by_key(product_id).await
    }
}
