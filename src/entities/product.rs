//! Catalog products, stored as documents keyed by `product_id`

use crate::core::document::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    /// Id of the account that listed the product
    pub owner_id: i64,
    pub name: String,
    pub price: f64,
    pub brand: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document for Product {
    const TYPE_NAME: &'static str = "Product";
    const COLLECTION: &'static str = "products";
    const KEY_FIELD: &'static str = "product_id";

    fn key(&self) -> &str {
        &self.product_id
    }
}

/// Product input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 128))]
    pub product_id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = 255))]
    pub brand: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewProduct {
    pub fn into_product(self, owner_id: i64, created_at: DateTime<Utc>) -> Product {
        Product {
            product_id: self.product_id,
            owner_id,
            name: self.name,
            price: self.price,
            brand: self.brand,
            description: self.description,
            created_at,
            updated_at: None,
        }
    }
}
