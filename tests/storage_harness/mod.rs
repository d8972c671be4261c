//! Shared test harness for storage backend testing
//!
//! Provides fixture builders for the three storefront entities and the
//! contract suites every backend must pass:
//!
//! - `repository_tests!` runs `Repository<Account>` / `Repository<PaymentMethod>`
//!   through the full CRUD contract
//! - `document_store_tests!` runs a `DocumentStore<Product>` through insert,
//!   lookup and uniqueness
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod document_store_tests;
#[macro_use]
pub mod repository_tests;

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use storefront::entities::{Account, PaymentMethod, Product};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// An unsaved account whose unique fields derive from `handle`
pub fn sample_account(handle: &str) -> Account {
    Account {
        id: None,
        name: format!("{} Example", handle),
        username: handle.to_string(),
        email: format!("{}@example.com", handle),
        age: 30,
        national_id: format!("NID-{}", handle),
        address: "1 Main Street".to_string(),
        password: "$2b$04$not-a-real-digest".to_string(),
        is_admin: false,
        created_at: None,
        updated_at: None,
    }
}

/// Wall-clock expiry used by every sample card
pub fn sample_expiry() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2027, 1, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 0))
        .expect("valid fixture date")
}

/// An unsaved card owned by `user_id`
pub fn sample_payment(user_id: i64, card_number: &str) -> PaymentMethod {
    PaymentMethod {
        id: None,
        user_id,
        card_number: card_number.to_string(),
        holder_name: "Card Holder".to_string(),
        expires_at: sample_expiry(),
        security_code: 123,
        created_at: None,
        updated_at: None,
    }
}

/// A catalog product keyed by `product_id`
///
/// `created_at` is whole-second so it survives every backend's encoding.
pub fn sample_product(product_id: &str, owner_id: i64) -> Product {
    Product {
        product_id: product_id.to_string(),
        owner_id,
        name: format!("Product {}", product_id),
        price: 19.5,
        brand: "Acme".to_string(),
        description: Some("A sample product".to_string()),
        created_at: Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid fixture timestamp"),
        updated_at: None,
    }
}
