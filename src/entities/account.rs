//! Accounts: the users of the storefront

use crate::entities::payment::PaymentMethodView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A registered user
///
/// `username` is the handle tokens are issued for. `password` always holds a
/// bcrypt digest, never the plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<i64>,
    pub name: String,
    pub username: String,
    pub email: String,
    pub age: i32,
    pub national_id: String,
    pub address: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

crate::impl_record! {
    Account => "Account", table "accounts",
    fields [
        id, name, username, email, age, national_id, address, password,
        is_admin, created_at, updated_at,
    ],
    unique [username, email],
    created created_at,
    updated updated_at,
}

/// Registration input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 0, max = 150))]
    pub age: i32,
    #[validate(length(min = 1, max = 32))]
    pub national_id: String,
    #[validate(length(max = 255))]
    pub address: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl NewAccount {
    /// Build the account to persist, with `digest` in place of the plaintext
    pub fn into_account(self, digest: String) -> Account {
        Account {
            id: None,
            name: self.name,
            username: self.username,
            email: self.email,
            age: self.age,
            national_id: self.national_id,
            address: self.address,
            password: digest,
            is_admin: false,
            created_at: None,
            updated_at: None,
        }
    }
}

/// An account as shown to callers: everything but the password digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: Option<i64>,
    pub name: String,
    pub username: String,
    pub email: String,
    pub age: i32,
    pub national_id: String,
    pub address: String,
    pub is_admin: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            username: account.username,
            email: account.email,
            age: account.age,
            national_id: account.national_id,
            address: account.address,
            is_admin: account.is_admin,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// An account together with its payment methods
#[derive(Debug, Clone, Serialize)]
pub struct AccountProfile {
    #[serde(flatten)]
    pub account: AccountView,
    pub payment_methods: Vec<PaymentMethodView>,
}
