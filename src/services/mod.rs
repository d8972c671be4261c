//! Domain operations behind the storefront's endpoints
//!
//! Each service takes the already-resolved caller as an `&Account`; turning
//! a request into that account is [`CredentialService`](crate::auth::CredentialService)'s job.

pub mod accounts;
pub mod catalog;
pub mod payments;

pub use accounts::AccountService;
pub use catalog::CatalogService;
pub use payments::PaymentService;

use crate::core::error::{StoreResult, ValidationError};
use crate::entities::Account;

/// Id of a persisted account
pub(crate) fn account_id(account: &Account) -> StoreResult<i64> {
    account.id.ok_or_else(|| {
        ValidationError::MissingArgument {
            argument: "account id".to_string(),
        }
        .into()
    })
}
