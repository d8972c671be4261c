//! Registration and profiles

use crate::auth::PasswordHasher;
use crate::core::error::StoreResult;
use crate::core::query::Filters;
use crate::core::repository::Repository;
use crate::entities::{Account, AccountProfile, AccountView, NewAccount, PaymentMethod};
use crate::services::account_id;
use validator::Validate;

#[derive(Clone)]
pub struct AccountService {
    accounts: Repository<Account>,
    payments: Repository<PaymentMethod>,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(
        accounts: Repository<Account>,
        payments: Repository<PaymentMethod>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            accounts,
            payments,
            hasher,
        }
    }

    /// Create an account, storing a digest of the supplied password
    ///
    /// A taken username or email fails with `EntityError::AlreadyExists`.
    pub async fn register(&self, input: NewAccount) -> StoreResult<AccountView> {
        input.validate()?;
        let digest = self.hasher.hash_secret(&input.password).await?;
        let account = self.accounts.create(input.into_account(digest)).await?;

        tracing::info!(id = ?account.id, username = %account.username, "registered account");
        Ok(account.into())
    }

    /// The caller's account with its payment methods
    pub async fn profile(&self, account: &Account) -> StoreResult<AccountProfile> {
        let id = account_id(account)?;
        let payment_methods = self
            .payments
            .list_all(Filters::new().eq("user_id", id))
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(AccountProfile {
            account: account.clone().into(),
            payment_methods,
        })
    }
}
