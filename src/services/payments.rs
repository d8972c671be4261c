//! Payment method creation and the admin listing

use crate::auth::require_admin;
use crate::core::error::StoreResult;
use crate::core::query::Filters;
use crate::core::repository::Repository;
use crate::entities::{
    Account, AccountView, NewPaymentMethod, PaymentMethod, PaymentMethodView, PaymentWithOwner,
};
use crate::services::account_id;
use std::collections::{BTreeSet, HashMap};
use validator::Validate;

#[derive(Clone)]
pub struct PaymentService {
    payments: Repository<PaymentMethod>,
    accounts: Repository<Account>,
}

impl PaymentService {
    pub fn new(payments: Repository<PaymentMethod>, accounts: Repository<Account>) -> Self {
        Self { payments, accounts }
    }

    /// Add a payment method to the caller's own account
    ///
    /// Any `user_id` in the input is replaced by the caller's id.
    pub async fn create_for_owner(
        &self,
        caller: &Account,
        input: NewPaymentMethod,
    ) -> StoreResult<PaymentMethodView> {
        let owner = account_id(caller)?;
        input.validate()?;

        let mut method = input.into_payment_method();
        method.user_id = owner;
        self.store(method).await
    }

    /// Add a payment method to any account; admins only
    ///
    /// Fails with not-found if `input.user_id` names no account.
    pub async fn create_as_admin(
        &self,
        caller: &Account,
        input: NewPaymentMethod,
    ) -> StoreResult<PaymentMethodView> {
        require_admin(caller.clone())?;
        input.validate()?;
        self.accounts.get_or_fail(input.user_id).await?;

        self.store(input.into_payment_method()).await
    }

    /// Every payment method with its owner; admins only
    pub async fn list_with_owners(&self, caller: &Account) -> StoreResult<Vec<PaymentWithOwner>> {
        require_admin(caller.clone())?;

        let methods = self.payments.list_all(Filters::new()).await?;
        let owner_ids: Vec<i64> = methods
            .iter()
            .map(|m| m.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let owners: HashMap<i64, AccountView> = self
            .accounts
            .list_by_key_in("id", &owner_ids)
            .await?
            .into_iter()
            .filter_map(|a| a.id.map(|id| (id, a.into())))
            .collect();

        Ok(methods
            .into_iter()
            .map(|method| PaymentWithOwner {
                owner: owners.get(&method.user_id).cloned(),
                payment: method.into(),
            })
            .collect())
    }

    async fn store(&self, method: PaymentMethod) -> StoreResult<PaymentMethodView> {
        let stored = self.payments.create(method).await?;
        tracing::info!(id = ?stored.id, user_id = stored.user_id, "added payment method");
        Ok(stored.into())
    }
}
