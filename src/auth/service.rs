//! Identity resolution, password login and the admin gate

use crate::auth::password::PasswordHasher;
use crate::auth::token::{Claims, TokenService};
use crate::core::error::{AuthError, StoreResult};
use crate::core::query::Filters;
use crate::core::repository::Repository;
use crate::entities::Account;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Plaintext behind the digest checked when a handle has no account
const DECOY_SECRET: &str = "storefront-decoy-secret";

/// Response of a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Pass `account` through if it is an administrator
pub fn require_admin(account: Account) -> StoreResult<Account> {
    if account.is_admin {
        Ok(account)
    } else {
        tracing::debug!(username = %account.username, "admin privileges required");
        Err(AuthError::NotAuthorized {
            message: "administrator privileges required".to_string(),
        }
        .into())
    }
}

/// Turns credentials (a bearer token, or a handle and password) into an
/// [`Account`]
///
/// Every credential failure surfaces as `AuthError::InvalidCredentials`;
/// the underlying cause is only logged. Store failures propagate.
#[derive(Clone)]
pub struct CredentialService {
    tokens: TokenService,
    hasher: PasswordHasher,
    accounts: Repository<Account>,
    decoy: Arc<OnceCell<String>>,
}

impl CredentialService {
    pub fn new(tokens: TokenService, hasher: PasswordHasher, accounts: Repository<Account>) -> Self {
        Self {
            tokens,
            hasher,
            accounts,
            decoy: Arc::new(OnceCell::new()),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// The account a bearer token was issued for
    pub async fn resolve_identity(&self, token: &str) -> StoreResult<Account> {
        let claims = self.tokens.decode(token).map_err(|e| {
            tracing::debug!(reason = %e, "rejected bearer token");
            AuthError::InvalidCredentials
        })?;
        let handle = claims.sub.unwrap_or_default();

        match self.find_by_handle(&handle).await? {
            Some(account) => Ok(account),
            None => {
                tracing::debug!(username = %handle, "token subject has no account");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    pub fn require_admin(&self, account: Account) -> StoreResult<Account> {
        require_admin(account)
    }

    /// Check a handle and password
    ///
    /// `None` for an unknown handle or a wrong password.
    pub async fn authenticate(&self, handle: &str, plaintext: &str) -> StoreResult<Option<Account>> {
        tracing::info!(username = %handle, "authentication attempt");

        let Some(account) = self.find_by_handle(handle).await? else {
            // An unknown handle costs one bcrypt verify, like a wrong password
            let decoy = self.decoy_digest().await?;
            self.hasher.verify_secret(plaintext, decoy).await;
            return Ok(None);
        };
        if !self.hasher.verify_secret(plaintext, &account.password).await {
            return Ok(None);
        }
        Ok(Some(account))
    }

    /// Authenticate and issue a token for the account's handle
    pub async fn login(&self, handle: &str, plaintext: &str) -> StoreResult<AccessToken> {
        let Some(account) = self.authenticate(handle, plaintext).await? else {
            tracing::info!(username = %handle, "login rejected");
            return Err(AuthError::InvalidCredentials.into());
        };

        let token = self
            .tokens
            .issue_token(&Claims::for_subject(account.username), None)?;
        Ok(AccessToken::bearer(token))
    }

    async fn decoy_digest(&self) -> StoreResult<&str> {
        let digest = self
            .decoy
            .get_or_try_init(|| self.hasher.hash_secret(DECOY_SECRET))
            .await?;
        Ok(digest.as_str())
    }

    async fn find_by_handle(&self, handle: &str) -> StoreResult<Option<Account>> {
        let mut matches = self
            .accounts
            .list_all(Filters::new().eq("username", handle))
            .await?;
        Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        })
    }
}
