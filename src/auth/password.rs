//! bcrypt password hashing
//!
//! bcrypt is deliberately slow, so both operations run on tokio's blocking
//! pool instead of stalling the async workers.

use crate::core::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Salted one-way digest of `plaintext`
    pub async fn hash_secret(&self, plaintext: &str) -> StoreResult<String> {
        let plaintext = plaintext.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await?
            .map_err(|e| StoreError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Whether `plaintext` matches `digest`
    ///
    /// A digest that is not valid bcrypt never matches.
    pub async fn verify_secret(&self, plaintext: &str, digest: &str) -> bool {
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();

        match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "stored digest could not be verified");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "password verification task failed");
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
