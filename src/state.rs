//! Application state built once at startup

use crate::auth::{CredentialService, PasswordHasher, TokenService};
use crate::config::Settings;
use crate::core::document::DocumentStore;
use crate::core::error::StoreResult;
use crate::core::repository::Repository;
use crate::entities::{Account, PaymentMethod, Product};
use crate::services::{AccountService, CatalogService, PaymentService};
use crate::storage::{InMemoryDocumentStore, InMemoryRecordStore};
use std::sync::Arc;

/// Repositories, the catalog store and the credential service, shared by
/// every request
///
/// Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub accounts: Repository<Account>,
    pub payments: Repository<PaymentMethod>,
    pub products: Arc<dyn DocumentStore<Product>>,
    pub credentials: CredentialService,
}

impl AppState {
    /// Assemble state from already-open stores
    pub fn from_parts(
        settings: Settings,
        accounts: Repository<Account>,
        payments: Repository<PaymentMethod>,
        products: Arc<dyn DocumentStore<Product>>,
    ) -> StoreResult<Self> {
        settings.validate()?;

        let tokens = TokenService::from_config(&settings.auth)?;
        let hasher = PasswordHasher::new(settings.auth.bcrypt_cost);
        let credentials = CredentialService::new(tokens, hasher, accounts.clone());

        Ok(Self {
            settings: Arc::new(settings),
            accounts,
            payments,
            products,
            credentials,
        })
    }

    /// State over fresh in-memory stores
    pub fn in_memory(settings: Settings) -> StoreResult<Self> {
        Self::from_parts(
            settings,
            Repository::from_store(InMemoryRecordStore::<Account>::new()),
            Repository::from_store(InMemoryRecordStore::<PaymentMethod>::new()),
            Arc::new(InMemoryDocumentStore::<Product>::new()),
        )
    }

    /// Connect the configured backends
    ///
    /// - `reload = false`: PostgreSQL (feature `postgres`), migrated on connect
    /// - `reload = true`: LMDB under `database.local_path` (feature `lmdb`)
    /// - catalog: MongoDB (feature `mongodb_backend`) with its unique index
    ///
    /// A backend whose feature is disabled falls back to the in-memory store.
    pub async fn connect(settings: Settings) -> StoreResult<Self> {
        settings.validate()?;

        let (accounts, payments) = relational_stores(&settings).await?;
        let products = document_store(&settings).await?;

        Self::from_parts(settings, accounts, payments, products)
    }

    pub fn account_service(&self) -> AccountService {
        AccountService::new(
            self.accounts.clone(),
            self.payments.clone(),
            *self.credentials.hasher(),
        )
    }

    pub fn payment_service(&self) -> PaymentService {
        PaymentService::new(self.payments.clone(), self.accounts.clone())
    }

    pub fn catalog_service(&self) -> CatalogService {
        CatalogService::new(Arc::clone(&self.products))
    }
}

async fn relational_stores(
    settings: &Settings,
) -> StoreResult<(Repository<Account>, Repository<PaymentMethod>)> {
    #[cfg(feature = "lmdb")]
    {
        if settings.reload {
            use crate::storage::lmdb::{self, LmdbRecordStore};

            let env = lmdb::open_env(&settings.database.local_path)?;
            return Ok((
                Repository::from_store(LmdbRecordStore::<Account>::new(env.clone())?),
                Repository::from_store(LmdbRecordStore::<PaymentMethod>::new(env)?),
            ));
        }
    }

    #[cfg(feature = "postgres")]
    {
        if !settings.reload {
            use crate::storage::postgres::{self, PostgresRecordStore};

            let pool = postgres::connect(&settings.database).await?;
            postgres::migrate(&pool).await?;
            return Ok((
                Repository::from_store(PostgresRecordStore::<Account>::new(pool.clone())),
                Repository::from_store(PostgresRecordStore::<PaymentMethod>::new(pool)),
            ));
        }
    }

    tracing::warn!(
        reload = settings.reload,
        "no relational backend enabled for this mode, using in-memory stores"
    );
    Ok((
        Repository::from_store(InMemoryRecordStore::<Account>::new()),
        Repository::from_store(InMemoryRecordStore::<PaymentMethod>::new()),
    ))
}

#[cfg_attr(not(feature = "mongodb_backend"), allow(unused_variables))]
async fn document_store(settings: &Settings) -> StoreResult<Arc<dyn DocumentStore<Product>>> {
    #[cfg(feature = "mongodb_backend")]
    let products: Arc<dyn DocumentStore<Product>> = {
        use crate::storage::mongodb::{self, MongoDocumentStore};

        let database = mongodb::connect(&settings.document_store).await?;
        let products = MongoDocumentStore::<Product>::new(database);
        products.ensure_indexes().await?;
        Arc::new(products)
    };

    #[cfg(not(feature = "mongodb_backend"))]
    let products: Arc<dyn DocumentStore<Product>> = {
        tracing::warn!("mongodb_backend feature disabled, using in-memory catalog");
        Arc::new(InMemoryDocumentStore::<Product>::new())
    };

    Ok(products)
}
