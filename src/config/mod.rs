//! Configuration loading and management
//!
//! [`Settings`] can come from a YAML file, from the process environment
//! (with `.env` support), or from a file with the environment layered on top:
//!
//! ```rust,ignore
//! let settings = Settings::from_yaml_file("storefront.yaml")?.merge_env()?;
//! settings.validate()?;
//! ```

use crate::auth::token::{MAX_TOKEN_TTL_MINUTES, parse_algorithm};
use crate::core::error::{ConfigError, StoreResult};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Relational store connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database name
    pub name: String,
    pub max_connections: u32,
    /// Seconds before a pooled connection is closed and replaced
    pub pool_recycle_secs: u64,
    /// Directory of the LMDB environment used in development mode
    pub local_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "storefront".to_string(),
            max_connections: 5,
            pool_recycle_secs: 450,
            local_path: "./data/storefront.lmdb".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

/// Document store connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStoreConfig {
    pub uri: String,
    pub database: String,
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "storefront".to_string(),
        }
    }
}

/// Token signing and password hashing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 15,
            bcrypt_cost: 12,
        }
    }
}

impl AuthConfig {
    /// Configured token lifetime; fails outside `1..=MAX_TOKEN_TTL_MINUTES`
    pub fn token_ttl(&self) -> StoreResult<Duration> {
        let minutes = self.access_token_expire_minutes;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
            return Err(invalid(
                "auth.access_token_expire_minutes",
                minutes,
                &format!("must be between 1 and {}", MAX_TOKEN_TTL_MINUTES),
            ));
        }
        Duration::try_minutes(minutes).ok_or_else(|| {
            invalid("auth.access_token_expire_minutes", minutes, "out of range")
        })
    }
}

/// Log filter and output format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub log_json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// PEM files for serving over TLS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Complete application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub document_store: DocumentStoreConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(flatten)]
    pub logging: LoggingConfig,

    /// Development mode: use the local LMDB store instead of PostgreSQL
    #[serde(default)]
    pub reload: bool,

    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                file: Some(path.display().to_string()),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load settings from a YAML string
    pub fn from_yaml_str(yaml: &str) -> StoreResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Defaults overlaid with the process environment, after loading `.env`
    pub fn from_env() -> StoreResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        Self::default().merge_env()
    }

    /// Overlay any of the recognised environment variables onto `self`
    pub fn merge_env(self) -> StoreResult<Self> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay variables from `lookup`, which maps a name to its value
    pub fn merge_env_from<F>(mut self, lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = &mut self.database;
        if let Some(v) = lookup("SERVER") {
            db.host = v;
        }
        if let Some(v) = lookup("PORT") {
            db.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = lookup("DB_USER") {
            db.user = v;
        }
        if let Some(v) = lookup("PASSWORD") {
            db.password = v;
        }
        if let Some(v) = lookup("DATABASE") {
            db.name = v;
        }

        if let Some(v) = lookup("MONGO_URI") {
            self.document_store.uri = v;
        }
        if let Some(v) = lookup("MONGO_DATABASE") {
            self.document_store.database = v;
        }

        let auth = &mut self.auth;
        if let Some(v) = lookup("SECRET_KEY") {
            auth.secret_key = v;
        }
        if let Some(v) = lookup("ALGORITHM") {
            auth.algorithm = v;
        }
        if let Some(v) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            auth.access_token_expire_minutes = parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", &v)?;
        }
        if let Some(v) = lookup("BCRYPT_COST") {
            auth.bcrypt_cost = parse_var("BCRYPT_COST", &v)?;
        }

        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.log_level = v;
        }
        if let Some(v) = lookup("RELOAD") {
            self.reload = parse_flag("RELOAD", &v)?;
        }

        match (lookup("CERT_PEM"), lookup("KEY_PEM")) {
            (Some(cert_pem), Some(key_pem)) => {
                self.tls = Some(TlsConfig { cert_pem, key_pem });
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(ConfigError::MissingField {
                    field: "KEY_PEM".to_string(),
                }
                .into());
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingField {
                    field: "CERT_PEM".to_string(),
                }
                .into());
            }
        }

        Ok(self)
    }

    /// Reject settings the services cannot start with
    pub fn validate(&self) -> StoreResult<()> {
        if self.auth.secret_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "auth.secret_key".to_string(),
            }
            .into());
        }

        parse_algorithm(&self.auth.algorithm)?;

        self.auth.token_ttl()?;

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(invalid(
                "auth.bcrypt_cost",
                self.auth.bcrypt_cost,
                "must be between 4 and 31",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(invalid(
                "database.max_connections",
                self.database.max_connections,
                "must be at least 1",
            ));
        }

        Ok(())
    }

    pub fn token_ttl(&self) -> StoreResult<Duration> {
        self.auth.token_ttl()
    }
}

fn invalid(field: &str, value: impl ToString, message: &str) -> crate::core::error::StoreError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
    .into()
}

fn parse_var<T>(name: &str, value: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(name, value, &e.to_string()))
}

fn parse_flag(name: &str, value: &str) -> StoreResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(name, value, "expected a boolean")),
    }
}
