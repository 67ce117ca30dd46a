//! SurrealDB connection management.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::repository::WriteMode;

const ENV_PREFIX: &str = "SUPPLYDESK_DB_";

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
    /// How supplier write plans are executed.
    pub write_mode: WriteMode,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "supplydesk".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
            write_mode: WriteMode::Atomic,
        }
    }
}

impl DbConfig {
    /// Defaults overlaid with `SUPPLYDESK_DB_*` environment variables.
    pub fn from_env() -> Result<Self, DbError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Replace each field for which `lookup` returns a value. Keys are
    /// `SUPPLYDESK_DB_URL`, `_NAMESPACE`, `_DATABASE`, `_USERNAME`,
    /// `_PASSWORD` and `_WRITE_MODE`.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DbError> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(url) = var("URL") {
            self.url = url;
        }
        if let Some(namespace) = var("NAMESPACE") {
            self.namespace = namespace;
        }
        if let Some(database) = var("DATABASE") {
            self.database = database;
        }
        if let Some(username) = var("USERNAME") {
            self.username = username;
        }
        if let Some(password) = var("PASSWORD") {
            self.password = password;
        }
        if let Some(mode) = var("WRITE_MODE") {
            self.write_mode = mode.parse()?;
        }
        Ok(self)
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Authenticates as root, selects the configured namespace and
    /// database, and returns a ready-to-use manager.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
