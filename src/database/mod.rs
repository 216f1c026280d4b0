use anyhow::{Result, anyhow};
use sqlx::{
    Any, AnyPool, Transaction,
    any::{AnyPoolOptions, install_default_drivers},
    migrate::MigrateDatabase,
};

pub mod ids;
pub mod models;
pub mod repositories;
pub mod transaction;
pub mod types;
pub mod utils;

/// Supported stores. Chosen once from the database URL at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    pub fn from_url(database_url: &str) -> Result<Self> {
        let scheme = database_url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_lowercase())
            .ok_or_else(|| anyhow!("Database URL has no scheme: {}", database_url))?;

        match scheme.as_str() {
            "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            other => Err(anyhow!("Unsupported database scheme: {}", other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
        }
    }

    // SQLite allows a single writer; more connections only trade lock waits for busy errors.
    fn max_connections(&self, configured: u32) -> u32 {
        match self {
            Backend::Sqlite => 1,
            Backend::Postgres => configured.max(1),
        }
    }

    fn normalize_url(&self, database_url: &str) -> String {
        match self {
            Backend::Sqlite => database_url.replacen("sqlite3:", "sqlite:", 1),
            Backend::Postgres => database_url.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    backend: Backend,
}

impl Database {
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Any>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub async fn init_database(database_url: &str, max_connections: u32) -> Result<Database> {
    install_default_drivers();

    let backend = Backend::from_url(database_url)?;
    let url = backend.normalize_url(database_url);

    // Create database if it doesn't exist
    if !Any::database_exists(&url).await.unwrap_or(false) {
        log::info!("Creating {} database", backend.name());
        Any::create_database(&url).await?;
    } else {
        log::debug!("Database already exists");
    }

    let pool = AnyPoolOptions::new()
        .max_connections(backend.max_connections(max_connections))
        .connect(&url)
        .await?;

    log::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Migrations completed successfully");

    Ok(Database { pool, backend })
}
