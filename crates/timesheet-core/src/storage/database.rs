//! SQLite database operations
//!
//! Provides connection pool management and database initialization.

use crate::config::Config;
use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default maximum connections in the pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const MEMORY_PATH: &str = ":memory:";

/// Database configuration options
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Whether to run migrations automatically
    pub auto_migrate: bool,
}

impl DatabaseConfig {
    /// Create a new database config with the specified path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
        }
    }

    /// Create a config for an in-memory database (useful for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            // Every connection to :memory: is a separate database
            max_connections: 1,
            auto_migrate: true,
        }
    }

    /// Build the database settings described by the application config
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_path(config.database_path()?).max_connections(config.database.max_connections))
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Disable automatic migrations
    pub fn no_migrate(mut self) -> Self {
        self.auto_migrate = false;
        self
    }

    fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Create a new database connection with the given configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let base_options = if config.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
            SqliteConnectOptions::new()
                .filename(&config.path)
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true)
        };
        let connect_options = base_options.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("Failed to connect to database: {:?}", config.path))?;

        let db = Self { pool, config };

        if db.config.auto_migrate {
            db.migrate().await?;
        }

        Ok(db)
    }

    /// Open the database described by the application config
    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::new(DatabaseConfig::from_config(config)?).await
    }

    /// Create an in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::in_memory()
            .await
            .expect("Failed to create in-memory database");

        db.health_check().await.expect("Health check failed");

        let status = db
            .migration_status()
            .await
            .expect("Failed to get migration status");
        assert!(!status.needs_migration);
    }

    #[tokio::test]
    async fn test_database_config_builder() {
        let config = DatabaseConfig::with_path("/tmp/timesheet-test.db")
            .max_connections(10)
            .no_migrate();

        assert_eq!(config.path, PathBuf::from("/tmp/timesheet-test.db"));
        assert_eq!(config.max_connections, 10);
        assert!(!config.auto_migrate);
        assert!(DatabaseConfig::in_memory().is_memory());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::in_memory().await.expect("Failed to create database");

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("Failed to check foreign_keys pragma");

        assert_eq!(result.0, 1, "Foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("timesheet.db");

        let db = Database::new(DatabaseConfig::with_path(&path))
            .await
            .expect("Failed to create file database");
        db.health_check().await.unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());

        db.close().await;
    }
}
