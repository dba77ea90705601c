//! Database migrations
//!
//! Versioned SQLite schema for the timesheet store, applied automatically when
//! a database is opened.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Project hierarchy
const MIGRATION_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL CHECK (length(trim(code)) > 0),
        code_key TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        is_chargeable INTEGER NOT NULL DEFAULT 1,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_projects_code_key ON projects(code_key);

    CREATE TABLE IF NOT EXISTS sub_projects (
        id TEXT PRIMARY KEY NOT NULL,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        sub_number INTEGER NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_sub_projects_number
        ON sub_projects(project_id, sub_number);

    CREATE TABLE IF NOT EXISTS workstages (
        id TEXT PRIMARY KEY NOT NULL,
        sub_project_id TEXT NOT NULL REFERENCES sub_projects(id) ON DELETE CASCADE,
        workstage_number TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_workstages_number
        ON workstages(sub_project_id, workstage_number);
"#;

/// Migration 2: Non-chargeable tasks
const MIGRATION_V2: &str = r#"
    CREATE TABLE IF NOT EXISTS non_chargeable_tasks (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_non_chargeable_tasks_name ON non_chargeable_tasks(name);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let row: Option<(Option<i32>,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|(v,)| v).unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Project hierarchy");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Non-chargeable tasks");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        for table in ["projects", "sub_projects", "workstages", "non_chargeable_tasks"] {
            let result: (i32,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap_or_else(|_| panic!("Table {} should exist", table));
            assert_eq!(result.0, 0, "Table {} should be empty", table);
        }
    }

    #[tokio::test]
    async fn test_blank_project_code_is_rejected() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO projects (id, code, code_key, name) VALUES ('x', '  ', '  ', 'Blank')",
        )
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }
}
