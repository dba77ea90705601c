//! Storage layer - SQLite
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! The timesheet repository itself lives with the domain in
//! `domain::timesheet::repository`; this module only owns the connection.
//!
//! # Usage
//!
//! ```ignore
//! use timesheet_core::storage::Database;
//!
//! let db = Database::in_memory().await?;
//! let repository = TimesheetRepository::new(db.pool().clone());
//! ```

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
