//! # sqlite-pg-migrate
//!
//! SQLite to PostgreSQL migration library for the movies catalog.
//!
//! Copies the five catalog tables (`film_work`, `genre`, `person`,
//! `genre_film_work`, `person_film_work`) from a SQLite file into a
//! PostgreSQL schema:
//!
//! - **Paged transfers** with one multi-row INSERT per page
//! - **Idempotent loads**: rows whose `id` already exists are skipped
//! - **Identity preservation**: source primary keys are written unchanged
//! - **Foreign-key-safe ordering** of the link tables
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlite_pg_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> sqlite_pg_migrate::Result<()> {
//!     let config = Config::from_env()?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run(false).await;
//!     orchestrator.close().await;
//!     println!("Inserted {} rows", result?.rows_inserted);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod mapping;
pub mod orchestrator;
pub mod source;
pub mod target;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use error::{MigrateError, Result};
pub use mapping::{map_rows, RecordBatch, RecordKind};
pub use orchestrator::{
    ensure_valid, HealthCheckResult, MigrationResult, Orchestrator, TableResult, TableValidation,
};
pub use source::{SourceTable, SqliteReader};
pub use target::{PgWriter, TargetWriter};
