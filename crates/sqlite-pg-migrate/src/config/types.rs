//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default SQLite file, relative to the working directory.
pub const DEFAULT_SQLITE_PATH: &str = "db.sqlite";
/// Default PostgreSQL host.
pub const DEFAULT_PG_HOST: &str = "127.0.0.1";
/// Default PostgreSQL port.
pub const DEFAULT_PG_PORT: u16 = 5432;
/// Default destination schema.
pub const DEFAULT_SCHEMA: &str = "content";
/// Default ceiling on rows scanned per table.
pub const DEFAULT_MAX_RANGE: u64 = 10_000_000;
/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;
/// Largest accepted page size. The widest record has 9 columns, so this keeps
/// a page's bind parameters well under PostgreSQL's 65535 limit.
pub const MAX_PAGE_SIZE: usize = 5000;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (SQLite).
    pub source: SourceConfig,

    /// Target database configuration (PostgreSQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source database (SQLite) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the SQLite file.
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SQLITE_PATH),
        }
    }
}

/// Target database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    pub host: String,

    /// Database port.
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(skip_serializing)]
    pub password: String,

    /// Schema every destination table lives in.
    pub schema: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Maximum rows read from any one source table.
    pub max_range: u64,

    /// Rows per page (one read, one insert statement).
    pub page_size: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            max_range: DEFAULT_MAX_RANGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
