//! Configuration loading and validation.
//!
//! Settings come from the process environment. A `.env` file in the working
//! directory is loaded first when present; variables already set win.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use std::path::PathBuf;
use tracing::debug;

impl Config {
    /// Load configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(MigrateError::Config(format!("invalid .env file: {}", e))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| MigrateError::Config(format!("{} is required", key)))
        };

        let port = match lookup("DB_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                MigrateError::Config(format!("DB_PORT must be a port number, got '{}'", raw))
            })?,
            None => DEFAULT_PG_PORT,
        };

        let config = Config {
            source: SourceConfig {
                path: lookup("SQLITE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            },
            target: TargetConfig {
                host: lookup("DB_HOST").unwrap_or_else(|| DEFAULT_PG_HOST.to_string()),
                port,
                database: required("DB_NAME")?,
                user: required("DB_USER")?,
                password: required("DB_PASSWORD")?,
                schema: lookup("DB_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            },
            migration: MigrationConfig {
                max_range: parse_positive(&lookup, "MAX_RANGE", DEFAULT_MAX_RANGE)?,
                page_size: parse_positive(&lookup, "PAGE_SIZE", DEFAULT_PAGE_SIZE as u64)?
                    as usize,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            MigrateError::Config(format!("{} must be a positive integer, got '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

impl TargetConfig {
    /// Build a tokio-postgres config.
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&self.host);
        pg_config.port(self.port);
        pg_config.dbname(&self.database);
        pg_config.user(&self.user);
        pg_config.password(&self.password);
        pg_config.application_name("sqlite-pg-migrate");
        pg_config
    }
}
