//! Configuration validation.

use super::{Config, MAX_PAGE_SIZE};
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.path.as_os_str().is_empty() {
        return Err(MigrateError::Config("SQLITE_PATH must not be empty".into()));
    }

    if config.target.host.is_empty() {
        return Err(MigrateError::Config("DB_HOST must not be empty".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("DB_NAME must not be empty".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("DB_USER must not be empty".into()));
    }
    if config.target.schema.is_empty() {
        return Err(MigrateError::Config("DB_SCHEMA must not be empty".into()));
    }

    if config.migration.max_range == 0 {
        return Err(MigrateError::Config("MAX_RANGE must be at least 1".into()));
    }
    if config.migration.page_size == 0 {
        return Err(MigrateError::Config("PAGE_SIZE must be at least 1".into()));
    }
    if config.migration.page_size > MAX_PAGE_SIZE {
        return Err(MigrateError::Config(format!(
            "PAGE_SIZE must be at most {}, got {}",
            MAX_PAGE_SIZE, config.migration.page_size
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SourceConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig::default(),
            target: TargetConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "movies_database".to_string(),
                user: "app".to_string(),
                password: "password".to_string(),
                schema: "content".to_string(),
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_database() {
        let mut config = valid_config();
        config.target.database = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_page_size() {
        let mut config = valid_config();
        config.migration.page_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_page_size_upper_bound() {
        let mut config = valid_config();
        config.migration.page_size = MAX_PAGE_SIZE;
        assert!(validate(&config).is_ok());
        config.migration.page_size = MAX_PAGE_SIZE + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_max_range() {
        let mut config = valid_config();
        config.migration.max_range = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_target_config_debug_redacts_password() {
        let mut config = valid_config();
        config.target.password = "super_secret_password_456".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_456"),
            "Debug output should not contain actual password value"
        );
    }
}
