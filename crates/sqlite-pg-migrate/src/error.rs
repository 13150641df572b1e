//! Error types for the migration library.

use thiserror::Error;

/// Process exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Process exit code for source (SQLite) errors.
pub const EXIT_SOURCE_ERROR: u8 = 2;
/// Process exit code for target (PostgreSQL) errors.
pub const EXIT_TARGET_ERROR: u8 = 3;
/// Process exit code for row mapping errors.
pub const EXIT_MAPPING_ERROR: u8 = 4;
/// Process exit code for validation failures.
pub const EXIT_VALIDATION_ERROR: u8 = 5;
/// Process exit code for IO errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (missing variable, unparsable value, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] sqlx::Error),

    /// Target database connection or query error
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Table present in the source with no known record shape
    #[error("No record shape for table '{0}'")]
    UnknownTable(String),

    /// A source row could not be turned into its record
    #[error("Mapping failed for table {table}: {message}")]
    Mapping { table: String, message: String },

    /// Row count validation failed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl Into<String>, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a Mapping error
    pub fn mapping(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Mapping {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) => EXIT_CONFIG_ERROR,
            MigrateError::Source(_) => EXIT_SOURCE_ERROR,
            MigrateError::Target(_) | MigrateError::Pool { .. } => EXIT_TARGET_ERROR,
            MigrateError::UnknownTable(_) | MigrateError::Mapping { .. } => EXIT_MAPPING_ERROR,
            MigrateError::Validation(_) => EXIT_VALIDATION_ERROR,
            MigrateError::Io(_) | MigrateError::Json(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            MigrateError::UnknownTable("x".into()).exit_code(),
            EXIT_MAPPING_ERROR
        );
        assert_eq!(
            MigrateError::mapping("genre", "bad id").exit_code(),
            EXIT_MAPPING_ERROR
        );
        assert_eq!(
            MigrateError::pool("timeout", "write_batch").exit_code(),
            EXIT_TARGET_ERROR
        );
    }

    #[test]
    fn test_format_detailed_includes_message() {
        let err = MigrateError::mapping("film_work", "column 'title' is NULL");
        let text = err.format_detailed();
        assert!(text.starts_with("Error: Mapping failed for table film_work"));
        assert!(text.contains("column 'title' is NULL"));
    }

    #[test]
    fn test_io_error_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "db.sqlite");
        let err = MigrateError::from(io);
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
        assert!(err.format_detailed().contains("db.sqlite"));
    }
}
