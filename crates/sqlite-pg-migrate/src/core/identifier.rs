//! Identifier validation and quoting.
//!
//! Table and schema names end up in generated SQL on both sides of the
//! migration, and identifiers cannot be bound as parameters. SQLite and
//! PostgreSQL share the same quoting rule: wrap in double quotes and double
//! any embedded double quote.

use crate::error::{MigrateError, Result};

/// PostgreSQL truncates identifiers longer than this (NAMEDATALEN - 1).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Reject identifiers that cannot be quoted safely.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "Identifier contains a null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds {} bytes (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote an identifier for SQLite or PostgreSQL.
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Schema-qualified, quoted table name.
pub fn qualify(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(table)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("film_work").unwrap(), "\"film_work\"");
        assert_eq!(quote_ident("odd\"name").unwrap(), "\"odd\"\"name\"");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(
            qualify("content", "genre").unwrap(),
            "\"content\".\"genre\""
        );
    }

    #[test]
    fn test_rejects_empty_and_null_byte() {
        assert!(quote_ident("").is_err());
        assert!(quote_ident("genre\0; DROP TABLE person").is_err());
    }

    #[test]
    fn test_rejects_long_identifier() {
        let long = "x".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_identifier(&long).is_err());
        assert!(validate_identifier(&long[..MAX_IDENTIFIER_LENGTH]).is_ok());
    }
}
