//! Source table metadata.

use serde::{Deserialize, Serialize};

use crate::core::quote_ident;
use crate::error::Result;

/// A table discovered in the SQLite catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTable {
    /// Table name.
    pub name: String,

    /// Column names, in declaration order.
    pub columns: Vec<String>,

    /// Row count at discovery time.
    pub row_count: i64,

    #[serde(skip)]
    scan_sql: String,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, row_count: i64) -> Result<Self> {
        let name = name.into();
        let scan_sql = build_scan_sql(&name, &columns)?;
        Ok(Self {
            name,
            columns,
            row_count,
            scan_sql,
        })
    }

    /// Full-table scan with the row ceiling as its single parameter.
    pub(crate) fn scan_sql(&self) -> &str {
        &self.scan_sql
    }
}

fn build_scan_sql(table: &str, columns: &[String]) -> Result<String> {
    let col_list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Result<Vec<_>>>()?
            .join(", ")
    };
    Ok(format!(
        "SELECT {} FROM {} LIMIT ?",
        col_list,
        quote_ident(table)?
    ))
}
