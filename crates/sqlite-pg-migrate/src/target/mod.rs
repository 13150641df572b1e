//! PostgreSQL target database operations.

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{types::ToSql, NoTls};
use tracing::{debug, error, info};

use crate::config::TargetConfig;
use crate::core::{qualify, quote_ident, ColumnSpec, Record};
use crate::error::{MigrateError, Result};
use crate::mapping::RecordBatch;

/// Trait for target database operations.
#[async_trait]
pub trait TargetWriter: Send + Sync {
    /// Insert a page of records into `schema.<table>` in one statement.
    ///
    /// Rows whose primary key already exists are skipped. Returns the number
    /// of rows actually inserted.
    async fn write_batch(&self, schema: &str, batch: &RecordBatch) -> Result<u64>;

    /// Get the row count for a table.
    async fn row_count(&self, schema: &str, table: &str) -> Result<i64>;

    /// Check the connection.
    async fn ping(&self) -> Result<()>;

    /// Close all connections.
    async fn close(&self);
}

/// PostgreSQL writer over a single pooled connection.
pub struct PgWriter {
    pool: Pool,
}

impl PgWriter {
    /// Connect to PostgreSQL and verify the connection.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let mgr = Manager::from_config(config.pg_config(), NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(1)
            .build()
            .map_err(|e| MigrateError::pool(e.to_string(), "creating PostgreSQL pool"))?;

        let writer = Self { pool };
        writer.ping().await?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(writer)
    }

    async fn client(&self, context: &str) -> Result<deadpool_postgres::Client> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e.to_string(), context))
    }

    async fn insert_records<R: Record>(&self, schema: &str, records: &[R]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = build_insert_sql(schema, R::TABLE, R::COLUMNS, records.len())?;
        let params: Vec<&(dyn ToSql + Sync)> =
            records.iter().flat_map(|r| r.params()).collect();

        let client = self.client("write_batch").await?;
        match client.execute(&sql, &params).await {
            Ok(inserted) => {
                debug!(
                    "{}.{}: inserted {} of {} rows",
                    schema,
                    R::TABLE,
                    inserted,
                    records.len()
                );
                Ok(inserted)
            }
            Err(e) => {
                let first_ids: Vec<String> =
                    records.iter().take(5).map(|r| r.id().to_string()).collect();
                error!(
                    "Insert failed for {}.{}: {} - first ids: {:?}",
                    schema, R::TABLE, e, first_ids
                );
                Err(MigrateError::Target(e))
            }
        }
    }
}

#[async_trait]
impl TargetWriter for PgWriter {
    async fn write_batch(&self, schema: &str, batch: &RecordBatch) -> Result<u64> {
        match batch {
            RecordBatch::Genre(v) => self.insert_records(schema, v).await,
            RecordBatch::Person(v) => self.insert_records(schema, v).await,
            RecordBatch::FilmWork(v) => self.insert_records(schema, v).await,
            RecordBatch::GenreFilmWork(v) => self.insert_records(schema, v).await,
            RecordBatch::PersonFilmWork(v) => self.insert_records(schema, v).await,
        }
    }

    async fn row_count(&self, schema: &str, table: &str) -> Result<i64> {
        let client = self.client("row_count").await?;
        let sql = format!("SELECT COUNT(*) FROM {}", qualify(schema, table)?);
        let row = client.query_one(&sql, &[]).await?;
        Ok(row.get(0))
    }

    async fn ping(&self) -> Result<()> {
        let client = self.client("ping").await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close();
    }
}

/// Build a multi-row INSERT that skips rows whose `id` already exists.
///
/// Placeholders are numbered row-major: row `r`, column `c` binds
/// `$(r * columns.len() + c + 1)`.
fn build_insert_sql(
    schema: &str,
    table: &str,
    columns: &[ColumnSpec],
    rows: usize,
) -> Result<String> {
    let col_list = columns
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    let width = columns.len();
    let placeholders: Vec<String> = (0..rows)
        .map(|r| {
            let row: Vec<String> = (1..=width).map(|c| format!("${}", r * width + c)).collect();
            format!("({})", row.join(", "))
        })
        .collect();

    Ok(format!(
        "INSERT INTO {} ({}) VALUES {} ON CONFLICT (\"id\") DO NOTHING",
        qualify(schema, table)?,
        col_list,
        placeholders.join(", ")
    ))
}
