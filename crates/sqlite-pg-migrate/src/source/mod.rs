//! SQLite source database operations.

mod types;

pub use types::*;

use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::quote_ident;
use crate::error::{MigrateError, Result};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// A page of raw source rows.
pub type Page = Vec<SqliteRow>;

/// Reader over the source SQLite file.
///
/// Holds a single connection: table scans run one at a time, each on its
/// own cursor.
pub struct SqliteReader {
    pool: SqlitePool,
}

impl SqliteReader {
    /// Open the SQLite file read-only.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        if !config.path.exists() {
            return Err(MigrateError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("SQLite file not found: {}", config.path.display()),
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await?;

        info!("Opened SQLite source: {}", config.path.display());
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List user tables with their columns and row counts.
    pub async fn list_tables(&self) -> Result<Vec<SourceTable>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = self.load_columns(&name).await?;
            let row_count = self.row_count(&name).await?;
            debug!("Found table {} ({} columns, {} rows)", name, columns.len(), row_count);
            tables.push(SourceTable::new(name, columns, row_count)?);
        }

        Ok(tables)
    }

    async fn load_columns(&self, table: &str) -> Result<Vec<String>> {
        let rows: Vec<SqliteRow> =
            sqlx::query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.iter().map(|r| r.get::<String, _>("name")).collect())
    }

    /// Get the row count for a table.
    pub async fn row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table)?);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Stream a table in pages of `page_size` rows.
    ///
    /// Every page is full except possibly the last. The stream ends when the
    /// table is exhausted or `max_rows` rows have been produced. Nothing is
    /// fetched until the stream is polled, and the stream cannot be restarted.
    pub fn read_pages<'a>(
        &'a self,
        table: &'a SourceTable,
        page_size: usize,
        max_rows: u64,
    ) -> BoxStream<'a, Result<Page>> {
        let limit = i64::try_from(max_rows).unwrap_or(i64::MAX);
        sqlx::query(table.scan_sql())
            .bind(limit)
            .fetch(&self.pool)
            .try_chunks(page_size.max(1))
            .map_err(|e| MigrateError::Source(e.1))
            .boxed()
    }

    /// Check the connection.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory SQLite with the five movie tables and `genres` rows in `genre`.
    pub(crate) async fn movies_db(genres: usize) -> SqliteReader {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        for ddl in [
            "CREATE TABLE genre (id TEXT PRIMARY KEY, name TEXT NOT NULL, description TEXT, \
             created_at TEXT, updated_at TEXT)",
            "CREATE TABLE person (id TEXT PRIMARY KEY, full_name TEXT NOT NULL, \
             created_at TEXT, updated_at TEXT)",
            "CREATE TABLE film_work (id TEXT PRIMARY KEY, title TEXT NOT NULL, description TEXT, \
             creation_date DATE, file_path TEXT, rating FLOAT, type TEXT NOT NULL, \
             created_at TEXT, updated_at TEXT)",
            "CREATE TABLE genre_film_work (id TEXT PRIMARY KEY, film_work_id TEXT NOT NULL, \
             genre_id TEXT NOT NULL, created_at TEXT)",
            "CREATE TABLE person_film_work (id TEXT PRIMARY KEY, film_work_id TEXT NOT NULL, \
             person_id TEXT NOT NULL, role TEXT NOT NULL, created_at TEXT)",
        ] {
            sqlx::query(ddl).execute(&pool).await.unwrap();
        }

        for i in 0..genres {
            sqlx::query(
                "INSERT INTO genre VALUES (?, ?, NULL, '2021-06-16 20:14:09.221838+00', \
                 '2021-06-16 20:14:09.221838+00')",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(format!("Genre {}", i))
            .execute(&pool)
            .await
            .unwrap();
        }

        SqliteReader::from_pool(pool)
    }

    async fn genre_table(reader: &SqliteReader) -> SourceTable {
        reader
            .list_tables()
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.name == "genre")
            .unwrap()
    }

    async fn page_sizes(reader: &SqliteReader, page_size: usize, max_rows: u64) -> Vec<usize> {
        let table = genre_table(reader).await;
        let pages: Vec<Page> = reader
            .read_pages(&table, page_size, max_rows)
            .try_collect()
            .await
            .unwrap();
        pages.iter().map(Vec::len).collect()
    }

    #[tokio::test]
    async fn test_list_tables() {
        let reader = movies_db(3).await;
        let tables = reader.list_tables().await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["film_work", "genre", "genre_film_work", "person", "person_film_work"]
        );

        let genre = tables.iter().find(|t| t.name == "genre").unwrap();
        assert_eq!(genre.row_count, 3);
        assert_eq!(
            genre.columns,
            vec!["id", "name", "description", "created_at", "updated_at"]
        );
    }

    #[tokio::test]
    async fn test_list_tables_skips_internal_tables() {
        let reader = movies_db(0).await;
        sqlx::query("CREATE TABLE counter (n INTEGER PRIMARY KEY AUTOINCREMENT)")
            .execute(&reader.pool)
            .await
            .unwrap();
        let tables = reader.list_tables().await.unwrap();
        assert!(tables.iter().any(|t| t.name == "counter"));
        assert!(!tables.iter().any(|t| t.name.starts_with("sqlite_")));
    }

    #[tokio::test]
    async fn test_exact_page_boundary() {
        let reader = movies_db(1000).await;
        assert_eq!(page_sizes(&reader, 1000, 10_000_000).await, vec![1000]);
    }

    #[tokio::test]
    async fn test_one_past_page_boundary() {
        let reader = movies_db(1001).await;
        assert_eq!(page_sizes(&reader, 1000, 10_000_000).await, vec![1000, 1]);
    }

    #[tokio::test]
    async fn test_ceiling_caps_rows_read() {
        let reader = movies_db(1000).await;
        assert_eq!(page_sizes(&reader, 1000, 500).await, vec![500]);
        assert_eq!(page_sizes(&reader, 200, 500).await, vec![200, 200, 100]);
    }

    #[tokio::test]
    async fn test_empty_table_yields_no_pages() {
        let reader = movies_db(0).await;
        assert!(page_sizes(&reader, 1000, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_propagates_source_error() {
        let reader = movies_db(0).await;
        let ghost = SourceTable::new("ghost", vec!["id".into()], 0).unwrap();
        let result: Result<Vec<Page>> = reader.read_pages(&ghost, 10, 10).try_collect().await;
        assert!(matches!(result, Err(MigrateError::Source(_))));
    }

    #[tokio::test]
    async fn test_connect_missing_file() {
        let config = SourceConfig {
            path: "/nonexistent/dir/db.sqlite".into(),
        };
        let err = SqliteReader::connect(&config).await.err().unwrap();
        assert!(matches!(err, MigrateError::Io(_)));
    }
}
