//! Migration orchestrator - main workflow coordinator.
//!
//! Tables are migrated one at a time and pages one at a time: a page is read,
//! mapped and written before the next is fetched. Each page is its own
//! statement; nothing spans more than one page-write, so an interrupted run
//! is finished by running again.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::mapping::{map_rows, RecordKind};
use crate::source::{SourceTable, SqliteReader};
use crate::target::{PgWriter, TargetWriter};

/// Migration orchestrator.
///
/// Owns both connections for its lifetime. Call [`Orchestrator::close`] when
/// done, whether or not the run succeeded.
pub struct Orchestrator {
    config: Config,
    source: SqliteReader,
    target: Arc<dyn TargetWriter>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status ("completed" or "dry_run").
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Tables migrated, in load order.
    pub tables_total: usize,

    /// Rows read from the source.
    pub rows_read: i64,

    /// Rows inserted into the target.
    pub rows_inserted: i64,

    /// Rows skipped because their id was already present.
    pub rows_skipped: i64,

    /// Average throughput (rows read per second).
    pub rows_per_second: i64,

    /// Per-table breakdown.
    pub tables: Vec<TableResult>,
}

/// Outcome for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    pub table: String,
    pub kind: RecordKind,
    /// Rows in the source table when the run started.
    pub source_rows: i64,
    pub rows_read: i64,
    pub rows_inserted: i64,
    pub rows_skipped: i64,
    pub pages: usize,
}

impl TableResult {
    fn new(kind: RecordKind, table: &SourceTable) -> Self {
        Self {
            table: table.name.clone(),
            kind,
            source_rows: table.row_count,
            rows_read: 0,
            rows_inserted: 0,
            rows_skipped: 0,
            pages: 0,
        }
    }

    fn record_page(&mut self, rows: usize, inserted: u64) {
        let rows = rows as i64;
        let inserted = inserted as i64;
        self.pages += 1;
        self.rows_read += rows;
        self.rows_inserted += inserted;
        self.rows_skipped += rows - inserted;
    }
}

/// Row counts for one table on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableValidation {
    pub table: String,
    pub source_rows: i64,
    pub target_rows: i64,
    /// Source rows capped at the configured per-table ceiling.
    pub expected_rows: i64,
    /// Whether the target holds at least `expected_rows` and at most
    /// `source_rows` rows.
    pub matches: bool,
}

/// Connectivity report for both databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    pub target_error: Option<String>,
    pub healthy: bool,
}

impl Orchestrator {
    /// Open the source file and connect to the target.
    pub async fn new(config: Config) -> Result<Self> {
        let source = SqliteReader::connect(&config.source).await?;
        let target = match PgWriter::connect(&config.target).await {
            Ok(target) => target,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };
        Ok(Self::with_connections(config, source, Arc::new(target)))
    }

    /// Build an orchestrator over already-open connections.
    pub fn with_connections(
        config: Config,
        source: SqliteReader,
        target: Arc<dyn TargetWriter>,
    ) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    /// Run the migration.
    ///
    /// With `dry_run`, tables are discovered and checked but no rows are read
    /// or written.
    pub async fn run(&self, dry_run: bool) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!("Starting migration run: {}", run_id);

        info!("Phase 1: Discovering source tables");
        let plan = self.plan().await?;
        info!(
            "Found {} tables to migrate: {}",
            plan.len(),
            plan.iter()
                .map(|(_, t)| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut tables = Vec::with_capacity(plan.len());
        if dry_run {
            for (kind, table) in &plan {
                info!("{}: {} rows (dry run)", table.name, table.row_count);
                tables.push(TableResult::new(*kind, table));
            }
        } else {
            info!(
                "Phase 2: Transferring data (page size {}, max {} rows per table)",
                self.config.migration.page_size, self.config.migration.max_range
            );
            for (kind, table) in &plan {
                let stats = self
                    .transfer_table(*kind, table)
                    .instrument(info_span!("transfer_table", table = %table.name))
                    .await?;
                tables.push(stats);
            }
        }

        let completed_at = Utc::now();
        let duration_seconds = timer.elapsed().as_secs_f64();
        let rows_read: i64 = tables.iter().map(|t| t.rows_read).sum();
        let rows_per_second = if duration_seconds > 0.0 {
            (rows_read as f64 / duration_seconds) as i64
        } else {
            0
        };

        let result = MigrationResult {
            run_id,
            status: if dry_run { "dry_run" } else { "completed" }.to_string(),
            duration_seconds,
            started_at,
            completed_at,
            tables_total: tables.len(),
            rows_read,
            rows_inserted: tables.iter().map(|t| t.rows_inserted).sum(),
            rows_skipped: tables.iter().map(|t| t.rows_skipped).sum(),
            rows_per_second,
            tables,
        };

        info!(
            "Migration {}: {} tables, {} rows read, {} inserted, {} skipped in {:.1}s",
            result.status,
            result.tables_total,
            result.rows_read,
            result.rows_inserted,
            result.rows_skipped,
            result.duration_seconds
        );

        Ok(result)
    }

    /// Resolve every source table to its record shape, in load order.
    ///
    /// A table without a record shape, or whose columns do not fit its
    /// shape, fails the whole plan before anything is written.
    async fn plan(&self) -> Result<Vec<(RecordKind, SourceTable)>> {
        let mut plan = Vec::new();
        for table in self.source.list_tables().await? {
            let kind = RecordKind::from_table_name(&table.name)?;
            kind.check_columns(&table.columns)?;
            plan.push((kind, table));
        }
        plan.sort_by_key(|(kind, _)| *kind);

        for kind in RecordKind::ALL {
            if !plan.iter().any(|(k, _)| *k == kind) {
                warn!("Table {} not present in source, skipping", kind);
            }
        }

        Ok(plan)
    }

    async fn transfer_table(&self, kind: RecordKind, table: &SourceTable) -> Result<TableResult> {
        let schema = &self.config.target.schema;
        let mut stats = TableResult::new(kind, table);
        let mut pages = self.source.read_pages(
            table,
            self.config.migration.page_size,
            self.config.migration.max_range,
        );

        while let Some(rows) = pages.try_next().await? {
            if rows.is_empty() {
                break;
            }
            let batch = map_rows(&table.name, &rows)?;
            let inserted = self.target.write_batch(schema, &batch).await?;
            stats.record_page(rows.len(), inserted);
            debug!(
                "{}: page {} ({} rows, {} inserted)",
                table.name,
                stats.pages,
                rows.len(),
                inserted
            );
        }

        info!(
            "{}: {} rows read, {} inserted, {} already present",
            table.name, stats.rows_read, stats.rows_inserted, stats.rows_skipped
        );
        Ok(stats)
    }

    /// Validate row counts between source and target.
    pub async fn validate(&self) -> Result<Vec<TableValidation>> {
        let schema = &self.config.target.schema;
        let ceiling = i64::try_from(self.config.migration.max_range).unwrap_or(i64::MAX);
        let mut results = Vec::new();

        for (_, table) in self.plan().await? {
            let source_rows = self.source.row_count(&table.name).await?;
            let target_rows = match self.target.row_count(schema, &table.name).await {
                Ok(n) => n,
                Err(e) => {
                    warn!("{}.{}: cannot count target rows: {}", schema, table.name, e);
                    0
                }
            };
            let expected_rows = source_rows.min(ceiling);
            let matches = (expected_rows..=source_rows).contains(&target_rows);

            if matches {
                info!(
                    "{}: {} rows (match, expected at least {})",
                    table.name, target_rows, expected_rows
                );
            } else {
                warn!(
                    "{}: source={} expected={} target={} (MISMATCH)",
                    table.name, source_rows, expected_rows, target_rows
                );
            }

            results.push(TableValidation {
                table: table.name,
                source_rows,
                target_rows,
                expected_rows,
                matches,
            });
        }

        Ok(results)
    }

    /// Test both connections independently.
    pub async fn health_check(config: &Config) -> HealthCheckResult {
        let start = Instant::now();
        let source_error = match SqliteReader::connect(&config.source).await {
            Ok(source) => {
                let pinged = source.ping().await;
                source.close().await;
                pinged.err()
            }
            Err(e) => Some(e),
        };
        let source_latency_ms = start.elapsed().as_millis() as u64;

        let start = Instant::now();
        let target_error = match PgWriter::connect(&config.target).await {
            Ok(target) => {
                target.close().await;
                None
            }
            Err(e) => Some(e),
        };
        let target_latency_ms = start.elapsed().as_millis() as u64;

        HealthCheckResult {
            source_connected: source_error.is_none(),
            source_latency_ms,
            target_connected: target_error.is_none(),
            target_latency_ms,
            healthy: source_error.is_none() && target_error.is_none(),
            source_error: source_error.map(|e| e.to_string()),
            target_error: target_error.map(|e| e.to_string()),
        }
    }

    /// Close both connections.
    pub async fn close(&self) {
        self.source.close().await;
        self.target.close().await;
        debug!("Closed source and target connections");
    }
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fail if any table's counts differ.
pub fn ensure_valid(results: &[TableValidation]) -> Result<()> {
    let mismatched: Vec<&str> = results
        .iter()
        .filter(|r| !r.matches)
        .map(|r| r.table.as_str())
        .collect();
    if mismatched.is_empty() {
        Ok(())
    } else {
        Err(MigrateError::Validation(format!(
            "row counts differ for: {}",
            mismatched.join(", ")
        )))
    }
}
