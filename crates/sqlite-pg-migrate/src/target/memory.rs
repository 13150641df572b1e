//! In-memory target used by the orchestrator tests.
//!
//! Keeps the ids of every table it has seen, skips ids already present the
//! same way `ON CONFLICT ("id") DO NOTHING` does, and can check link rows
//! against the tables they reference.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use super::TargetWriter;
use crate::error::{MigrateError, Result};
use crate::mapping::RecordBatch;

#[derive(Default)]
pub(crate) struct MemoryWriter {
    tables: Mutex<BTreeMap<String, HashSet<Uuid>>>,
    pages: Mutex<Vec<(String, usize)>>,
    check_references: bool,
}

impl MemoryWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reject link rows whose film work, genre or person is not loaded yet.
    pub(crate) fn with_reference_checks() -> Self {
        Self {
            check_references: true,
            ..Self::default()
        }
    }

    pub(crate) fn ids(&self, schema: &str, table: &str) -> HashSet<Uuid> {
        self.tables
            .lock()
            .unwrap()
            .get(&format!("{}.{}", schema, table))
            .cloned()
            .unwrap_or_default()
    }

    /// `(table, rows)` for every page written, in order.
    pub(crate) fn pages(&self) -> Vec<(String, usize)> {
        self.pages.lock().unwrap().clone()
    }

    fn missing_reference(
        tables: &BTreeMap<String, HashSet<Uuid>>,
        schema: &str,
        batch: &RecordBatch,
    ) -> Option<String> {
        let has = |table: &str, id: &Uuid| {
            tables
                .get(&format!("{}.{}", schema, table))
                .is_some_and(|ids| ids.contains(id))
        };
        match batch {
            RecordBatch::GenreFilmWork(links) => links.iter().find_map(|l| {
                if !has("film_work", &l.film_work_id) {
                    Some(format!("film_work {}", l.film_work_id))
                } else if !has("genre", &l.genre_id) {
                    Some(format!("genre {}", l.genre_id))
                } else {
                    None
                }
            }),
            RecordBatch::PersonFilmWork(links) => links.iter().find_map(|l| {
                if !has("film_work", &l.film_work_id) {
                    Some(format!("film_work {}", l.film_work_id))
                } else if !has("person", &l.person_id) {
                    Some(format!("person {}", l.person_id))
                } else {
                    None
                }
            }),
            _ => None,
        }
    }
}

#[async_trait]
impl TargetWriter for MemoryWriter {
    async fn write_batch(&self, schema: &str, batch: &RecordBatch) -> Result<u64> {
        let table = batch.kind().table_name();
        let mut tables = self.tables.lock().unwrap();

        if self.check_references {
            if let Some(missing) = Self::missing_reference(&tables, schema, batch) {
                return Err(MigrateError::Validation(format!(
                    "{} references missing {}",
                    table, missing
                )));
            }
        }

        let ids = tables.entry(format!("{}.{}", schema, table)).or_default();
        let inserted = batch.ids().into_iter().filter(|id| ids.insert(*id)).count();

        self.pages
            .lock()
            .unwrap()
            .push((table.to_string(), batch.len()));
        Ok(inserted as u64)
    }

    async fn row_count(&self, schema: &str, table: &str) -> Result<i64> {
        Ok(self.ids(schema, table).len() as i64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}
