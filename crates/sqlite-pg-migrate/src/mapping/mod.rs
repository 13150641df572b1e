//! Table name to record shape resolution, and row conversion.

mod decode;

pub use decode::RowView;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row};
use std::fmt;
use uuid::Uuid;

use crate::core::{ColumnSpec, FilmWork, Genre, GenreFilmWork, Person, PersonFilmWork, Record};
use crate::error::{MigrateError, Result};

/// The record shape a table's rows are converted into.
///
/// Variants are declared in load order: referenced tables before the link
/// tables whose foreign keys point at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Genre,
    Person,
    FilmWork,
    GenreFilmWork,
    PersonFilmWork,
}

impl RecordKind {
    /// Every kind, in load order.
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Genre,
        RecordKind::Person,
        RecordKind::FilmWork,
        RecordKind::GenreFilmWork,
        RecordKind::PersonFilmWork,
    ];

    /// Resolve a source table name.
    pub fn from_table_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.table_name() == name)
            .ok_or_else(|| MigrateError::UnknownTable(name.to_string()))
    }

    /// Source and destination table name.
    pub fn table_name(self) -> &'static str {
        match self {
            RecordKind::Genre => Genre::TABLE,
            RecordKind::Person => Person::TABLE,
            RecordKind::FilmWork => FilmWork::TABLE,
            RecordKind::GenreFilmWork => GenreFilmWork::TABLE,
            RecordKind::PersonFilmWork => PersonFilmWork::TABLE,
        }
    }

    /// Columns of the record shape, in insert order.
    pub fn columns(self) -> &'static [ColumnSpec] {
        match self {
            RecordKind::Genre => Genre::COLUMNS,
            RecordKind::Person => Person::COLUMNS,
            RecordKind::FilmWork => FilmWork::COLUMNS,
            RecordKind::GenreFilmWork => GenreFilmWork::COLUMNS,
            RecordKind::PersonFilmWork => PersonFilmWork::COLUMNS,
        }
    }

    /// Check a source column list against the record shape.
    ///
    /// The counts must match and every record column must be present
    /// (under its name or an alias).
    pub fn check_columns<S: AsRef<str>>(self, source_columns: &[S]) -> Result<()> {
        let table = self.table_name();
        let expected = self.columns();

        if source_columns.len() != expected.len() {
            return Err(MigrateError::mapping(
                table,
                format!(
                    "expected {} columns, source has {}",
                    expected.len(),
                    source_columns.len()
                ),
            ));
        }

        for spec in expected {
            let hits = source_columns
                .iter()
                .filter(|c| spec.matches(c.as_ref()))
                .count();
            match hits {
                1 => {}
                0 => {
                    return Err(MigrateError::mapping(
                        table,
                        format!("column '{}' not found", spec.name),
                    ))
                }
                _ => {
                    return Err(MigrateError::mapping(
                        table,
                        format!("column '{}' is ambiguous", spec.name),
                    ))
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A page of typed records, all of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBatch {
    Genre(Vec<Genre>),
    Person(Vec<Person>),
    FilmWork(Vec<FilmWork>),
    GenreFilmWork(Vec<GenreFilmWork>),
    PersonFilmWork(Vec<PersonFilmWork>),
}

impl RecordBatch {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordBatch::Genre(_) => RecordKind::Genre,
            RecordBatch::Person(_) => RecordKind::Person,
            RecordBatch::FilmWork(_) => RecordKind::FilmWork,
            RecordBatch::GenreFilmWork(_) => RecordKind::GenreFilmWork,
            RecordBatch::PersonFilmWork(_) => RecordKind::PersonFilmWork,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Genre(v) => v.len(),
            RecordBatch::Person(v) => v.len(),
            RecordBatch::FilmWork(v) => v.len(),
            RecordBatch::GenreFilmWork(v) => v.len(),
            RecordBatch::PersonFilmWork(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Primary keys of the batch, in row order.
    pub fn ids(&self) -> Vec<Uuid> {
        fn ids_of<R: Record>(records: &[R]) -> Vec<Uuid> {
            records.iter().map(Record::id).collect()
        }
        match self {
            RecordBatch::Genre(v) => ids_of(v),
            RecordBatch::Person(v) => ids_of(v),
            RecordBatch::FilmWork(v) => ids_of(v),
            RecordBatch::GenreFilmWork(v) => ids_of(v),
            RecordBatch::PersonFilmWork(v) => ids_of(v),
        }
    }
}

/// Convert a page of raw rows from `table_name` into typed records.
///
/// Fails on a table with no record shape, on a row whose column count
/// differs from the shape, and on any column that cannot be decoded.
pub fn map_rows(table_name: &str, rows: &[SqliteRow]) -> Result<RecordBatch> {
    let kind = RecordKind::from_table_name(table_name)?;
    Ok(match kind {
        RecordKind::Genre => RecordBatch::Genre(map_all(rows)?),
        RecordKind::Person => RecordBatch::Person(map_all(rows)?),
        RecordKind::FilmWork => RecordBatch::FilmWork(map_all(rows)?),
        RecordKind::GenreFilmWork => RecordBatch::GenreFilmWork(map_all(rows)?),
        RecordKind::PersonFilmWork => RecordBatch::PersonFilmWork(map_all(rows)?),
    })
}

fn map_all<R: Record>(rows: &[SqliteRow]) -> Result<Vec<R>> {
    rows.iter()
        .map(|row| {
            let arity = row.columns().len();
            if arity != R::COLUMNS.len() {
                let names: Vec<&str> = row.columns().iter().map(|c| c.name()).collect();
                return Err(MigrateError::mapping(
                    R::TABLE,
                    format!(
                        "row has {} columns {:?}, expected {}",
                        arity,
                        names,
                        R::COLUMNS.len()
                    ),
                ));
            }
            R::from_row(&RowView::new(R::TABLE, row))
        })
        .collect()
}
