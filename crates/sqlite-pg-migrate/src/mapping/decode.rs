//! Name-based column access on raw SQLite rows.
//!
//! SQLite is loosely typed, so values are read without sqlx's declared-type
//! check and converted here: UUIDs and timestamps arrive as TEXT, ratings as
//! REAL or INTEGER.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::core::ColumnSpec;
use crate::error::{MigrateError, Result};

/// Accepted timestamp spellings with an offset, tried in order after RFC 3339.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Accepted timestamp spellings without an offset (read as UTC).
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A raw row seen through the column names of one record shape.
pub struct RowView<'r> {
    table: &'static str,
    row: &'r SqliteRow,
}

impl<'r> RowView<'r> {
    pub fn new(table: &'static str, row: &'r SqliteRow) -> Self {
        Self { table, row }
    }

    fn index_of(&self, spec: &ColumnSpec) -> Result<usize> {
        let columns = self.row.columns();
        spec.source_names()
            .find_map(|name| columns.iter().position(|c| c.name() == name))
            .ok_or_else(|| {
                MigrateError::mapping(self.table, format!("column '{}' not found", spec.name))
            })
    }

    /// Column value as text; NULL becomes `None`.
    pub fn opt_text(&self, spec: &ColumnSpec) -> Result<Option<String>> {
        let idx = self.index_of(spec)?;
        self.row
            .try_get_unchecked::<Option<String>, _>(idx)
            .map_err(|e| self.decode_error(spec, e))
    }

    /// Column value as text; NULL is an error.
    pub fn text(&self, spec: &ColumnSpec) -> Result<String> {
        self.opt_text(spec)?
            .ok_or_else(|| self.null_error(spec))
    }

    /// Column value as a UUID in its textual form.
    pub fn uuid(&self, spec: &ColumnSpec) -> Result<Uuid> {
        let raw = self.text(spec)?;
        parse_uuid(&raw).ok_or_else(|| {
            MigrateError::mapping(
                self.table,
                format!("column '{}' is not a UUID: {:?}", spec.name, raw),
            )
        })
    }

    /// Column value as a float; NULL and empty text become `None`.
    ///
    /// REAL and INTEGER values are taken as-is. TEXT must parse as a number.
    pub fn opt_f64(&self, spec: &ColumnSpec) -> Result<Option<f64>> {
        let idx = self.index_of(spec)?;
        let value = self
            .row
            .try_get_raw(idx)
            .map_err(|e| self.decode_error(spec, e))?;
        if value.is_null() {
            return Ok(None);
        }
        let storage = value.type_info().name().to_string();

        match storage.as_str() {
            "REAL" | "INTEGER" => self
                .row
                .try_get_unchecked::<f64, _>(idx)
                .map(Some)
                .map_err(|e| self.decode_error(spec, e)),
            "TEXT" => {
                let raw = self.text(spec)?;
                if raw.trim().is_empty() {
                    return Ok(None);
                }
                raw.trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| self.format_error(spec, "number", &raw))
            }
            other => Err(MigrateError::mapping(
                self.table,
                format!("column '{}' holds {} where a number is expected", spec.name, other),
            )),
        }
    }

    /// Column value as a calendar date; NULL and empty text become `None`.
    pub fn opt_date(&self, spec: &ColumnSpec) -> Result<Option<NaiveDate>> {
        match self.opt_text(spec)? {
            Some(raw) if !raw.trim().is_empty() => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| self.format_error(spec, "date", &raw)),
            _ => Ok(None),
        }
    }

    /// Column value as a timestamp; NULL and empty text become `None`.
    pub fn opt_timestamp(&self, spec: &ColumnSpec) -> Result<Option<DateTime<Utc>>> {
        match self.opt_text(spec)? {
            Some(raw) if !raw.trim().is_empty() => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| self.format_error(spec, "timestamp", &raw)),
            _ => Ok(None),
        }
    }

    fn null_error(&self, spec: &ColumnSpec) -> MigrateError {
        MigrateError::mapping(self.table, format!("column '{}' is NULL", spec.name))
    }

    fn decode_error(&self, spec: &ColumnSpec, err: sqlx::Error) -> MigrateError {
        MigrateError::mapping(self.table, format!("column '{}': {}", spec.name, err))
    }

    fn format_error(&self, spec: &ColumnSpec, kind: &str, raw: &str) -> MigrateError {
        MigrateError::mapping(
            self.table,
            format!("column '{}' is not a {}: {:?}", spec.name, kind, raw),
        )
    }
}

pub(crate) fn parse_uuid(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    None
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    parse_timestamp(raw).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_timestamp_short_offset() {
        let dt = parse_timestamp("2021-06-16 20:14:09.221838+00").unwrap();
        assert_eq!(dt.year(), 2021);
        assert_eq!(dt.hour(), 20);
        assert_eq!(dt.nanosecond(), 221_838_000);
    }

    #[test]
    fn test_parse_timestamp_converts_offset_to_utc() {
        let dt = parse_timestamp("2021-06-16 23:14:09+03:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2021, 6, 16, 20, 14, 9).unwrap());
    }

    #[test]
    fn test_parse_timestamp_rfc3339_and_naive() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2020-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2020-01-02 03:04:05"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_date() {
        let d = NaiveDate::from_ymd_opt(1999, 3, 31).unwrap();
        assert_eq!(parse_date("1999-03-31"), Some(d));
        assert_eq!(parse_date("1999-03-31 10:00:00+00"), Some(d));
        assert_eq!(parse_date("31/03/1999"), None);
    }

    #[test]
    fn test_parse_uuid() {
        let id = parse_uuid(" 3d825f60-9fff-4dfe-b294-1a45fa1e115d ").unwrap();
        assert_eq!(id.to_string(), "3d825f60-9fff-4dfe-b294-1a45fa1e115d");
        assert!(parse_uuid("42").is_none());
    }
}
