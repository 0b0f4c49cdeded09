//! Column decoding shared by the SQL repositories.
//!
//! `sqlx::Any` only decodes integers, floats, text and blobs, so dates,
//! timestamps and lists are stored as text and parsed here.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;

use crate::error::DbError;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn get_i64(row: &AnyRow, table: &'static str, column: &str) -> Result<i64, DbError> {
    row.try_get::<i64, _>(column).map_err(|e| DbError::DecodeError {
        table,
        message: format!("{}: {}", column, e),
    })
}

pub(crate) fn get_string(
    row: &AnyRow,
    table: &'static str,
    column: &str,
) -> Result<String, DbError> {
    row.try_get::<String, _>(column)
        .map_err(|e| DbError::DecodeError {
            table,
            message: format!("{}: {}", column, e),
        })
}

pub(crate) fn get_opt_string(row: &AnyRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column).ok().flatten()
}

pub(crate) fn get_opt_i64(row: &AnyRow, column: &str) -> Option<i64> {
    row.try_get::<Option<i64>, _>(column).ok().flatten()
}

pub(crate) fn get_date(
    row: &AnyRow,
    table: &'static str,
    column: &str,
) -> Result<NaiveDate, DbError> {
    let raw = get_string(row, table, column)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| DbError::DecodeError {
        table,
        message: format!("{} = {:?}: {}", column, raw, e),
    })
}

/// Timestamps are informational; an unparsable value decodes as `None`.
pub(crate) fn get_timestamp(row: &AnyRow, column: &str) -> Option<DateTime<Utc>> {
    get_opt_string(row, column)
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// A JSON array of strings; anything else decodes as empty.
pub(crate) fn get_string_list(row: &AnyRow, column: &str) -> Vec<String> {
    get_opt_string(row, column)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn encode_string_list(items: &[String]) -> Result<String, DbError> {
    serde_json::to_string(items).map_err(|e| DbError::QueryError(e.to_string()))
}
