// src/repositories/row_mapping.rs
//
// Column decoding shared by the SQLite repositories.
//
// Every parse failure is an explicit FromSqlConversionFailure naming the
// column and the offending value. Nothing falls back to a default.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{ErrorCode, Row};
use uuid::Uuid;

use crate::error::AppError;

pub(crate) fn conversion_error(row: &Row, column: &str, message: String) -> rusqlite::Error {
    let idx = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

pub(crate) fn uuid_column(row: &Row, column: &str) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(column)?;
    Uuid::parse_str(&raw)
        .map_err(|e| conversion_error(row, column, format!("Invalid UUID '{}': {}", raw, e)))
}

pub(crate) fn opt_uuid_column(row: &Row, column: &str) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|value| {
        Uuid::parse_str(&value)
            .map_err(|e| conversion_error(row, column, format!("Invalid UUID '{}': {}", value, e)))
    })
    .transpose()
}

fn parse_timestamp(row: &Row, column: &str, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            conversion_error(
                row,
                column,
                format!("Invalid {} timestamp '{}': {}", column, raw, e),
            )
        })
}

pub(crate) fn timestamp_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_timestamp(row, column, &raw)
}

pub(crate) fn opt_timestamp_column(
    row: &Row,
    column: &str,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|value| parse_timestamp(row, column, &value))
        .transpose()
}

/// Decode a text column through the type's `FromStr`
pub(crate) fn enum_column<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.get(column)?;
    raw.parse::<T>()
        .map_err(|e| conversion_error(row, column, e.to_string()))
}

pub(crate) fn opt_enum_column<T>(row: &Row, column: &str) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = row.get(column)?;
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| conversion_error(row, column, e.to_string()))
    })
    .transpose()
}

/// Non-negative integer column stored as INTEGER
pub(crate) fn count_column(row: &Row, column: &str) -> rusqlite::Result<u32> {
    let raw: i64 = row.get(column)?;
    u32::try_from(raw)
        .map_err(|_| conversion_error(row, column, format!("Invalid count {} in {}", raw, column)))
}

/// True when the error is a UNIQUE / CHECK / FK constraint rejection
pub fn is_constraint_violation(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation
    )
}
