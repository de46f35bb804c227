// src/repositories/parcel_repository.rs
//
// Parcel Repository
//
// Dumb mapper between Parcel and the `parcels` table. Uniqueness of the
// tracking number is left to the UNIQUE constraint; callers translate the
// constraint error.

use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use super::row_mapping::{
    enum_column, opt_enum_column, opt_timestamp_column, timestamp_column, uuid_column,
};
use crate::db::ConnectionPool;
use crate::domain::{Parcel, ParcelStatus};
use crate::error::AppResult;

const PARCEL_COLUMNS: &str = "id, tracking_number, status, has_damage, damage_severity,
    auto_resolved, resolution_action, auto_resolution_reason,
    received_at, inspected_at, completed_at, updated_at";

/// Listing filter; every field is optional and combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParcelFilter {
    pub status: Option<ParcelStatus>,
    pub has_damage: Option<bool>,

    /// Substring match on the tracking number
    pub search: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait ParcelRepository: Send + Sync {
    fn insert(&self, parcel: &Parcel) -> AppResult<()>;

    /// Overwrite every mutable column of an existing parcel
    fn update(&self, parcel: &Parcel) -> AppResult<()>;

    /// `update` for every parcel, in one transaction
    fn update_many(&self, parcels: &[Parcel]) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Parcel>>;

    fn get_by_tracking_number(&self, tracking_number: &str) -> AppResult<Option<Parcel>>;

    /// Newest first
    fn list(&self, filter: &ParcelFilter, limit: u32, offset: u32) -> AppResult<Vec<Parcel>>;

    fn count(&self, filter: &ParcelFilter) -> AppResult<u64>;
}

pub struct SqliteParcelRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteParcelRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    pub(crate) fn row_to_parcel(row: &Row) -> rusqlite::Result<Parcel> {
        Ok(Parcel {
            id: uuid_column(row, "id")?,
            tracking_number: row.get("tracking_number")?,
            status: enum_column(row, "status")?,
            has_damage: row.get("has_damage")?,
            damage_severity: opt_enum_column(row, "damage_severity")?,
            auto_resolved: row.get("auto_resolved")?,
            resolution_action: opt_enum_column(row, "resolution_action")?,
            auto_resolution_reason: row.get("auto_resolution_reason")?,
            received_at: timestamp_column(row, "received_at")?,
            inspected_at: opt_timestamp_column(row, "inspected_at")?,
            completed_at: opt_timestamp_column(row, "completed_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn write_update(conn: &Connection, parcel: &Parcel) -> AppResult<()> {
        conn.execute(
            "UPDATE parcels SET
                status = ?1, has_damage = ?2, damage_severity = ?3, auto_resolved = ?4,
                resolution_action = ?5, auto_resolution_reason = ?6, inspected_at = ?7,
                completed_at = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                parcel.status.as_str(),
                parcel.has_damage,
                parcel.damage_severity.map(|s| s.as_str()),
                parcel.auto_resolved,
                parcel.resolution_action.map(|a| a.as_str()),
                parcel.auto_resolution_reason,
                parcel.inspected_at.map(|t| t.to_rfc3339()),
                parcel.completed_at.map(|t| t.to_rfc3339()),
                parcel.updated_at.to_rfc3339(),
                parcel.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// WHERE clause and its positional values for a filter
    fn filter_clause(filter: &ParcelFilter) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(status) = filter.status {
            values.push(Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", values.len()));
        }
        if let Some(has_damage) = filter.has_damage {
            values.push(Value::Integer(i64::from(has_damage)));
            conditions.push(format!("has_damage = ?{}", values.len()));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            values.push(Value::Text(format!("%{}%", search)));
            conditions.push(format!("tracking_number LIKE ?{}", values.len()));
        }

        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), values)
        }
    }
}

impl ParcelRepository for SqliteParcelRepository {
    fn insert(&self, parcel: &Parcel) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            &format!(
                "INSERT INTO parcels ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                PARCEL_COLUMNS
            ),
            params![
                parcel.id.to_string(),
                parcel.tracking_number,
                parcel.status.as_str(),
                parcel.has_damage,
                parcel.damage_severity.map(|s| s.as_str()),
                parcel.auto_resolved,
                parcel.resolution_action.map(|a| a.as_str()),
                parcel.auto_resolution_reason,
                parcel.received_at.to_rfc3339(),
                parcel.inspected_at.map(|t| t.to_rfc3339()),
                parcel.completed_at.map(|t| t.to_rfc3339()),
                parcel.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, parcel: &Parcel) -> AppResult<()> {
        let conn = self.pool.get()?;
        Self::write_update(&conn, parcel)
    }

    fn update_many(&self, parcels: &[Parcel]) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for parcel in parcels {
            Self::write_update(&tx, parcel)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Parcel>> {
        let conn = self.pool.get()?;
        let parcel = conn
            .query_row(
                &format!("SELECT {} FROM parcels WHERE id = ?1", PARCEL_COLUMNS),
                params![id.to_string()],
                Self::row_to_parcel,
            )
            .optional()?;
        Ok(parcel)
    }

    fn get_by_tracking_number(&self, tracking_number: &str) -> AppResult<Option<Parcel>> {
        let conn = self.pool.get()?;
        let parcel = conn
            .query_row(
                &format!(
                    "SELECT {} FROM parcels WHERE tracking_number = ?1",
                    PARCEL_COLUMNS
                ),
                params![tracking_number],
                Self::row_to_parcel,
            )
            .optional()?;
        Ok(parcel)
    }

    fn list(&self, filter: &ParcelFilter, limit: u32, offset: u32) -> AppResult<Vec<Parcel>> {
        let conn = self.pool.get()?;
        let (where_clause, mut values) = Self::filter_clause(filter);

        values.push(Value::Integer(i64::from(limit)));
        let limit_idx = values.len();
        values.push(Value::Integer(i64::from(offset)));
        let offset_idx = values.len();

        let sql = format!(
            "SELECT {} FROM parcels{} ORDER BY received_at DESC, id LIMIT ?{} OFFSET ?{}",
            PARCEL_COLUMNS, where_clause, limit_idx, offset_idx
        );

        let mut stmt = conn.prepare(&sql)?;
        let parcels = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_parcel)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parcels)
    }

    fn count(&self, filter: &ParcelFilter) -> AppResult<u64> {
        let conn = self.pool.get()?;
        let (where_clause, values) = Self::filter_clause(filter);
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM parcels{}", where_clause),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }
}
