// src/repositories/settings_repository.rs
//
// System Settings Repository
//
// Raw key/value rows of `system_settings`. Values are stored as text and
// interpreted by the declared value_type; no coercion happens here.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Row};

use super::row_mapping::{conversion_error, timestamp_column};
use crate::db::ConnectionPool;
use crate::domain::{SettingRecord, SettingValueType};
use crate::error::AppResult;

const SETTING_COLUMNS: &str =
    "setting_key, setting_value, value_type, category, description, is_active, updated_at";

#[cfg_attr(test, mockall::automock)]
pub trait SettingsRepository: Send + Sync {
    /// Rows of one category, ordered by key
    fn list_by_category(&self, category: &str, active_only: bool) -> AppResult<Vec<SettingRecord>>;

    fn list_all(&self) -> AppResult<Vec<SettingRecord>>;

    fn get(&self, key: &str) -> AppResult<Option<SettingRecord>>;

    /// Insert or replace by key
    fn upsert(&self, record: &SettingRecord) -> AppResult<()>;

    /// Insert unless the key exists. Returns true when a row was written.
    fn insert_if_missing(&self, record: &SettingRecord) -> AppResult<bool>;
}

pub struct SqliteSettingsRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteSettingsRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_setting(row: &Row) -> rusqlite::Result<SettingRecord> {
        let raw_type: String = row.get("value_type")?;
        let value_type = raw_type
            .parse::<SettingValueType>()
            .map_err(|e| conversion_error(row, "value_type", e.to_string()))?;

        Ok(SettingRecord {
            key: row.get("setting_key")?,
            value: row.get("setting_value")?,
            value_type,
            category: row.get("category")?,
            description: row.get("description")?,
            is_active: row.get("is_active")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn query(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> AppResult<Vec<SettingRecord>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(args, Self::row_to_setting)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    fn list_by_category(&self, category: &str, active_only: bool) -> AppResult<Vec<SettingRecord>> {
        let sql = format!(
            "SELECT {} FROM system_settings WHERE category = ?1 {} ORDER BY setting_key",
            SETTING_COLUMNS,
            if active_only { "AND is_active = 1" } else { "" }
        );
        self.query(&sql, &[&category])
    }

    fn list_all(&self) -> AppResult<Vec<SettingRecord>> {
        let sql = format!(
            "SELECT {} FROM system_settings ORDER BY category, setting_key",
            SETTING_COLUMNS
        );
        self.query(&sql, &[])
    }

    fn get(&self, key: &str) -> AppResult<Option<SettingRecord>> {
        let conn = self.pool.get()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM system_settings WHERE setting_key = ?1",
                    SETTING_COLUMNS
                ),
                params![key],
                Self::row_to_setting,
            )
            .optional()?;
        Ok(record)
    }

    fn upsert(&self, record: &SettingRecord) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO system_settings ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                SETTING_COLUMNS
            ),
            params![
                record.key,
                record.value,
                record.value_type.as_str(),
                record.category,
                record.description,
                record.is_active,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn insert_if_missing(&self, record: &SettingRecord) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO system_settings ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                SETTING_COLUMNS
            ),
            params![
                record.key,
                record.value,
                record.value_type.as_str(),
                record.category,
                record.description,
                record.is_active,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted == 1)
    }
}
