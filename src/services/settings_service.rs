// src/services/settings_service.rs
//
// Settings Provider
//
// Supplies raw setting rows per category. Every evaluation loads a fresh
// snapshot through `load`; nothing is cached between calls.

use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::domain::{
    AutoResolutionSettings, ConfigError, SettingRecord, AUTO_RESOLUTION_CATEGORY,
};
use crate::error::{AppError, AppResult};
use crate::repositories::SettingsRepository;

/// Source of configuration snapshots
#[cfg_attr(test, mockall::automock)]
pub trait SettingsProvider: Send + Sync {
    /// Active rows of one category, read in a single query
    fn load(&self, category: &str) -> AppResult<Vec<SettingRecord>>;
}

/// Load and coerce the auto-resolution snapshot
pub fn load_auto_resolution_settings(
    provider: &dyn SettingsProvider,
) -> AppResult<AutoResolutionSettings> {
    let records = provider.load(AUTO_RESOLUTION_CATEGORY)?;
    Ok(AutoResolutionSettings::from_records(&records)?)
}

pub struct SettingsService {
    settings_repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(settings_repo: Arc<dyn SettingsRepository>) -> Self {
        Self { settings_repo }
    }

    /// Insert the default auto-resolution rows that are missing
    ///
    /// Existing rows are never overwritten. Returns how many rows were added.
    pub fn seed_defaults(&self) -> AppResult<usize> {
        let mut inserted = 0;
        for record in AutoResolutionSettings::default_records() {
            if self.settings_repo.insert_if_missing(&record)? {
                inserted += 1;
            }
        }
        if inserted > 0 {
            info!("Seeded {} default settings", inserted);
        }
        Ok(inserted)
    }

    /// All rows of a category (inactive included), or every row
    pub fn list_settings(&self, category: Option<&str>) -> AppResult<Vec<SettingRecord>> {
        match category {
            Some(category) => self.settings_repo.list_by_category(category, false),
            None => self.settings_repo.list_all(),
        }
    }

    /// Replace a setting value after checking it coerces to its declared type
    ///
    /// Known auto-resolution keys that are not stored yet are created with
    /// their declared type. Unknown keys that are not stored are NotFound.
    pub fn update_setting(&self, key: &str, value: &str) -> AppResult<SettingRecord> {
        let mut record = match self.settings_repo.get(key)? {
            Some(existing) => existing,
            None => {
                let value_type = AutoResolutionSettings::expected_type(key)
                    .ok_or_else(|| AppError::not_found("Setting", key))?;
                SettingRecord::new(key, value, value_type, AUTO_RESOLUTION_CATEGORY, None)
            }
        };

        if record.category == AUTO_RESOLUTION_CATEGORY {
            if let Some(expected) = AutoResolutionSettings::expected_type(key) {
                if expected != record.value_type {
                    return Err(ConfigError::TypeMismatch {
                        key: key.to_string(),
                        expected,
                        declared: record.value_type,
                    }
                    .into());
                }
            }
        }

        record.value = value.to_string();
        record.coerce()?;
        record.updated_at = Utc::now();

        self.settings_repo.upsert(&record)?;
        info!("Setting '{}' updated to '{}'", key, value);
        Ok(record)
    }
}

impl SettingsProvider for SettingsService {
    fn load(&self, category: &str) -> AppResult<Vec<SettingRecord>> {
        self.settings_repo.list_by_category(category, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::domain::SettingValueType;
    use crate::error::ErrorKind;
    use crate::repositories::{MockSettingsRepository, SqliteSettingsRepository};

    fn service() -> (SettingsService, tempfile::TempDir) {
        let (pool, dir) = create_test_pool();
        let repo = Arc::new(SqliteSettingsRepository::new(Arc::new(pool)));
        (SettingsService::new(repo), dir)
    }

    #[test]
    fn test_seed_defaults_is_idempotent() {
        let (service, _dir) = service();
        assert_eq!(service.seed_defaults().unwrap(), 6);
        assert_eq!(service.seed_defaults().unwrap(), 0);

        let snapshot = load_auto_resolution_settings(&service).unwrap();
        assert_eq!(snapshot, AutoResolutionSettings::default());
    }

    #[test]
    fn test_update_is_visible_to_next_load() {
        let (service, _dir) = service();
        service.seed_defaults().unwrap();

        service
            .update_setting("min_images_for_auto_resolution", "4")
            .unwrap();
        let snapshot = load_auto_resolution_settings(&service).unwrap();
        assert_eq!(snapshot.min_images_for_auto_resolution, 4.0);
    }

    #[test]
    fn test_update_rejects_uncoercible_value() {
        let (service, _dir) = service();
        service.seed_defaults().unwrap();

        let err = service
            .update_setting("auto_approve_enabled", "maybe")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let stored = service.list_settings(Some(AUTO_RESOLUTION_CATEGORY)).unwrap();
        let enabled = stored
            .iter()
            .find(|r| r.key == "auto_approve_enabled")
            .unwrap();
        assert_eq!(enabled.value, "true");
    }

    #[test]
    fn test_update_known_key_without_row_creates_it() {
        let (service, _dir) = service();
        let record = service
            .update_setting("auto_approve_confidence_threshold", "0.9")
            .unwrap();
        assert_eq!(record.value_type, SettingValueType::Number);
        assert_eq!(service.list_settings(None).unwrap().len(), 1);
    }

    #[test]
    fn test_update_unknown_key_is_not_found() {
        let (service, _dir) = service();
        let err = service.update_setting("no_such_key", "1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_load_requests_active_rows_only() {
        let mut repo = MockSettingsRepository::new();
        repo.expect_list_by_category()
            .withf(|category, active_only| category.to_string() == "auto_resolution" && *active_only)
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let service = SettingsService::new(Arc::new(repo));
        assert!(service.load(AUTO_RESOLUTION_CATEGORY).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_stored_value_is_config_error() {
        let mut provider = MockSettingsProvider::new();
        provider.expect_load().returning(|_| {
            Ok(vec![SettingRecord::new(
                "auto_quarantine_min_damage_score",
                "thirty percent",
                SettingValueType::Number,
                AUTO_RESOLUTION_CATEGORY,
                None,
            )])
        });

        let err = load_auto_resolution_settings(&provider).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
