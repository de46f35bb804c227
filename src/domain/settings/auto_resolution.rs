// src/domain/settings/auto_resolution.rs
//
// Typed snapshot of the `auto_resolution` settings category.
//
// A snapshot is built from whatever records were loaded for one evaluation.
// Absent keys take their defaults; present keys must coerce to the declared
// type of the key or the whole snapshot is rejected.

use serde::{Deserialize, Serialize};

use super::entity::{SettingRecord, SettingValue, SettingValueType};
use super::ConfigError;

pub const AUTO_RESOLUTION_CATEGORY: &str = "auto_resolution";

pub const KEY_AUTO_APPROVE_ENABLED: &str = "auto_approve_enabled";
pub const KEY_MIN_IMAGES: &str = "min_images_for_auto_resolution";
pub const KEY_APPROVE_CONFIDENCE: &str = "auto_approve_confidence_threshold";
pub const KEY_QUARANTINE_CONFIDENCE: &str = "auto_quarantine_confidence_threshold";
pub const KEY_APPROVE_MAX_DAMAGE: &str = "auto_approve_max_damage_score";
pub const KEY_QUARANTINE_MIN_DAMAGE: &str = "auto_quarantine_min_damage_score";

/// Thresholds and switches consumed by the rule engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoResolutionSettings {
    pub auto_approve_enabled: bool,
    pub min_images_for_auto_resolution: f64,
    pub auto_approve_confidence_threshold: f64,
    pub auto_quarantine_confidence_threshold: f64,
    pub auto_approve_max_damage_score: f64,
    pub auto_quarantine_min_damage_score: f64,
}

impl Default for AutoResolutionSettings {
    fn default() -> Self {
        Self {
            auto_approve_enabled: true,
            min_images_for_auto_resolution: 6.0,
            auto_approve_confidence_threshold: 0.95,
            auto_quarantine_confidence_threshold: 0.70,
            auto_approve_max_damage_score: 0.10,
            auto_quarantine_min_damage_score: 0.30,
        }
    }
}

impl AutoResolutionSettings {
    /// Build a snapshot from loaded records
    ///
    /// Inactive records and records of other categories are skipped. Unknown
    /// keys are ignored.
    pub fn from_records(records: &[SettingRecord]) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        for record in records
            .iter()
            .filter(|r| r.is_active && r.category == AUTO_RESOLUTION_CATEGORY)
        {
            match record.key.as_str() {
                KEY_AUTO_APPROVE_ENABLED => {
                    settings.auto_approve_enabled = expect_bool(record)?;
                }
                KEY_MIN_IMAGES => {
                    settings.min_images_for_auto_resolution = expect_number(record)?;
                }
                KEY_APPROVE_CONFIDENCE => {
                    settings.auto_approve_confidence_threshold = expect_number(record)?;
                }
                KEY_QUARANTINE_CONFIDENCE => {
                    settings.auto_quarantine_confidence_threshold = expect_number(record)?;
                }
                KEY_APPROVE_MAX_DAMAGE => {
                    settings.auto_approve_max_damage_score = expect_number(record)?;
                }
                KEY_QUARANTINE_MIN_DAMAGE => {
                    settings.auto_quarantine_min_damage_score = expect_number(record)?;
                }
                _ => {}
            }
        }

        Ok(settings)
    }

    /// Default rows for a fresh settings table
    pub fn default_records() -> Vec<SettingRecord> {
        let d = Self::default();
        let cat = AUTO_RESOLUTION_CATEGORY;
        vec![
            SettingRecord::new(
                KEY_AUTO_APPROVE_ENABLED,
                &d.auto_approve_enabled.to_string(),
                SettingValueType::Boolean,
                cat,
                Some("Allow the engine to approve or quarantine parcels without review"),
            ),
            SettingRecord::new(
                KEY_MIN_IMAGES,
                &d.min_images_for_auto_resolution.to_string(),
                SettingValueType::Number,
                cat,
                Some("Images required before a parcel may be auto-resolved"),
            ),
            SettingRecord::new(
                KEY_APPROVE_CONFIDENCE,
                &d.auto_approve_confidence_threshold.to_string(),
                SettingValueType::Number,
                cat,
                Some("Minimum confidence to approve a parcel with no detected damage"),
            ),
            SettingRecord::new(
                KEY_QUARANTINE_CONFIDENCE,
                &d.auto_quarantine_confidence_threshold.to_string(),
                SettingValueType::Number,
                cat,
                Some("Minimum confidence to quarantine a damaged parcel"),
            ),
            SettingRecord::new(
                KEY_APPROVE_MAX_DAMAGE,
                &d.auto_approve_max_damage_score.to_string(),
                SettingValueType::Number,
                cat,
                Some("Highest damage score still approved"),
            ),
            SettingRecord::new(
                KEY_QUARANTINE_MIN_DAMAGE,
                &d.auto_quarantine_min_damage_score.to_string(),
                SettingValueType::Number,
                cat,
                Some("Lowest damage score that triggers quarantine"),
            ),
        ]
    }

    /// Declared type of a known key, if the key belongs to this category
    pub fn expected_type(key: &str) -> Option<SettingValueType> {
        match key {
            KEY_AUTO_APPROVE_ENABLED => Some(SettingValueType::Boolean),
            KEY_MIN_IMAGES
            | KEY_APPROVE_CONFIDENCE
            | KEY_QUARANTINE_CONFIDENCE
            | KEY_APPROVE_MAX_DAMAGE
            | KEY_QUARANTINE_MIN_DAMAGE => Some(SettingValueType::Number),
            _ => None,
        }
    }
}

fn expect_number(record: &SettingRecord) -> Result<f64, ConfigError> {
    match record.coerce()? {
        SettingValue::Number(n) => Ok(n),
        _ => Err(ConfigError::TypeMismatch {
            key: record.key.clone(),
            expected: SettingValueType::Number,
            declared: record.value_type,
        }),
    }
}

fn expect_bool(record: &SettingRecord) -> Result<bool, ConfigError> {
    match record.coerce()? {
        SettingValue::Boolean(b) => Ok(b),
        _ => Err(ConfigError::TypeMismatch {
            key: record.key.clone(),
            expected: SettingValueType::Boolean,
            declared: record.value_type,
        }),
    }
}
