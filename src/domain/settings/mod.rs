pub mod auto_resolution;
pub mod entity;

pub use auto_resolution::{AutoResolutionSettings, AUTO_RESOLUTION_CATEGORY};
pub use entity::{SettingRecord, SettingValue, SettingValueType};

use thiserror::Error;

/// Settings that cannot be coerced to their declared type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Setting '{key}' has value '{value}' that is not a valid {value_type}")]
    InvalidValue {
        key: String,
        value_type: SettingValueType,
        value: String,
    },

    #[error("Setting '{key}' must be declared as {expected}, found {declared}")]
    TypeMismatch {
        key: String,
        expected: SettingValueType,
        declared: SettingValueType,
    },

    #[error("Unknown setting value type '{0}'")]
    UnknownValueType(String),
}
