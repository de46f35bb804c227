use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// A stored system setting, as loaded from the settings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingRecord {
    pub key: String,

    /// Raw text value; interpreted through `value_type`
    pub value: String,

    pub value_type: SettingValueType,
    pub category: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Declared type of a setting value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingValueType {
    String,
    Number,
    Boolean,
    Json,
}

/// A setting value coerced by its declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Number(f64),
    Boolean(bool),
    Json(serde_json::Value),
    String(String),
}

impl SettingRecord {
    pub fn new(
        key: &str,
        value: &str,
        value_type: SettingValueType,
        category: &str,
        description: Option<&str>,
    ) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            value_type,
            category: category.to_string(),
            description: description.map(str::to_string),
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    /// Coerce the raw text by the declared type
    pub fn coerce(&self) -> Result<SettingValue, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: self.key.clone(),
            value_type: self.value_type,
            value: self.value.clone(),
        };

        match self.value_type {
            SettingValueType::Number => {
                let number: f64 = self.value.trim().parse().map_err(|_| invalid())?;
                if !number.is_finite() {
                    return Err(invalid());
                }
                Ok(SettingValue::Number(number))
            }
            SettingValueType::Boolean => match self.value.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(SettingValue::Boolean(true)),
                "false" => Ok(SettingValue::Boolean(false)),
                _ => Err(invalid()),
            },
            SettingValueType::Json => serde_json::from_str(&self.value)
                .map(SettingValue::Json)
                .map_err(|_| invalid()),
            SettingValueType::String => Ok(SettingValue::String(self.value.clone())),
        }
    }
}

impl SettingValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingValueType::String => "string",
            SettingValueType::Number => "number",
            SettingValueType::Boolean => "boolean",
            SettingValueType::Json => "json",
        }
    }
}

impl std::fmt::Display for SettingValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SettingValueType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(SettingValueType::String),
            "number" => Ok(SettingValueType::Number),
            "boolean" => Ok(SettingValueType::Boolean),
            "json" => Ok(SettingValueType::Json),
            other => Err(ConfigError::UnknownValueType(other.to_string())),
        }
    }
}
