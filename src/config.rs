// src/config.rs
//
// Runtime configuration
//
// Every option can come from the command line or from its environment
// variable. Business thresholds live in the settings table, not here.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::db::get_database_path;
use crate::domain::DEFAULT_IMAGES_EXPECTED;
use crate::error::{AppError, AppResult};

pub const DEFAULT_DETECTOR_URL: &str = "http://127.0.0.1:8000/detect";
pub const DEFAULT_DETECTOR_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Args)]
pub struct RuntimeConfig {
    /// SQLite database file [default: <data dir>/parcelguard/parcelguard.db]
    #[arg(long = "db", env = "PARCELGUARD_DB", global = true)]
    pub database_path: Option<PathBuf>,

    /// Damage detector inference endpoint
    #[arg(
        long,
        env = "PARCELGUARD_DETECTOR_URL",
        default_value = DEFAULT_DETECTOR_URL,
        global = true
    )]
    pub detector_url: String,

    /// Detector request timeout in seconds
    #[arg(
        long,
        env = "PARCELGUARD_DETECTOR_TIMEOUT_SECS",
        default_value_t = DEFAULT_DETECTOR_TIMEOUT_SECS,
        global = true
    )]
    pub detector_timeout_secs: u64,

    /// Maximum images accepted per inspection
    #[arg(
        long,
        env = "PARCELGUARD_IMAGES_PER_INSPECTION",
        default_value_t = DEFAULT_IMAGES_EXPECTED,
        global = true
    )]
    pub images_per_inspection: u32,

    /// Log level (error, warn, info, debug, trace); RUST_LOG is used when absent
    #[arg(long, global = true)]
    pub log_level: Option<log::LevelFilter>,
}

impl RuntimeConfig {
    /// Configured database path, or the per-user default
    pub fn database_path(&self) -> AppResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => get_database_path(),
        }
    }

    pub fn detector_timeout(&self) -> Duration {
        Duration::from_secs(self.detector_timeout_secs)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.images_per_inspection == 0 {
            return Err(AppError::validation(
                "images-per-inspection must be at least 1",
            ));
        }
        if self.detector_timeout_secs == 0 {
            return Err(AppError::validation("detector timeout must be at least 1 second"));
        }
        if !self.detector_url.starts_with("http://") && !self.detector_url.starts_with("https://") {
            return Err(AppError::validation(format!(
                "detector URL '{}' must be http or https",
                self.detector_url
            )));
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            detector_url: DEFAULT_DETECTOR_URL.to_string(),
            detector_timeout_secs: DEFAULT_DETECTOR_TIMEOUT_SECS,
            images_per_inspection: DEFAULT_IMAGES_EXPECTED,
            log_level: None,
        }
    }
}
