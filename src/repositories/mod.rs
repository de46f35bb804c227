// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO event emission
// - NO cross-repository calls
// - Explicit SQL only
// - A unit of work spanning tables is ONE transaction inside ONE method

pub mod detection_repository;
pub mod inspection_repository;
pub mod parcel_repository;
pub mod settings_repository;

mod row_mapping;

pub use detection_repository::{DetectionRepository, SqliteDetectionRepository};
pub use inspection_repository::{
    CompletionFn, ImageAdmission, InspectionRepository, SqliteInspectionRepository,
};
pub use parcel_repository::{ParcelFilter, ParcelRepository, SqliteParcelRepository};
pub use row_mapping::is_constraint_violation;
pub use settings_repository::{SettingsRepository, SqliteSettingsRepository};

#[cfg(test)]
pub use parcel_repository::MockParcelRepository;
#[cfg(test)]
pub use settings_repository::MockSettingsRepository;
