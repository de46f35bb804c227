// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod detection;
pub mod inspection;
pub mod parcel;
pub mod resolution;
pub mod settings;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Parcel Domain
pub use parcel::{validate_parcel, validate_tracking_number, Parcel, ParcelStatus};

// Inspection Domain
pub use inspection::{
    validate_inspection, DetectionAggregate, ImageAngle, Inspection, InspectionImage,
    InspectionStatus, InspectionType, DEFAULT_IMAGES_EXPECTED,
};

// Detection Domain
pub use detection::{
    validate_detection_result, BoundingBox, DamageDetection, DamageSeverity, DetectionResult,
};

// Resolution Domain (pure rule engine)
pub use resolution::{
    damage_score, evaluate, Decision, InspectionEvidence, ResolutionAction, ResolutionRule,
};

// Settings Domain
pub use settings::{
    AutoResolutionSettings, ConfigError, SettingRecord, SettingValue, SettingValueType,
    AUTO_RESOLUTION_CATEGORY,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
