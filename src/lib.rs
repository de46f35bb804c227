// src/lib.rs
// ParcelGuard - Parcel inspection lifecycle and auto-resolution
//
// Architecture:
// - Domain-centric: entities, invariants and the pure rule engine live in domain
// - Repositories: dumb SQLite mappers, one transaction per unit of work
// - Event-driven: services report lifecycle changes through a typed event bus
// - Explicit: settings are loaded fresh per evaluation, the detector is injected
// - Application Layer: command boundary used by the CLI

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod integrations;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod config;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    damage_score, evaluate, AutoResolutionSettings, DamageDetection, DamageSeverity, Decision,
    DetectionResult, ImageAngle, Inspection, InspectionEvidence, InspectionImage,
    InspectionStatus, InspectionType, Parcel, ParcelStatus, ResolutionAction, ResolutionRule,
};

// ============================================================================
// PUBLIC API - Errors
// ============================================================================

pub use error::{AppError, AppResult, ErrorKind};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{create_event_bus, DomainEvent, EventBus, EventLogEntry};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{DetectionAdapter, DetectionError, HttpDetectionAdapter};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    InspectionService, ParcelService, ResolutionOutcome, ResolutionService, SettingsProvider,
    SettingsService,
};

pub use application::AppState;
pub use config::RuntimeConfig;
