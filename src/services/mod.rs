// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod inspection_service;
pub mod parcel_service;
pub mod resolution_service;
pub mod settings_service;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod inspection_service_tests;


// Re-export all services and their types
pub use inspection_service::{content_digest, InspectionService};

pub use parcel_service::{ParcelPage, ParcelService, MAX_PAGE_SIZE};

pub use resolution_service::{ResolutionOutcome, ResolutionService};

pub use settings_service::{load_auto_resolution_settings, SettingsProvider, SettingsService};

#[cfg(test)]
pub use settings_service::MockSettingsProvider;
