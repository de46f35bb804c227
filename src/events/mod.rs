// src/events/mod.rs
//
// Internal Event System - Public API
//
// CRITICAL: EventHandler is INTERNAL and must NOT be exported

pub mod bus;
pub mod handlers;
pub mod types;

pub use types::DomainEvent;

pub use types::{
    // Resolution
    AutoResolutionEvaluated,
    ImageProcessingFailed,

    // Inspection
    InspectionCompleted,
    InspectionCreated,
    InspectionFailed,
    InspectionImageProcessed,
    InspectionImageRecorded,

    // Parcel
    ParcelRegistered,
    ParcelResolved,
    ParcelStatusChanged,
};

pub use bus::{EventBus, EventLogEntry, DEFAULT_EVENT_LOG_CAPACITY};

pub use handlers::register_logging_handlers;

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
