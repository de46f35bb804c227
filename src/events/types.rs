// events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! impl_domain_event {
    ($event:ident) => {
        impl DomainEvent for $event {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($event)
            }
        }
    };
}

// ============================================================================
// PARCEL EVENTS
// ============================================================================

/// Emitted when a parcel is received into the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelRegistered {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub parcel_id: Uuid,
    pub tracking_number: String,
}

impl ParcelRegistered {
    pub fn new(parcel_id: Uuid, tracking_number: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            parcel_id,
            tracking_number,
        }
    }
}

impl_domain_event!(ParcelRegistered);

/// Emitted whenever a parcel's status field changes value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelStatusChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub parcel_id: Uuid,
    pub old_status: String,
    pub new_status: String,
}

impl ParcelStatusChanged {
    pub fn new(parcel_id: Uuid, old_status: String, new_status: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            parcel_id,
            old_status,
            new_status,
        }
    }
}

impl_domain_event!(ParcelStatusChanged);

/// Emitted when a decision has been projected onto a parcel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelResolved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub parcel_id: Uuid,
    pub action: String,
    pub auto_resolved: bool,
    pub rule_triggered: String,
}

impl ParcelResolved {
    pub fn new(parcel_id: Uuid, action: String, auto_resolved: bool, rule_triggered: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            parcel_id,
            action,
            auto_resolved,
            rule_triggered,
        }
    }
}

impl_domain_event!(ParcelResolved);

// ============================================================================
// INSPECTION EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub inspection_id: Uuid,
    pub parcel_id: Uuid,
    pub inspection_type: String,
    pub images_expected: u32,
}

impl InspectionCreated {
    pub fn new(
        inspection_id: Uuid,
        parcel_id: Uuid,
        inspection_type: String,
        images_expected: u32,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            inspection_id,
            parcel_id,
            inspection_type,
            images_expected,
        }
    }
}

impl_domain_event!(InspectionCreated);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionImageRecorded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub inspection_id: Uuid,
    pub image_id: Uuid,
    pub angle: String,
    pub images_received: u32,
}

impl InspectionImageRecorded {
    pub fn new(inspection_id: Uuid, image_id: Uuid, angle: String, images_received: u32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            inspection_id,
            image_id,
            angle,
            images_received,
        }
    }
}

impl_domain_event!(InspectionImageRecorded);

/// Emitted once an image's detections are stored and the image is marked processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionImageProcessed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub inspection_id: Uuid,
    pub image_id: Uuid,
    pub detection_count: usize,
}

impl InspectionImageProcessed {
    pub fn new(inspection_id: Uuid, image_id: Uuid, detection_count: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            inspection_id,
            image_id,
            detection_count,
        }
    }
}

impl_domain_event!(InspectionImageProcessed);

/// Emitted when the detector could not process an image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageProcessingFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub inspection_id: Uuid,
    pub image_id: Uuid,
    pub error: String,
}

impl ImageProcessingFailed {
    pub fn new(inspection_id: Uuid, image_id: Uuid, error: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            inspection_id,
            image_id,
            error,
        }
    }
}

impl_domain_event!(ImageProcessingFailed);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub inspection_id: Uuid,
    pub parcel_id: Uuid,
    pub has_damage: bool,
    pub damage_count: u32,
    pub overall_confidence: f64,
}

impl InspectionCompleted {
    pub fn new(
        inspection_id: Uuid,
        parcel_id: Uuid,
        has_damage: bool,
        damage_count: u32,
        overall_confidence: f64,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            inspection_id,
            parcel_id,
            has_damage,
            damage_count,
            overall_confidence,
        }
    }
}

impl_domain_event!(InspectionCompleted);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub inspection_id: Uuid,
    pub parcel_id: Uuid,
    pub reason: String,
}

impl InspectionFailed {
    pub fn new(inspection_id: Uuid, parcel_id: Uuid, reason: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            inspection_id,
            parcel_id,
            reason,
        }
    }
}

impl_domain_event!(InspectionFailed);

// ============================================================================
// RESOLUTION EVENTS
// ============================================================================

/// Emitted for every rule-engine evaluation, applied or not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoResolutionEvaluated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub parcel_id: Uuid,
    pub inspection_id: Uuid,
    pub action: String,
    pub rule_triggered: String,
    pub confidence: f64,
    pub damage_score: f64,
}

impl AutoResolutionEvaluated {
    pub fn new(
        parcel_id: Uuid,
        inspection_id: Uuid,
        action: String,
        rule_triggered: String,
        confidence: f64,
        damage_score: f64,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            parcel_id,
            inspection_id,
            action,
            rule_triggered,
            confidence,
            damage_score,
        }
    }
}

impl_domain_event!(AutoResolutionEvaluated);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let registered = ParcelRegistered::new(Uuid::new_v4(), "TRK-1".to_string());
        assert_eq!(registered.event_type(), "ParcelRegistered");

        let failed = ImageProcessingFailed::new(Uuid::new_v4(), Uuid::new_v4(), "down".to_string());
        assert_eq!(failed.event_type(), "ImageProcessingFailed");
    }

    #[test]
    fn test_event_ids_are_unique() {
        let parcel_id = Uuid::new_v4();
        let a = ParcelStatusChanged::new(parcel_id, "received".into(), "inspecting".into());
        let b = ParcelStatusChanged::new(parcel_id, "received".into(), "inspecting".into());
        assert_ne!(a.event_id(), b.event_id());
    }
}
