// src/events/handlers/logging_handler.rs
//
// Operational log of lifecycle outcomes.
//
// Consumes resolution and failure events and writes one log line per fact.
// Never mutates state and never emits further events.

use log::{info, warn};

use crate::events::types::{
    AutoResolutionEvaluated, ImageProcessingFailed, InspectionCompleted, InspectionFailed,
    ParcelResolved,
};
use crate::events::EventBus;

/// Registers the logging handlers with the event bus
pub fn register_logging_handlers(bus: &EventBus) {
    bus.subscribe::<InspectionCompleted, _>(|event| {
        info!(
            "Inspection {} completed: has_damage={} damage_count={} confidence={:.3}",
            event.inspection_id, event.has_damage, event.damage_count, event.overall_confidence
        );
    });

    bus.subscribe::<InspectionFailed, _>(|event| {
        warn!(
            "Inspection {} for parcel {} marked failed: {}",
            event.inspection_id, event.parcel_id, event.reason
        );
    });

    bus.subscribe::<ImageProcessingFailed, _>(|event| {
        warn!(
            "Image {} of inspection {} could not be processed: {}",
            event.image_id, event.inspection_id, event.error
        );
    });

    bus.subscribe::<AutoResolutionEvaluated, _>(|event| {
        info!(
            "Parcel {} evaluated: action={} rule={} confidence={:.3} damage_score={:.3}",
            event.parcel_id, event.action, event.rule_triggered, event.confidence, event.damage_score
        );
    });

    bus.subscribe::<ParcelResolved, _>(|event| {
        info!(
            "Parcel {} resolved: action={} auto_resolved={}",
            event.parcel_id, event.action, event.auto_resolved
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_one_handler_per_event() {
        let bus = EventBus::new();
        register_logging_handlers(&bus);

        assert_eq!(bus.subscriber_count::<InspectionCompleted>(), 1);
        assert_eq!(bus.subscriber_count::<InspectionFailed>(), 1);
        assert_eq!(bus.subscriber_count::<ImageProcessingFailed>(), 1);
        assert_eq!(bus.subscriber_count::<AutoResolutionEvaluated>(), 1);
        assert_eq!(bus.subscriber_count::<ParcelResolved>(), 1);
    }
}
