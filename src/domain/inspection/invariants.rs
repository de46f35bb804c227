use super::entity::{Inspection, InspectionStatus};
use crate::domain::{DomainError, DomainResult};

/// Validates all Inspection invariants
pub fn validate_inspection(inspection: &Inspection) -> DomainResult<()> {
    validate_images_expected(inspection)?;
    validate_aggregates(inspection)?;
    Ok(())
}

fn validate_images_expected(inspection: &Inspection) -> DomainResult<()> {
    if inspection.images_expected == 0 {
        return Err(DomainError::Validation(
            "An inspection must expect at least one image".to_string(),
        ));
    }
    Ok(())
}

/// Aggregate invariants:
/// 1. has_damage <=> damage_count > 0
/// 2. overall_confidence in [0, 1] once set
/// 3. completed inspections carry a completion timestamp
fn validate_aggregates(inspection: &Inspection) -> DomainResult<()> {
    if inspection.has_damage != (inspection.damage_count > 0) {
        return Err(DomainError::InvariantViolation(format!(
            "has_damage={} disagrees with damage_count={}",
            inspection.has_damage, inspection.damage_count
        )));
    }

    if let Some(confidence) = inspection.overall_confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(DomainError::InvariantViolation(format!(
                "overall_confidence {} outside [0, 1]",
                confidence
            )));
        }
    }

    if inspection.status == InspectionStatus::Completed && inspection.completed_at.is_none() {
        return Err(DomainError::InvariantViolation(
            "Completed inspection without completed_at".to_string(),
        ));
    }
    Ok(())
}

/// Critical Inspection Invariants:
///
/// 1. Inspection MUST belong to exactly one Parcel
/// 2. At most one in_progress inspection per parcel (enforced by storage)
/// 3. images_received <= images_expected is the steady state, not a hard rule
/// 4. Completion happens at most once; completed and failed are terminal
/// 5. Images and detections are deleted with their inspection
