use super::entity::DetectionResult;
use crate::domain::{DomainError, DomainResult};

/// Validates a detector result before it is recorded
pub fn validate_detection_result(result: &DetectionResult) -> DomainResult<()> {
    if !(0.0..=1.0).contains(&result.confidence) {
        return Err(DomainError::Validation(format!(
            "Detection confidence {} outside [0, 1]",
            result.confidence
        )));
    }

    let b = &result.bbox;
    let coords = [b.x1, b.y1, b.x2, b.y2];
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(DomainError::Validation(
            "Bounding box has non-finite coordinates".to_string(),
        ));
    }
    if b.x2 < b.x1 || b.y2 < b.y1 {
        return Err(DomainError::Validation(format!(
            "Bounding box corners inverted: ({}, {}) -> ({}, {})",
            b.x1, b.y1, b.x2, b.y2
        )));
    }

    if result.class_name.trim().is_empty() {
        return Err(DomainError::Validation(
            "Detection has an empty damage type".to_string(),
        ));
    }
    Ok(())
}
