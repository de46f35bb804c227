// src/domain/resolution/rules.rs
//
// Auto-Resolution Rule Engine
//
// evaluate(evidence, settings) -> Decision
//
// Rules are evaluated in strict order and the first match wins. The order is
// part of the contract: rule 4 has no confidence gate and can approve after
// rule 3 rejected on confidence.
//
//   1. auto-resolution disabled                         -> manual_review
//   2. images_received < min_images                      -> manual_review
//   3. no damage and confidence >= approve threshold    -> approved
//   4. damage_score <= approve max                       -> approved
//   5. damage_score >= quarantine min and
//      confidence >= quarantine threshold                -> quarantine
//   6. confidence < quarantine threshold                 -> manual_review
//   7. otherwise                                         -> manual_review (edge case)

use super::value_objects::{Decision, InspectionEvidence, ResolutionAction, ResolutionRule};
use crate::domain::settings::AutoResolutionSettings;

/// Ratio of detections to images received, capped at 1.0
///
/// Zero when nothing was detected or when no images were received.
pub fn damage_score(evidence: &InspectionEvidence) -> f64 {
    if !evidence.has_damage || evidence.images_received == 0 {
        return 0.0;
    }
    (evidence.damage_count as f64 / evidence.images_received as f64).min(1.0)
}

/// Decide how a parcel should be resolved
pub fn evaluate(evidence: &InspectionEvidence, settings: &AutoResolutionSettings) -> Decision {
    if !settings.auto_approve_enabled {
        return Decision::new(
            ResolutionAction::ManualReview,
            ResolutionRule::AutoResolutionDisabled,
            "Auto-resolution disabled",
            0.0,
            0.0,
        );
    }

    let min_images = settings.min_images_for_auto_resolution;
    if (evidence.images_received as f64) < min_images {
        return Decision::new(
            ResolutionAction::ManualReview,
            ResolutionRule::InsufficientImages,
            format!("Insufficient images ({}/{})", evidence.images_received, min_images),
            0.0,
            0.0,
        );
    }

    let score = damage_score(evidence);
    let confidence = evidence.overall_confidence;

    if !evidence.has_damage && confidence >= settings.auto_approve_confidence_threshold {
        return Decision::new(
            ResolutionAction::Approved,
            ResolutionRule::NoDamageHighConfidence,
            "No damage detected with high confidence",
            confidence,
            score,
        );
    }

    if score <= settings.auto_approve_max_damage_score {
        return Decision::new(
            ResolutionAction::Approved,
            ResolutionRule::MinorDamageAcceptable,
            "Damage score below threshold for approval",
            confidence,
            score,
        );
    }

    if score >= settings.auto_quarantine_min_damage_score
        && confidence >= settings.auto_quarantine_confidence_threshold
    {
        return Decision::new(
            ResolutionAction::Quarantine,
            ResolutionRule::DamageDetected,
            "Significant damage detected",
            confidence,
            score,
        );
    }

    if confidence < settings.auto_quarantine_confidence_threshold {
        return Decision::new(
            ResolutionAction::ManualReview,
            ResolutionRule::LowConfidence,
            "Low detection confidence",
            confidence,
            score,
        );
    }

    Decision::new(
        ResolutionAction::ManualReview,
        ResolutionRule::EdgeCase,
        "Edge case - requires human judgment",
        confidence,
        score,
    )
}
