// src/domain/resolution/value_objects.rs
//
// Auto-Resolution Value Objects
//
// Pure, immutable data structures describing the evidence an inspection
// produced and the decision the rule engine reached for it.
//
// CRITICAL INVARIANTS:
// - A Decision is never persisted directly; only its effect on the Parcel is
// - can_auto_resolve == (action != ManualReview)
// - Clone + Debug + Serialize for traceability

use serde::{Deserialize, Serialize};

// ============================================================================
// INSPECTION EVIDENCE
// ============================================================================

/// Aggregated evidence of a completed inspection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InspectionEvidence {
    pub has_damage: bool,
    pub damage_count: u32,
    pub images_received: u32,

    /// Mean detection confidence, 1.0 when nothing was detected
    pub overall_confidence: f64,
}

// ============================================================================
// RESOLUTION ACTION
// ============================================================================

/// What should happen to the parcel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    Approved,
    Quarantine,
    ManualReview,
}

impl ResolutionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionAction::Approved => "approved",
            ResolutionAction::Quarantine => "quarantine",
            ResolutionAction::ManualReview => "manual_review",
        }
    }

    pub fn is_auto_resolution(&self) -> bool {
        !matches!(self, ResolutionAction::ManualReview)
    }
}

impl std::fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResolutionAction {
    type Err = crate::domain::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(ResolutionAction::Approved),
            "quarantine" => Ok(ResolutionAction::Quarantine),
            "manual_review" => Ok(ResolutionAction::ManualReview),
            other => Err(crate::domain::DomainError::Validation(format!(
                "Invalid resolution action '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// RESOLUTION RULE
// ============================================================================

/// The rule that produced a decision, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    AutoResolutionDisabled,
    InsufficientImages,
    NoDamageHighConfidence,
    MinorDamageAcceptable,
    DamageDetected,
    LowConfidence,
    EdgeCase,
}

impl ResolutionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionRule::AutoResolutionDisabled => "auto_resolution_disabled",
            ResolutionRule::InsufficientImages => "insufficient_images",
            ResolutionRule::NoDamageHighConfidence => "no_damage_high_confidence",
            ResolutionRule::MinorDamageAcceptable => "minor_damage_acceptable",
            ResolutionRule::DamageDetected => "damage_detected",
            ResolutionRule::LowConfidence => "low_confidence",
            ResolutionRule::EdgeCase => "edge_case",
        }
    }
}

impl std::fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DECISION
// ============================================================================

/// Outcome of evaluating one inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub can_auto_resolve: bool,
    pub action: ResolutionAction,
    pub reason: String,
    pub confidence: f64,
    pub damage_score: f64,
    pub rule_triggered: ResolutionRule,
}

impl Decision {
    /// Builds a decision; can_auto_resolve follows from the action
    pub fn new(
        action: ResolutionAction,
        rule: ResolutionRule,
        reason: impl Into<String>,
        confidence: f64,
        damage_score: f64,
    ) -> Self {
        Self {
            can_auto_resolve: action.is_auto_resolution(),
            action,
            reason: reason.into(),
            confidence,
            damage_score,
            rule_triggered: rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_auto_resolve_follows_action() {
        let approve = Decision::new(
            ResolutionAction::Approved,
            ResolutionRule::MinorDamageAcceptable,
            "ok",
            0.9,
            0.05,
        );
        assert!(approve.can_auto_resolve);

        let review = Decision::new(
            ResolutionAction::ManualReview,
            ResolutionRule::EdgeCase,
            "hm",
            0.8,
            0.2,
        );
        assert!(!review.can_auto_resolve);
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(ResolutionRule::NoDamageHighConfidence.to_string(), "no_damage_high_confidence");
        assert_eq!(ResolutionRule::InsufficientImages.to_string(), "insufficient_images");
        assert_eq!(ResolutionAction::ManualReview.to_string(), "manual_review");
    }

    #[test]
    fn test_decision_serializes_snake_case() {
        let decision = Decision::new(
            ResolutionAction::Quarantine,
            ResolutionRule::DamageDetected,
            "Significant damage detected",
            0.75,
            0.5,
        );
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["action"], "quarantine");
        assert_eq!(json["rule_triggered"], "damage_detected");
        assert_eq!(json["can_auto_resolve"], true);
    }
}
