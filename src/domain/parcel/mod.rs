pub mod entity;
pub mod invariants;

pub use entity::{Parcel, ParcelStatus};
pub use invariants::{validate_parcel, validate_tracking_number};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resolution::{Decision, ResolutionAction, ResolutionRule};
    use crate::domain::DomainError;

    fn decision(action: ResolutionAction, rule: ResolutionRule) -> Decision {
        Decision {
            can_auto_resolve: action != ResolutionAction::ManualReview,
            action,
            reason: "test".to_string(),
            confidence: 0.9,
            damage_score: 0.0,
            rule_triggered: rule,
        }
    }

    #[test]
    fn test_status_parse_closed_set() {
        for status in ParcelStatus::ALL {
            assert_eq!(status.as_str().parse::<ParcelStatus>().unwrap(), status);
        }
        assert!(matches!(
            "lost".parse::<ParcelStatus>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_set_status_any_to_any() {
        let mut parcel = Parcel::new("TRK-10".to_string());
        parcel.set_status("shipped").unwrap();
        assert_eq!(parcel.status, ParcelStatus::Shipped);
        parcel.set_status("received").unwrap();
        assert_eq!(parcel.status, ParcelStatus::Received);
        assert!(parcel.set_status("teleported").is_err());
        assert_eq!(parcel.status, ParcelStatus::Received);
    }

    #[test]
    fn test_apply_auto_resolving_decision() {
        let mut parcel = Parcel::new("TRK-11".to_string());
        parcel
            .apply_decision(&decision(ResolutionAction::Quarantine, ResolutionRule::DamageDetected))
            .unwrap();

        assert!(parcel.auto_resolved);
        assert_eq!(parcel.status, ParcelStatus::Quarantine);
        assert_eq!(parcel.resolution_action, Some(ResolutionAction::Quarantine));
        assert!(parcel.completed_at.is_some());
        assert!(validate_parcel(&parcel).is_ok());
    }

    #[test]
    fn test_set_status_away_from_resolution_clears_it() {
        let mut parcel = Parcel::new("TRK-13".to_string());
        parcel
            .apply_decision(&decision(
                ResolutionAction::Approved,
                ResolutionRule::NoDamageHighConfidence,
            ))
            .unwrap();

        parcel.set_status("approved").unwrap();
        assert!(parcel.auto_resolved);
        assert_eq!(parcel.resolution_action, Some(ResolutionAction::Approved));

        parcel.set_status("shipped").unwrap();
        assert_eq!(parcel.status, ParcelStatus::Shipped);
        assert!(!parcel.auto_resolved);
        assert_eq!(parcel.resolution_action, None);
        assert_eq!(parcel.auto_resolution_reason.as_deref(), Some("test"));
        assert!(validate_parcel(&parcel).is_ok());

        // Returning to the old status does not restore the resolution
        parcel.set_status("approved").unwrap();
        assert!(!parcel.auto_resolved);
    }

    #[test]
    fn test_apply_manual_review_clears_resolution() {
        let mut parcel = Parcel::new("TRK-12".to_string());
        parcel
            .apply_decision(&decision(
                ResolutionAction::Approved,
                ResolutionRule::NoDamageHighConfidence,
            ))
            .unwrap();
        parcel
            .apply_decision(&decision(ResolutionAction::ManualReview, ResolutionRule::EdgeCase))
            .unwrap();

        assert!(!parcel.auto_resolved);
        assert_eq!(parcel.resolution_action, None);
        assert_eq!(parcel.status, ParcelStatus::ManualReview);
        assert!(validate_parcel(&parcel).is_ok());
    }
}
