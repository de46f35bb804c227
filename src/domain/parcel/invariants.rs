use regex::Regex;

use super::entity::Parcel;
use crate::domain::{DomainError, DomainResult};

const MAX_TRACKING_NUMBER_LEN: usize = 100;

/// Validates all Parcel invariants
pub fn validate_parcel(parcel: &Parcel) -> DomainResult<()> {
    validate_tracking_number(&parcel.tracking_number)?;
    validate_auto_resolution(parcel)?;
    Ok(())
}

/// Tracking numbers are 1..=100 characters of letters, digits, '-' or '_'
pub fn validate_tracking_number(tracking_number: &str) -> DomainResult<()> {
    if tracking_number.is_empty() || tracking_number.len() > MAX_TRACKING_NUMBER_LEN {
        return Err(DomainError::Validation(format!(
            "Tracking number must be 1-{} characters",
            MAX_TRACKING_NUMBER_LEN
        )));
    }

    let pattern = Regex::new(r"^[A-Za-z0-9_-]+$")
        .map_err(|e| DomainError::Validation(format!("Tracking number pattern: {}", e)))?;
    if !pattern.is_match(tracking_number) {
        return Err(DomainError::Validation(format!(
            "Tracking number '{}' contains invalid characters",
            tracking_number
        )));
    }
    Ok(())
}

/// auto_resolved implies a resolution action and a matching terminal status
fn validate_auto_resolution(parcel: &Parcel) -> DomainResult<()> {
    if !parcel.auto_resolved {
        return Ok(());
    }

    let action = parcel.resolution_action.ok_or_else(|| {
        DomainError::InvariantViolation("auto_resolved parcel has no resolution action".to_string())
    })?;

    if !parcel.status.is_auto_resolution_terminal() || parcel.status.as_str() != action.as_str() {
        return Err(DomainError::InvariantViolation(format!(
            "auto_resolved parcel has status '{}' but action '{}'",
            parcel.status, action
        )));
    }
    Ok(())
}

/// Critical Parcel Invariants:
///
/// 1. Tracking number is unique (enforced by storage)
/// 2. Status is always a member of the closed ParcelStatus set
/// 3. auto_resolved = true => resolution_action is set and status is approved | quarantine
/// 4. Parcel ID is immutable
