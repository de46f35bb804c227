// src/application/commands/resolution_commands.rs

use crate::application::commands::parse_id;
use crate::application::dto::*;
use crate::application::error_handling::CommandResult;
use crate::application::state::AppState;

/// Complete an inspection and resolve its parcel
pub fn complete_and_resolve(
    state: &AppState,
    inspection_id: &str,
) -> CommandResult<ResolutionOutcomeDto> {
    let id = parse_id(inspection_id, "inspection")?;
    let outcome = state.resolution_service.complete_and_resolve(id)?;
    Ok(outcome.into())
}

/// Evaluate a completed inspection without applying the decision
pub fn evaluate_auto_resolution(
    state: &AppState,
    parcel_id: &str,
    inspection_id: &str,
) -> CommandResult<DecisionDto> {
    let parcel_id = parse_id(parcel_id, "parcel")?;
    let inspection_id = parse_id(inspection_id, "inspection")?;
    let decision = state
        .resolution_service
        .evaluate_auto_resolution(parcel_id, inspection_id)?;
    Ok(decision.into())
}

/// Re-resolve a parcel from one of its completed inspections
pub fn resolve_parcel(
    state: &AppState,
    parcel_id: &str,
    inspection_id: &str,
) -> CommandResult<ResolutionOutcomeDto> {
    let parcel_id = parse_id(parcel_id, "parcel")?;
    let inspection_id = parse_id(inspection_id, "inspection")?;

    let (decision, parcel) = state
        .resolution_service
        .resolve_parcel(parcel_id, inspection_id)?;
    let inspection = state.inspection_service.get_inspection(inspection_id)?;

    Ok(ResolutionOutcomeDto {
        inspection: inspection.into(),
        decision: decision.into(),
        parcel: parcel.into(),
        failed_images: Vec::new(),
    })
}
