// src/application/commands/parcel_commands.rs

use crate::application::commands::parse_id;
use crate::application::dto::*;
use crate::application::error_handling::{CommandResult, ErrorResponse, ErrorType};
use crate::application::state::AppState;
use crate::domain::ParcelStatus;
use crate::repositories::ParcelFilter;

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Register a newly received parcel
pub fn register_parcel(state: &AppState, tracking_number: &str) -> CommandResult<ParcelDto> {
    let parcel = state.parcel_service.register_parcel(tracking_number)?;
    Ok(parcel.into())
}

/// Get a single parcel by ID
pub fn get_parcel(state: &AppState, parcel_id: &str) -> CommandResult<ParcelDto> {
    let id = parse_id(parcel_id, "parcel")?;
    Ok(state.parcel_service.get_parcel(id)?.into())
}

pub fn find_parcel_by_tracking_number(
    state: &AppState,
    tracking_number: &str,
) -> CommandResult<ParcelDto> {
    let parcel = state
        .parcel_service
        .find_by_tracking_number(tracking_number.trim())?;
    Ok(parcel.into())
}

/// Look a parcel up by id, falling back to its tracking number
///
/// Only a malformed id or an unknown parcel id falls back; any other failure
/// is returned as is.
pub fn show_parcel(state: &AppState, parcel: &str) -> CommandResult<ParcelDto> {
    match get_parcel(state, parcel) {
        Err(e) if falls_back_to_tracking_number(&e) => find_parcel_by_tracking_number(state, parcel),
        result => result,
    }
}

fn falls_back_to_tracking_number(error: &ErrorResponse) -> bool {
    matches!(error.error_type, ErrorType::Validation | ErrorType::NotFound)
}

/// List parcels, newest first
pub fn list_parcels(state: &AppState, dto: ListParcelsDto) -> CommandResult<ParcelPageDto> {
    let status = dto
        .status
        .as_deref()
        .map(str::parse::<ParcelStatus>)
        .transpose()
        .map_err(|e| ErrorResponse::validation(e.to_string()))?;

    let filter = ParcelFilter {
        status,
        has_damage: dto.has_damage,
        search: dto.search.filter(|s| !s.trim().is_empty()),
    };

    let page = state.parcel_service.list_parcels(
        &filter,
        dto.page.unwrap_or(1),
        dto.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;
    Ok(page.into())
}

/// Administrative status assignment
pub fn update_parcel_status(
    state: &AppState,
    parcel_id: &str,
    status: &str,
) -> CommandResult<ParcelDto> {
    let id = parse_id(parcel_id, "parcel")?;
    let parcel = state.parcel_service.update_status(id, status.trim())?;
    Ok(parcel.into())
}

/// Assign one status to several parcels at once
pub fn bulk_update_parcel_status(
    state: &AppState,
    parcel_ids: &[String],
    status: &str,
) -> CommandResult<BulkStatusUpdateDto> {
    let ids = parcel_ids
        .iter()
        .map(|id| parse_id(id, "parcel"))
        .collect::<CommandResult<Vec<_>>>()?;
    let status = status.trim();

    let parcels = state.parcel_service.bulk_update_status(&ids, status)?;
    Ok(BulkStatusUpdateDto {
        updated_count: parcels.len(),
        status: status.to_string(),
        parcel_ids: parcels.iter().map(|p| p.id.to_string()).collect(),
    })
}
