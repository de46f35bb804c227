// src/services/parcel_service.rs
//
// Parcel registry: registration, lookup, listing and administrative status changes.

use std::collections::HashSet;
use std::sync::Arc;

use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{validate_parcel, validate_tracking_number, Parcel, ParcelStatus};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, ParcelRegistered, ParcelStatusChanged};
use crate::repositories::{is_constraint_violation, ParcelFilter, ParcelRepository};

pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of parcels
#[derive(Debug, Clone, Serialize)]
pub struct ParcelPage {
    pub items: Vec<Parcel>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

pub struct ParcelService {
    parcel_repo: Arc<dyn ParcelRepository>,
    event_bus: Arc<EventBus>,
}

impl ParcelService {
    pub fn new(parcel_repo: Arc<dyn ParcelRepository>, event_bus: Arc<EventBus>) -> Self {
        Self {
            parcel_repo,
            event_bus,
        }
    }

    /// Register a newly received parcel
    pub fn register_parcel(&self, tracking_number: &str) -> AppResult<Parcel> {
        let tracking_number = tracking_number.trim();
        validate_tracking_number(tracking_number)?;

        if self
            .parcel_repo
            .get_by_tracking_number(tracking_number)?
            .is_some()
        {
            return Err(duplicate_tracking_number(tracking_number));
        }

        let parcel = Parcel::new(tracking_number.to_string());
        validate_parcel(&parcel)?;

        // The UNIQUE constraint still decides when two registrations race
        self.parcel_repo.insert(&parcel).map_err(|e| {
            if is_constraint_violation(&e) {
                duplicate_tracking_number(tracking_number)
            } else {
                e
            }
        })?;

        info!("Registered parcel {} ({})", parcel.id, parcel.tracking_number);
        self.event_bus.emit(ParcelRegistered::new(
            parcel.id,
            parcel.tracking_number.clone(),
        ));
        Ok(parcel)
    }

    pub fn get_parcel(&self, parcel_id: Uuid) -> AppResult<Parcel> {
        self.parcel_repo
            .get_by_id(parcel_id)?
            .ok_or_else(|| AppError::not_found("Parcel", parcel_id))
    }

    pub fn find_by_tracking_number(&self, tracking_number: &str) -> AppResult<Parcel> {
        self.parcel_repo
            .get_by_tracking_number(tracking_number)?
            .ok_or_else(|| AppError::not_found("Parcel with tracking number", tracking_number))
    }

    /// `page` starts at 1; `limit` is 1..=100
    pub fn list_parcels(&self, filter: &ParcelFilter, page: u32, limit: u32) -> AppResult<ParcelPage> {
        if page == 0 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let offset = (page - 1).saturating_mul(limit);
        let items = self.parcel_repo.list(filter, limit, offset)?;
        let total = self.parcel_repo.count(filter)?;

        Ok(ParcelPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// Administrative status assignment
    ///
    /// Any member of the closed status set is accepted from any current status.
    pub fn update_status(&self, parcel_id: Uuid, status: &str) -> AppResult<Parcel> {
        let mut parcel = self.get_parcel(parcel_id)?;
        let old_status = parcel.status;

        parcel.set_status(status)?;
        validate_parcel(&parcel)?;
        self.parcel_repo.update(&parcel)?;

        self.emit_status_change(&parcel, old_status);
        Ok(parcel)
    }

    /// Assign one status to many parcels in a single transaction
    ///
    /// Unknown ids are skipped. Fails with NotFound when none of them exist.
    pub fn bulk_update_status(&self, parcel_ids: &[Uuid], status: &str) -> AppResult<Vec<Parcel>> {
        let target: ParcelStatus = status.parse()?;
        if parcel_ids.is_empty() {
            return Err(AppError::validation("At least one parcel id is required"));
        }

        let mut seen = HashSet::new();
        let mut changes = Vec::new();
        for id in parcel_ids.iter().filter(|id| seen.insert(**id)) {
            if let Some(mut parcel) = self.parcel_repo.get_by_id(*id)? {
                let old_status = parcel.status;
                parcel.set_status(target.as_str())?;
                validate_parcel(&parcel)?;
                changes.push((parcel, old_status));
            }
        }

        if changes.is_empty() {
            return Err(AppError::NotFound(format!(
                "None of the {} parcels exist",
                parcel_ids.len()
            )));
        }

        let parcels: Vec<Parcel> = changes.iter().map(|(parcel, _)| parcel.clone()).collect();
        self.parcel_repo.update_many(&parcels)?;

        info!("Bulk status update: {} parcels -> {}", parcels.len(), target);
        for (parcel, old_status) in &changes {
            self.emit_status_change(parcel, *old_status);
        }
        Ok(parcels)
    }

    fn emit_status_change(&self, parcel: &Parcel, old_status: ParcelStatus) {
        if old_status != parcel.status {
            self.event_bus.emit(ParcelStatusChanged::new(
                parcel.id,
                old_status.to_string(),
                parcel.status.to_string(),
            ));
        }
    }
}

fn duplicate_tracking_number(tracking_number: &str) -> AppError {
    AppError::validation(format!(
        "Tracking number '{}' is already registered",
        tracking_number
    ))
}
