// src/services/resolution_service.rs
//
// Auto-Resolution Service
//
// Wraps the pure rule engine with the two steps around it:
//
//   load settings snapshot -> evaluate(evidence, snapshot) -> Decision
//   apply_decision(parcel, Decision) -> Parcel (Parcel Status Projector)
//
// CRITICAL RULES:
// - Settings are loaded fresh for every evaluation, never cached
// - Evaluation has no side effects beyond an AutoResolutionEvaluated event
// - complete_and_resolve and resolve_parcel hold a per-parcel lock across
//   evaluate + apply so one parcel never has two resolutions in flight

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{evaluate, validate_parcel, Decision, Inspection, Parcel};
use crate::error::{AppError, AppResult};
use crate::events::{AutoResolutionEvaluated, EventBus, ParcelResolved, ParcelStatusChanged};
use crate::repositories::ParcelRepository;
use crate::services::inspection_service::InspectionService;
use crate::services::settings_service::{load_auto_resolution_settings, SettingsProvider};

/// Result of finishing an inspection and resolving its parcel
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    pub inspection: Inspection,
    pub decision: Decision,
    pub parcel: Parcel,
}

pub struct ResolutionService {
    parcel_repo: Arc<dyn ParcelRepository>,
    inspection_service: Arc<InspectionService>,
    settings: Arc<dyn SettingsProvider>,
    event_bus: Arc<EventBus>,
    parcel_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ResolutionService {
    pub fn new(
        parcel_repo: Arc<dyn ParcelRepository>,
        inspection_service: Arc<InspectionService>,
        settings: Arc<dyn SettingsProvider>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            parcel_repo,
            inspection_service,
            settings,
            event_bus,
            parcel_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate a completed inspection of a parcel against a fresh settings snapshot
    pub fn evaluate_auto_resolution(&self, parcel_id: Uuid, inspection_id: Uuid) -> AppResult<Decision> {
        let parcel = self.load_parcel(parcel_id)?;
        let inspection = self.inspection_service.get_inspection(inspection_id)?;

        if inspection.parcel_id != parcel.id {
            return Err(AppError::validation(format!(
                "Inspection {} does not belong to parcel {}",
                inspection_id, parcel_id
            )));
        }

        let evidence = inspection.evidence()?;
        let settings = load_auto_resolution_settings(self.settings.as_ref())?;
        let decision = evaluate(&evidence, &settings);

        self.event_bus.emit(AutoResolutionEvaluated::new(
            parcel.id,
            inspection.id,
            decision.action.to_string(),
            decision.rule_triggered.to_string(),
            decision.confidence,
            decision.damage_score,
        ));
        Ok(decision)
    }

    /// Project a decision onto the parcel and persist it
    pub fn apply_decision(&self, parcel_id: Uuid, decision: &Decision) -> AppResult<Parcel> {
        let mut parcel = self.load_parcel(parcel_id)?;
        let old_status = parcel.status;

        parcel.apply_decision(decision)?;
        validate_parcel(&parcel)?;
        self.parcel_repo.update(&parcel)?;

        info!(
            "Parcel {} -> {} ({}: {})",
            parcel.id, parcel.status, decision.rule_triggered, decision.reason
        );

        if old_status != parcel.status {
            self.event_bus.emit(ParcelStatusChanged::new(
                parcel.id,
                old_status.to_string(),
                parcel.status.to_string(),
            ));
        }
        self.event_bus.emit(ParcelResolved::new(
            parcel.id,
            decision.action.to_string(),
            parcel.auto_resolved,
            decision.rule_triggered.to_string(),
        ));
        Ok(parcel)
    }

    /// Evaluate + apply for an already completed inspection, serialized per parcel
    pub fn resolve_parcel(&self, parcel_id: Uuid, inspection_id: Uuid) -> AppResult<(Decision, Parcel)> {
        self.with_parcel_lock(parcel_id, || {
            let decision = self.evaluate_auto_resolution(parcel_id, inspection_id)?;
            let parcel = self.apply_decision(parcel_id, &decision)?;
            Ok((decision, parcel))
        })
    }

    /// Complete an inspection, evaluate it and apply the decision
    ///
    /// A second call for the same inspection fails with InvalidState and
    /// changes nothing.
    pub fn complete_and_resolve(&self, inspection_id: Uuid) -> AppResult<ResolutionOutcome> {
        let parcel_id = self.inspection_service.get_inspection(inspection_id)?.parcel_id;

        self.with_parcel_lock(parcel_id, || {
            let inspection = self.inspection_service.complete_inspection(inspection_id)?;
            let decision = self.evaluate_auto_resolution(parcel_id, inspection_id)?;
            let parcel = self.apply_decision(parcel_id, &decision)?;

            Ok(ResolutionOutcome {
                inspection,
                decision,
                parcel,
            })
        })
    }

    fn load_parcel(&self, parcel_id: Uuid) -> AppResult<Parcel> {
        self.parcel_repo
            .get_by_id(parcel_id)?
            .ok_or_else(|| AppError::not_found("Parcel", parcel_id))
    }

    /// Run `f` holding the parcel's lock
    ///
    /// Entries are created on demand and removed by the last holder, so the
    /// map only contains parcels with a resolution in flight.
    fn with_parcel_lock<T>(&self, parcel_id: Uuid, f: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
        let lock = Arc::clone(self.locks().entry(parcel_id).or_default());

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        // Clones are only taken under the map lock: a count of 2 (map + ours)
        // means nobody else is waiting on this parcel
        let mut locks = self.locks();
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&parcel_id);
        }
        result
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<Mutex<()>>>> {
        self.parcel_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn tracked_parcel_locks(&self) -> usize {
        self.locks().len()
    }
}
