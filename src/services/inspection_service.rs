// src/services/inspection_service.rs
//
// Inspection State Machine
//
// Lifecycle: in_progress -> completed | failed (both terminal)
//
// CRITICAL RULES:
// - The detector is injected; this service never constructs one
// - Image recording and detection storage are independent, order-insensitive
//   units of work; concurrent callers never lose an increment
// - Completion happens exactly once; a second attempt is InvalidState
// - A failed detector call records nothing and does not block completion

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{
    validate_detection_result, validate_inspection, DamageDetection, DamageSeverity,
    DetectionAggregate, DetectionResult, DomainResult, ImageAngle, Inspection, InspectionImage,
    InspectionType, ParcelStatus, DEFAULT_IMAGES_EXPECTED,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    EventBus, ImageProcessingFailed, InspectionCompleted, InspectionCreated, InspectionFailed,
    InspectionImageProcessed, InspectionImageRecorded, ParcelStatusChanged,
};
use crate::integrations::DetectionAdapter;
use crate::repositories::{
    is_constraint_violation, DetectionRepository, ImageAdmission, InspectionRepository,
    ParcelRepository,
};

pub struct InspectionService {
    parcel_repo: Arc<dyn ParcelRepository>,
    inspection_repo: Arc<dyn InspectionRepository>,
    detection_repo: Arc<dyn DetectionRepository>,
    detector: Arc<dyn DetectionAdapter>,
    event_bus: Arc<EventBus>,

    /// Upper bound on images per inspection, enforced at insert time
    image_limit: Option<u32>,
}

impl InspectionService {
    pub fn new(
        parcel_repo: Arc<dyn ParcelRepository>,
        inspection_repo: Arc<dyn InspectionRepository>,
        detection_repo: Arc<dyn DetectionRepository>,
        detector: Arc<dyn DetectionAdapter>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            parcel_repo,
            inspection_repo,
            detection_repo,
            detector,
            event_bus,
            image_limit: None,
        }
    }

    pub fn with_image_limit(mut self, max_images: u32) -> Self {
        self.image_limit = Some(max_images);
        self
    }

    /// Start an inspection for an existing parcel
    ///
    /// `images_expected` defaults to 6. The parcel moves to `inspecting`.
    pub fn create_inspection(
        &self,
        parcel_id: Uuid,
        inspection_type: InspectionType,
        images_expected: Option<u32>,
    ) -> AppResult<Inspection> {
        let parcel = self
            .parcel_repo
            .get_by_id(parcel_id)?
            .ok_or_else(|| AppError::not_found("Parcel", parcel_id))?;

        let inspection = Inspection::new(
            parcel.id,
            inspection_type,
            images_expected.unwrap_or(DEFAULT_IMAGES_EXPECTED),
        );
        validate_inspection(&inspection)?;

        self.inspection_repo.create(&inspection).map_err(|e| {
            if is_constraint_violation(&e) {
                AppError::invalid_state(format!(
                    "Parcel {} already has an inspection in progress",
                    parcel.id
                ))
            } else {
                e
            }
        })?;

        info!(
            "Inspection {} started for parcel {} ({} images expected)",
            inspection.id, parcel.id, inspection.images_expected
        );

        self.event_bus.emit(InspectionCreated::new(
            inspection.id,
            parcel.id,
            inspection.inspection_type.to_string(),
            inspection.images_expected,
        ));
        if parcel.status != ParcelStatus::Inspecting {
            self.event_bus.emit(ParcelStatusChanged::new(
                parcel.id,
                parcel.status.to_string(),
                ParcelStatus::Inspecting.to_string(),
            ));
        }

        Ok(inspection)
    }

    /// Append an image to an in-progress inspection
    ///
    /// Increments `images_received` by exactly one. With an image limit set,
    /// an inspection that already holds that many images rejects the upload
    /// with a Validation error, even under concurrent uploads.
    pub fn record_image(
        &self,
        inspection_id: Uuid,
        angle: ImageAngle,
        sequence_number: u32,
        image_bytes: Option<&[u8]>,
    ) -> AppResult<InspectionImage> {
        let inspection = self.get_inspection(inspection_id)?;
        inspection.ensure_in_progress()?;

        let digest = image_bytes.map(content_digest);
        let image = InspectionImage::new(inspection_id, angle, sequence_number, digest);

        // The status check above can be overtaken by a concurrent completion
        let images_received = match self.inspection_repo.add_image(&image, self.image_limit)? {
            ImageAdmission::Accepted(count) => count,
            ImageAdmission::Closed => {
                return Err(AppError::invalid_state(format!(
                    "Inspection {} is no longer accepting images",
                    inspection_id
                )))
            }
            ImageAdmission::Full => {
                return Err(AppError::validation(format!(
                    "Inspection {} already holds the maximum number of images",
                    inspection_id
                )))
            }
        };

        debug!(
            "Image {} ({}) recorded for inspection {} [{}/{}]",
            image.id, angle, inspection_id, images_received, inspection.images_expected
        );
        self.event_bus.emit(InspectionImageRecorded::new(
            inspection_id,
            image.id,
            angle.to_string(),
            images_received,
        ));
        Ok(image)
    }

    /// Run one image through the detector and store its detections
    ///
    /// On detector failure nothing is written, the image stays unprocessed and
    /// the error is returned as DetectionUnavailable.
    pub fn process_image(&self, image_id: Uuid, image_bytes: &[u8]) -> AppResult<Vec<DamageDetection>> {
        let image = self.get_image(image_id)?;
        if image.processed {
            return Err(AppError::invalid_state(format!(
                "Image {} has already been processed",
                image_id
            )));
        }
        self.get_inspection(image.inspection_id)?
            .ensure_in_progress()?;

        let results = match self.detector.detect(image_bytes) {
            Ok(results) => results,
            Err(e) => {
                warn!("Detector failed for image {}: {}", image_id, e);
                self.event_bus.emit(ImageProcessingFailed::new(
                    image.inspection_id,
                    image_id,
                    e.to_string(),
                ));
                return Err(AppError::DetectionUnavailable(e));
            }
        };

        self.record_detections(image_id, &results)
    }

    /// Store detector results for an image and mark it processed
    ///
    /// Does not touch inspection aggregates; those are computed at completion.
    pub fn record_detections(
        &self,
        image_id: Uuid,
        results: &[DetectionResult],
    ) -> AppResult<Vec<DamageDetection>> {
        let image = self.get_image(image_id)?;
        for result in results {
            validate_detection_result(result)?;
        }

        let detections: Vec<DamageDetection> = results
            .iter()
            .map(|result| DamageDetection::from_result(image.inspection_id, image.id, result))
            .collect();

        let recorded = self
            .detection_repo
            .record_batch(image.id, &detections, Utc::now())?;
        if !recorded {
            return Err(AppError::invalid_state(format!(
                "Image {} is already processed or its inspection is no longer in progress",
                image_id
            )));
        }

        debug!(
            "Image {} processed: {} detections",
            image_id,
            detections.len()
        );
        self.event_bus.emit(InspectionImageProcessed::new(
            image.inspection_id,
            image.id,
            detections.len(),
        ));
        Ok(detections)
    }

    /// Aggregate all stored detections and finalize the inspection
    ///
    /// The parcel receives has_damage, inspected_at and the worst severity.
    /// Parcel status is left unchanged.
    pub fn complete_inspection(&self, inspection_id: Uuid) -> AppResult<Inspection> {
        let inspection = self.inspection_repo.complete(inspection_id, &finalize)?;
        let overall_confidence = inspection.overall_confidence.unwrap_or(1.0);

        info!(
            "Inspection {} completed: {} detections over {} images",
            inspection.id, inspection.damage_count, inspection.images_received
        );
        self.event_bus.emit(InspectionCompleted::new(
            inspection.id,
            inspection.parcel_id,
            inspection.has_damage,
            inspection.damage_count,
            overall_confidence,
        ));
        Ok(inspection)
    }

    /// Administrative in_progress -> failed transition
    pub fn mark_failed(&self, inspection_id: Uuid, reason: &str) -> AppResult<Inspection> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("A failure reason is required"));
        }

        let mut inspection = self.get_inspection(inspection_id)?;
        inspection.mark_failed(reason.to_string())?;

        if !self.inspection_repo.mark_failed(&inspection)? {
            return Err(AppError::invalid_state(format!(
                "Inspection {} is no longer in progress",
                inspection_id
            )));
        }

        self.event_bus.emit(InspectionFailed::new(
            inspection.id,
            inspection.parcel_id,
            reason.to_string(),
        ));
        Ok(inspection)
    }

    pub fn get_inspection(&self, inspection_id: Uuid) -> AppResult<Inspection> {
        self.inspection_repo
            .get_by_id(inspection_id)?
            .ok_or_else(|| AppError::not_found("Inspection", inspection_id))
    }

    pub fn get_image(&self, image_id: Uuid) -> AppResult<InspectionImage> {
        self.inspection_repo
            .get_image(image_id)?
            .ok_or_else(|| AppError::not_found("Image", image_id))
    }

    pub fn list_images(&self, inspection_id: Uuid) -> AppResult<Vec<InspectionImage>> {
        self.get_inspection(inspection_id)?;
        self.inspection_repo.list_images(inspection_id)
    }

    pub fn list_detections(&self, inspection_id: Uuid) -> AppResult<Vec<DamageDetection>> {
        self.get_inspection(inspection_id)?;
        self.detection_repo.list_by_inspection(inspection_id)
    }

    pub fn list_inspections_for_parcel(&self, parcel_id: Uuid) -> AppResult<Vec<Inspection>> {
        if self.parcel_repo.get_by_id(parcel_id)?.is_none() {
            return Err(AppError::not_found("Parcel", parcel_id));
        }
        self.inspection_repo.list_by_parcel(parcel_id)
    }
}

/// Completion transition applied inside the repository transaction
fn finalize(inspection: &mut Inspection, confidences: &[f64]) -> DomainResult<Option<DamageSeverity>> {
    let aggregate = DetectionAggregate::from_confidences(confidences);
    inspection.complete(&aggregate)?;
    validate_inspection(inspection)?;
    Ok(aggregate.worst_severity)
}

/// Hex SHA-256 of image bytes
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
