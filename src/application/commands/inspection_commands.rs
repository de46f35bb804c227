// src/application/commands/inspection_commands.rs

use log::{info, warn};

use crate::application::commands::parse_id;
use crate::application::dto::*;
use crate::application::error_handling::{CommandResult, ErrorResponse, ErrorType};
use crate::application::state::AppState;
use crate::domain::{ImageAngle, InspectionType, DEFAULT_IMAGES_EXPECTED};

/// Start an inspection for a parcel
pub fn create_inspection(state: &AppState, dto: CreateInspectionDto) -> CommandResult<InspectionDto> {
    let parcel_id = parse_id(&dto.parcel_id, "parcel")?;
    let inspection_type = match dto.inspection_type.as_deref() {
        Some(value) => value
            .trim()
            .parse::<InspectionType>()
            .map_err(|e| ErrorResponse::validation(e.to_string()))?,
        None => InspectionType::Automated,
    };

    if let Some(expected) = dto.images_expected {
        if expected > state.max_images_per_inspection {
            return Err(ErrorResponse::validation(format!(
                "images_expected {} exceeds the limit of {} images per inspection",
                expected, state.max_images_per_inspection
            )));
        }
    }

    let inspection = state.inspection_service.create_inspection(
        parcel_id,
        inspection_type,
        dto.images_expected,
    )?;
    Ok(inspection.into())
}

/// Record one uploaded image
///
/// Rejected once the inspection holds the maximum number of images; the
/// bound is checked in the same write that stores the image.
pub fn record_image(
    state: &AppState,
    dto: RecordImageDto,
    image_bytes: Option<&[u8]>,
) -> CommandResult<InspectionImageDto> {
    let inspection_id = parse_id(&dto.inspection_id, "inspection")?;
    let angle = dto
        .angle
        .trim()
        .parse::<ImageAngle>()
        .map_err(|e| ErrorResponse::validation(e.to_string()))?;

    let image = state.inspection_service.record_image(
        inspection_id,
        angle,
        dto.sequence_number,
        image_bytes,
    )?;
    Ok(image.into())
}

/// Run an image through the detector
pub fn process_image(
    state: &AppState,
    image_id: &str,
    image_bytes: &[u8],
) -> CommandResult<Vec<DetectionDto>> {
    let id = parse_id(image_id, "image")?;
    let detections = state.inspection_service.process_image(id, image_bytes)?;
    Ok(detections.into_iter().map(DetectionDto::from).collect())
}

/// Finalize an inspection without resolving its parcel
pub fn complete_inspection(state: &AppState, inspection_id: &str) -> CommandResult<InspectionDto> {
    let id = parse_id(inspection_id, "inspection")?;
    Ok(state.inspection_service.complete_inspection(id)?.into())
}

/// Administrative in_progress -> failed transition
pub fn fail_inspection(
    state: &AppState,
    inspection_id: &str,
    reason: &str,
) -> CommandResult<InspectionDto> {
    let id = parse_id(inspection_id, "inspection")?;
    Ok(state.inspection_service.mark_failed(id, reason)?.into())
}

pub fn get_inspection(state: &AppState, inspection_id: &str) -> CommandResult<InspectionDto> {
    let id = parse_id(inspection_id, "inspection")?;
    Ok(state.inspection_service.get_inspection(id)?.into())
}

pub fn list_inspection_images(
    state: &AppState,
    inspection_id: &str,
) -> CommandResult<Vec<InspectionImageDto>> {
    let id = parse_id(inspection_id, "inspection")?;
    let images = state.inspection_service.list_images(id)?;
    Ok(images.into_iter().map(InspectionImageDto::from).collect())
}

pub fn list_inspection_detections(
    state: &AppState,
    inspection_id: &str,
) -> CommandResult<Vec<DetectionDto>> {
    let id = parse_id(inspection_id, "inspection")?;
    let detections = state.inspection_service.list_detections(id)?;
    Ok(detections.into_iter().map(DetectionDto::from).collect())
}

pub fn list_parcel_inspections(
    state: &AppState,
    parcel_id: &str,
) -> CommandResult<Vec<InspectionDto>> {
    let id = parse_id(parcel_id, "parcel")?;
    let inspections = state.inspection_service.list_inspections_for_parcel(id)?;
    Ok(inspections.into_iter().map(InspectionDto::from).collect())
}

/// Full inspection pass over a set of images
///
/// Angles are assigned in capture order. Every image is recorded and sent to
/// the detector; an image the detector cannot handle is reported in
/// `failed_images` and the run goes on. The inspection is then completed and
/// the parcel resolved from the images that were processed. When the
/// detector fails for every image the inspection is marked failed instead.
pub fn run_inspection(
    state: &AppState,
    parcel_id: &str,
    images: &[Vec<u8>],
) -> CommandResult<ResolutionOutcomeDto> {
    if images.is_empty() {
        return Err(ErrorResponse::validation("At least one image is required"));
    }
    if images.len() > state.max_images_per_inspection as usize {
        return Err(ErrorResponse::validation(format!(
            "{} images given, the limit is {} per inspection",
            images.len(),
            state.max_images_per_inspection
        )));
    }

    let inspection = create_inspection(
        state,
        CreateInspectionDto {
            parcel_id: parcel_id.to_string(),
            inspection_type: None,
            images_expected: Some(DEFAULT_IMAGES_EXPECTED.min(state.max_images_per_inspection)),
        },
    )?;

    let mut failed_images = Vec::new();
    let mut last_failure = None;
    for (n, bytes) in images.iter().enumerate() {
        let angle = ImageAngle::CAPTURE_ORDER[n % ImageAngle::CAPTURE_ORDER.len()];
        let image = record_image(
            state,
            RecordImageDto {
                inspection_id: inspection.id.clone(),
                angle: angle.to_string(),
                sequence_number: n as u32 + 1,
            },
            Some(bytes),
        )?;

        match process_image(state, &image.id, bytes) {
            Ok(_) => {}
            Err(e) if e.error_type == ErrorType::DetectionUnavailable => {
                warn!(
                    "Image {} ({}) of inspection {} skipped: {}",
                    image.sequence_number, image.angle, inspection.id, e
                );
                failed_images.push(FailedImageDto {
                    image_id: image.id,
                    sequence_number: image.sequence_number,
                    angle: image.angle,
                    error: e.to_string(),
                });
                last_failure = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    if failed_images.len() == images.len() {
        fail_inspection(state, &inspection.id, "Detector unavailable for every image")?;
        return Err(last_failure
            .unwrap_or_else(|| ErrorResponse::validation("No image could be processed")));
    }

    let inspection_id = parse_id(&inspection.id, "inspection")?;
    let outcome = state.resolution_service.complete_and_resolve(inspection_id)?;
    info!(
        "Inspection run for parcel {} finished: {} ({} of {} images skipped)",
        outcome.parcel.tracking_number,
        outcome.decision.action,
        failed_images.len(),
        images.len()
    );

    let mut report = ResolutionOutcomeDto::from(outcome);
    report.failed_images = failed_images;
    Ok(report)
}
