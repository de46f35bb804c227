// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are caller-friendly representations
// - DTOs NEVER leak domain invariants
// - DTOs are simple, serializable structs
// - Conversion FROM domain entities only (never TO)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DamageDetection, Decision, Inspection, InspectionImage, Parcel, SettingRecord,
};
use crate::services::{ParcelPage, ResolutionOutcome};

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

// ============================================================================
// PARCEL DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelDto {
    pub id: String,
    pub tracking_number: String,
    pub status: String,
    pub has_damage: bool,
    pub damage_severity: Option<String>,
    pub auto_resolved: bool,
    pub resolution_action: Option<String>,
    pub auto_resolution_reason: Option<String>,
    pub received_at: String,
    pub inspected_at: Option<String>,
    pub completed_at: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParcelsDto {
    pub status: Option<String>,
    pub has_damage: Option<bool>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelPageDto {
    pub items: Vec<ParcelDto>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusUpdateDto {
    pub updated_count: usize,
    pub status: String,
    pub parcel_ids: Vec<String>,
}

// ============================================================================
// INSPECTION DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionDto {
    pub id: String,
    pub parcel_id: String,
    pub inspection_type: String,
    pub status: String,
    pub images_expected: u32,
    pub images_received: u32,
    pub has_damage: bool,
    pub damage_count: u32,
    pub overall_confidence: Option<f64>,
    pub failure_reason: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInspectionDto {
    pub parcel_id: String,
    /// "automated" (default), "manual" or "appeal"
    pub inspection_type: Option<String>,
    pub images_expected: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionImageDto {
    pub id: String,
    pub inspection_id: String,
    pub angle: String,
    pub sequence_number: u32,
    pub content_digest: Option<String>,
    pub processed: bool,
    pub processed_at: Option<String>,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordImageDto {
    pub inspection_id: String,
    pub angle: String,
    pub sequence_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBoxDto {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDto {
    pub id: String,
    pub inspection_id: String,
    pub image_id: Option<String>,
    pub damage_type: String,
    pub confidence: f64,
    pub severity: String,
    pub bbox: BoundingBoxDto,
    pub detected_at: String,
}

// ============================================================================
// RESOLUTION DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionDto {
    pub can_auto_resolve: bool,
    pub action: String,
    pub reason: String,
    pub confidence: f64,
    pub damage_score: f64,
    pub rule_triggered: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOutcomeDto {
    pub inspection: InspectionDto,
    pub decision: DecisionDto,
    pub parcel: ParcelDto,

    /// Images the detector could not process during an inspection run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_images: Vec<FailedImageDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedImageDto {
    pub image_id: String,
    pub sequence_number: u32,
    pub angle: String,
    pub error: String,
}

// ============================================================================
// SETTINGS DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingDto {
    pub key: String,
    pub value: String,
    pub value_type: String,
    pub category: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSettingDto {
    pub key: String,
    pub value: String,
}

// ============================================================================
// CONVERSIONS (Domain -> DTO)
// ============================================================================

impl From<Parcel> for ParcelDto {
    fn from(parcel: Parcel) -> Self {
        Self {
            id: parcel.id.to_string(),
            tracking_number: parcel.tracking_number,
            status: parcel.status.to_string(),
            has_damage: parcel.has_damage,
            damage_severity: parcel.damage_severity.map(|s| s.to_string()),
            auto_resolved: parcel.auto_resolved,
            resolution_action: parcel.resolution_action.map(|a| a.to_string()),
            auto_resolution_reason: parcel.auto_resolution_reason,
            received_at: timestamp(parcel.received_at),
            inspected_at: parcel.inspected_at.map(timestamp),
            completed_at: parcel.completed_at.map(timestamp),
            updated_at: timestamp(parcel.updated_at),
        }
    }
}

impl From<ParcelPage> for ParcelPageDto {
    fn from(page: ParcelPage) -> Self {
        Self {
            items: page.items.into_iter().map(ParcelDto::from).collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}

impl From<Inspection> for InspectionDto {
    fn from(inspection: Inspection) -> Self {
        Self {
            id: inspection.id.to_string(),
            parcel_id: inspection.parcel_id.to_string(),
            inspection_type: inspection.inspection_type.to_string(),
            status: inspection.status.to_string(),
            images_expected: inspection.images_expected,
            images_received: inspection.images_received,
            has_damage: inspection.has_damage,
            damage_count: inspection.damage_count,
            overall_confidence: inspection.overall_confidence,
            failure_reason: inspection.failure_reason,
            started_at: timestamp(inspection.started_at),
            completed_at: inspection.completed_at.map(timestamp),
            duration_seconds: inspection.duration_seconds,
        }
    }
}

impl From<InspectionImage> for InspectionImageDto {
    fn from(image: InspectionImage) -> Self {
        Self {
            id: image.id.to_string(),
            inspection_id: image.inspection_id.to_string(),
            angle: image.angle.to_string(),
            sequence_number: image.sequence_number,
            content_digest: image.content_digest,
            processed: image.processed,
            processed_at: image.processed_at.map(timestamp),
            uploaded_at: timestamp(image.uploaded_at),
        }
    }
}

impl From<DamageDetection> for DetectionDto {
    fn from(detection: DamageDetection) -> Self {
        Self {
            id: detection.id.to_string(),
            inspection_id: detection.inspection_id.to_string(),
            image_id: detection.image_id.map(|id| id.to_string()),
            damage_type: detection.damage_type,
            confidence: detection.confidence,
            severity: detection.severity.to_string(),
            bbox: BoundingBoxDto {
                x1: detection.bbox.x1,
                y1: detection.bbox.y1,
                x2: detection.bbox.x2,
                y2: detection.bbox.y2,
            },
            detected_at: timestamp(detection.detected_at),
        }
    }
}

impl From<Decision> for DecisionDto {
    fn from(decision: Decision) -> Self {
        Self {
            can_auto_resolve: decision.can_auto_resolve,
            action: decision.action.to_string(),
            reason: decision.reason,
            confidence: decision.confidence,
            damage_score: decision.damage_score,
            rule_triggered: decision.rule_triggered.to_string(),
        }
    }
}

impl From<ResolutionOutcome> for ResolutionOutcomeDto {
    fn from(outcome: ResolutionOutcome) -> Self {
        Self {
            inspection: outcome.inspection.into(),
            decision: outcome.decision.into(),
            parcel: outcome.parcel.into(),
            failed_images: Vec::new(),
        }
    }
}

impl From<SettingRecord> for SettingDto {
    fn from(record: SettingRecord) -> Self {
        Self {
            key: record.key,
            value: record.value,
            value_type: record.value_type.to_string(),
            category: record.category,
            description: record.description,
            is_active: record.is_active,
            updated_at: timestamp(record.updated_at),
        }
    }
}
