use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::detection::DamageSeverity;
use crate::domain::resolution::InspectionEvidence;
use crate::domain::{DomainError, DomainResult};

/// Number of angle images an inspection collects unless told otherwise
pub const DEFAULT_IMAGES_EXPECTED: u32 = 6;

/// One damage-assessment pass over a parcel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: Uuid,

    /// Owning parcel (REQUIRED)
    pub parcel_id: Uuid,

    pub inspection_type: InspectionType,
    pub status: InspectionStatus,

    pub images_expected: u32,
    pub images_received: u32,

    /// Aggregates are only meaningful once status is Completed
    pub has_damage: bool,
    pub damage_count: u32,
    pub overall_confidence: Option<f64>,

    /// Set when an operator marks the inspection failed
    pub failure_reason: Option<String>,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionType {
    Automated,
    Manual,
    Appeal,
}

/// Lifecycle: in_progress -> completed | failed (both terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    InProgress,
    Completed,
    Failed,
}

/// Camera angle of an inspection image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAngle {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

/// Image record, exclusively owned by its inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionImage {
    pub id: Uuid,
    pub inspection_id: Uuid,
    pub angle: ImageAngle,
    pub sequence_number: u32,

    /// Hex SHA-256 of the uploaded bytes, when known
    pub content_digest: Option<String>,

    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
}

/// Aggregated detection evidence computed at completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionAggregate {
    pub has_damage: bool,
    pub damage_count: u32,
    pub overall_confidence: f64,
    pub worst_severity: Option<DamageSeverity>,
}

impl DetectionAggregate {
    /// Aggregate detection confidences
    ///
    /// Mean confidence when there are detections, 1.0 (certain of no damage) otherwise.
    pub fn from_confidences(confidences: &[f64]) -> Self {
        let damage_count = confidences.len() as u32;
        if confidences.is_empty() {
            return Self {
                has_damage: false,
                damage_count: 0,
                overall_confidence: 1.0,
                worst_severity: None,
            };
        }

        let sum: f64 = confidences.iter().sum();
        let worst_severity = confidences
            .iter()
            .map(|c| DamageSeverity::from_confidence(*c))
            .max();

        Self {
            has_damage: true,
            damage_count,
            overall_confidence: sum / confidences.len() as f64,
            worst_severity,
        }
    }
}

impl Inspection {
    /// Create a new in-progress inspection
    /// parcel_id MUST be valid (checked by caller)
    pub fn new(parcel_id: Uuid, inspection_type: InspectionType, images_expected: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            parcel_id,
            inspection_type,
            status: InspectionStatus::InProgress,
            images_expected,
            images_received: 0,
            has_damage: false,
            damage_count: 0,
            overall_confidence: None,
            failure_reason: None,
            started_at: Utc::now(),
            completed_at: None,
            duration_seconds: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == InspectionStatus::InProgress
    }

    /// Fails unless the inspection is still collecting images
    pub fn ensure_in_progress(&self) -> DomainResult<()> {
        if self.is_in_progress() {
            Ok(())
        } else {
            Err(DomainError::InvalidState(format!(
                "Inspection {} is {}, not in_progress",
                self.id, self.status
            )))
        }
    }

    /// Finalize with aggregated evidence. Completion is allowed only once.
    pub fn complete(&mut self, aggregate: &DetectionAggregate) -> DomainResult<()> {
        match self.status {
            InspectionStatus::InProgress => {}
            InspectionStatus::Completed => {
                return Err(DomainError::InvalidState(format!(
                    "Inspection {} is already completed",
                    self.id
                )))
            }
            InspectionStatus::Failed => {
                return Err(DomainError::InvalidState(format!(
                    "Inspection {} has failed and cannot be completed",
                    self.id
                )))
            }
        }

        let now = Utc::now();
        self.has_damage = aggregate.has_damage;
        self.damage_count = aggregate.damage_count;
        self.overall_confidence = Some(aggregate.overall_confidence);
        self.status = InspectionStatus::Completed;
        self.completed_at = Some(now);
        self.duration_seconds = Some((now - self.started_at).num_seconds().max(0));
        Ok(())
    }

    /// Administrative in_progress -> failed transition
    pub fn mark_failed(&mut self, reason: String) -> DomainResult<()> {
        self.ensure_in_progress()?;
        self.status = InspectionStatus::Failed;
        self.failure_reason = Some(reason);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Evidence for the rule engine; only available once completed
    pub fn evidence(&self) -> DomainResult<InspectionEvidence> {
        if self.status != InspectionStatus::Completed {
            return Err(DomainError::InvalidState(format!(
                "Inspection {} is {}; evidence is only final once completed",
                self.id, self.status
            )));
        }

        Ok(InspectionEvidence {
            has_damage: self.has_damage,
            damage_count: self.damage_count,
            images_received: self.images_received,
            overall_confidence: self.overall_confidence.unwrap_or(1.0),
        })
    }
}

impl InspectionImage {
    pub fn new(
        inspection_id: Uuid,
        angle: ImageAngle,
        sequence_number: u32,
        content_digest: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            inspection_id,
            angle,
            sequence_number,
            content_digest,
            processed: false,
            processed_at: None,
            uploaded_at: Utc::now(),
        }
    }
}

// ============================================================================
// STRING CONVERSIONS
// ============================================================================

impl InspectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionType::Automated => "automated",
            InspectionType::Manual => "manual",
            InspectionType::Appeal => "appeal",
        }
    }
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::InProgress => "in_progress",
            InspectionStatus::Completed => "completed",
            InspectionStatus::Failed => "failed",
        }
    }
}

impl ImageAngle {
    /// Capture order used when angles are assigned automatically
    pub const CAPTURE_ORDER: [ImageAngle; 6] = [
        ImageAngle::Front,
        ImageAngle::Back,
        ImageAngle::Left,
        ImageAngle::Right,
        ImageAngle::Top,
        ImageAngle::Bottom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageAngle::Front => "front",
            ImageAngle::Back => "back",
            ImageAngle::Left => "left",
            ImageAngle::Right => "right",
            ImageAngle::Top => "top",
            ImageAngle::Bottom => "bottom",
        }
    }
}

impl std::fmt::Display for InspectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for ImageAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InspectionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automated" => Ok(InspectionType::Automated),
            "manual" => Ok(InspectionType::Manual),
            "appeal" => Ok(InspectionType::Appeal),
            other => Err(DomainError::Validation(format!(
                "Invalid inspection type '{}'",
                other
            ))),
        }
    }
}

impl std::str::FromStr for InspectionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(InspectionStatus::InProgress),
            "completed" => Ok(InspectionStatus::Completed),
            "failed" => Ok(InspectionStatus::Failed),
            other => Err(DomainError::Validation(format!(
                "Invalid inspection status '{}'",
                other
            ))),
        }
    }
}

impl std::str::FromStr for ImageAngle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageAngle::CAPTURE_ORDER
            .iter()
            .copied()
            .find(|angle| angle.as_str() == s)
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "Invalid angle '{}'. Must be one of: front, back, left, right, top, bottom",
                    s
                ))
            })
    }
}
