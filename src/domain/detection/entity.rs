use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw detector output for one damage region
///
/// This is what the detection adapter returns; it carries no identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Damage-type label (torn_cardboard, crushed_corner, dent, ...)
    pub class_name: String,

    /// Confidence in [0, 1]
    pub confidence: f64,

    pub bbox: BoundingBox,
}

/// Normalized bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn area(&self) -> f64 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

/// Persisted damage detection, owned by an inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageDetection {
    pub id: Uuid,
    pub inspection_id: Uuid,
    pub image_id: Option<Uuid>,
    pub damage_type: String,
    pub confidence: f64,
    pub bbox: BoundingBox,

    /// Derived from confidence at creation
    pub severity: DamageSeverity,

    pub detected_at: DateTime<Utc>,
}

impl DamageDetection {
    /// Build a detection row from one detector result
    pub fn from_result(inspection_id: Uuid, image_id: Uuid, result: &DetectionResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            inspection_id,
            image_id: Some(image_id),
            damage_type: result.class_name.clone(),
            confidence: result.confidence,
            bbox: result.bbox,
            severity: DamageSeverity::from_confidence(result.confidence),
            detected_at: Utc::now(),
        }
    }
}

/// Damage severity scale
///
/// Ordered from least to most severe so `max()` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSeverity {
    Minor,
    Moderate,
    Severe,
    TotalLoss,
}

impl DamageSeverity {
    /// Severity of a single detection: > 0.8 severe, > 0.6 moderate, otherwise minor
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            DamageSeverity::Severe
        } else if confidence > 0.6 {
            DamageSeverity::Moderate
        } else {
            DamageSeverity::Minor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DamageSeverity::Minor => "minor",
            DamageSeverity::Moderate => "moderate",
            DamageSeverity::Severe => "severe",
            DamageSeverity::TotalLoss => "total_loss",
        }
    }
}

impl std::fmt::Display for DamageSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DamageSeverity {
    type Err = crate::domain::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minor" => Ok(DamageSeverity::Minor),
            "moderate" => Ok(DamageSeverity::Moderate),
            "severe" => Ok(DamageSeverity::Severe),
            "total_loss" => Ok(DamageSeverity::TotalLoss),
            other => Err(crate::domain::DomainError::Validation(format!(
                "Invalid damage severity '{}'",
                other
            ))),
        }
    }
}
