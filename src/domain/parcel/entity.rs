use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::detection::DamageSeverity;
use crate::domain::resolution::{Decision, ResolutionAction};
use crate::domain::{DomainError, DomainResult};

/// A physical shipment unit tracked through receiving, inspection and resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Carrier tracking number (unique)
    pub tracking_number: String,

    pub status: ParcelStatus,

    pub has_damage: bool,

    /// Highest severity seen in the latest completed inspection
    pub damage_severity: Option<DamageSeverity>,

    /// True only when the engine resolved the parcel without human review
    pub auto_resolved: bool,

    pub resolution_action: Option<ResolutionAction>,

    /// Reason reported by the rule that produced the applied decision
    pub auto_resolution_reason: Option<String>,

    pub received_at: DateTime<Utc>,
    pub inspected_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Closed set of parcel statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    Received,
    Inspecting,
    Approved,
    Damaged,
    Quarantine,
    Stored,
    Picked,
    Shipped,
    Returned,
    ManualReview,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 10] = [
        ParcelStatus::Received,
        ParcelStatus::Inspecting,
        ParcelStatus::Approved,
        ParcelStatus::Damaged,
        ParcelStatus::Quarantine,
        ParcelStatus::Stored,
        ParcelStatus::Picked,
        ParcelStatus::Shipped,
        ParcelStatus::Returned,
        ParcelStatus::ManualReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Received => "received",
            ParcelStatus::Inspecting => "inspecting",
            ParcelStatus::Approved => "approved",
            ParcelStatus::Damaged => "damaged",
            ParcelStatus::Quarantine => "quarantine",
            ParcelStatus::Stored => "stored",
            ParcelStatus::Picked => "picked",
            ParcelStatus::Shipped => "shipped",
            ParcelStatus::Returned => "returned",
            ParcelStatus::ManualReview => "manual_review",
        }
    }

    /// Statuses an auto-resolved parcel may hold
    pub fn is_auto_resolution_terminal(&self) -> bool {
        matches!(self, ParcelStatus::Approved | ParcelStatus::Quarantine)
    }
}

impl std::fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ParcelStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParcelStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = ParcelStatus::ALL.iter().map(|st| st.as_str()).collect();
                DomainError::Validation(format!(
                    "Invalid status '{}'. Must be one of: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

impl Parcel {
    /// Create a freshly received parcel
    /// tracking_number MUST be validated by caller
    pub fn new(tracking_number: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tracking_number,
            status: ParcelStatus::Received,
            has_damage: false,
            damage_severity: None,
            auto_resolved: false,
            resolution_action: None,
            auto_resolution_reason: None,
            received_at: now,
            inspected_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Assign a status by name
    ///
    /// Only set membership is checked; any status is reachable from any other.
    /// Moving away from the status an applied decision projected clears the
    /// auto-resolution flag and action. The reason is kept as history.
    pub fn set_status(&mut self, status: &str) -> DomainResult<()> {
        let status: ParcelStatus = status.parse()?;
        let keeps_resolution = self
            .resolution_action
            .is_some_and(|action| action.as_str() == status.as_str());
        if !keeps_resolution {
            self.auto_resolved = false;
            self.resolution_action = None;
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Project a decision onto the parcel status fields
    pub fn apply_decision(&mut self, decision: &Decision) -> DomainResult<()> {
        let now = Utc::now();
        if decision.can_auto_resolve {
            // Status name equals the action name (approved | quarantine)
            self.set_status(decision.action.as_str())?;
            self.auto_resolved = true;
            self.resolution_action = Some(decision.action);
            self.auto_resolution_reason = Some(decision.reason.clone());
            self.completed_at = Some(now);
        } else {
            self.auto_resolved = false;
            self.resolution_action = None;
            self.auto_resolution_reason = Some(decision.reason.clone());
            self.status = ParcelStatus::ManualReview;
        }
        self.updated_at = now;
        Ok(())
    }
}
