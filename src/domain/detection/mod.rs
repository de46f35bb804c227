pub mod entity;
pub mod invariants;

pub use entity::{BoundingBox, DamageDetection, DamageSeverity, DetectionResult};
pub use invariants::validate_detection_result;
