pub mod entity;
pub mod invariants;

pub use entity::{
    DetectionAggregate, ImageAngle, Inspection, InspectionImage, InspectionStatus, InspectionType,
    DEFAULT_IMAGES_EXPECTED,
};
pub use invariants::validate_inspection;
