// src/services/test_support.rs
//
// Wiring for service tests: a file-backed SQLite pool in a temp dir (so
// threads share one database), real repositories and an injected detector.

use std::sync::Arc;

use tempfile::TempDir;

use crate::db::create_test_pool;
use crate::domain::{
    BoundingBox, DetectionResult, ImageAngle, Inspection, InspectionImage, InspectionType, Parcel,
};
use crate::events::EventBus;
use crate::integrations::detector::{DetectionAdapter, MockDetectionAdapter};
use crate::repositories::{
    ParcelRepository, SqliteDetectionRepository, SqliteInspectionRepository,
    SqliteParcelRepository, SqliteSettingsRepository,
};
use crate::services::{
    InspectionService, ParcelService, ResolutionService, SettingsProvider, SettingsService,
};

pub(crate) struct Harness {
    pub bus: Arc<EventBus>,
    pub parcel_repo: Arc<dyn ParcelRepository>,
    pub parcels: Arc<ParcelService>,
    pub inspections: Arc<InspectionService>,
    pub settings: Arc<SettingsService>,
    pub resolution: Arc<ResolutionService>,
    _dir: TempDir,
}

impl Harness {
    pub fn new(detector: Arc<dyn DetectionAdapter>) -> Self {
        let (pool, dir) = create_test_pool();
        let pool = Arc::new(pool);
        let bus = Arc::new(EventBus::new());

        let parcel_repo: Arc<dyn ParcelRepository> =
            Arc::new(SqliteParcelRepository::new(Arc::clone(&pool)));
        let inspection_repo = Arc::new(SqliteInspectionRepository::new(Arc::clone(&pool)));
        let detection_repo = Arc::new(SqliteDetectionRepository::new(Arc::clone(&pool)));
        let settings_repo = Arc::new(SqliteSettingsRepository::new(Arc::clone(&pool)));

        let parcels = Arc::new(ParcelService::new(Arc::clone(&parcel_repo), Arc::clone(&bus)));
        let inspections = Arc::new(InspectionService::new(
            Arc::clone(&parcel_repo),
            inspection_repo,
            detection_repo,
            detector,
            Arc::clone(&bus),
        ));
        let settings = Arc::new(SettingsService::new(settings_repo));
        settings.seed_defaults().unwrap();

        let provider: Arc<dyn SettingsProvider> = settings.clone();
        let resolution = Arc::new(ResolutionService::new(
            Arc::clone(&parcel_repo),
            Arc::clone(&inspections),
            provider,
            Arc::clone(&bus),
        ));

        Self {
            bus,
            parcel_repo,
            parcels,
            inspections,
            settings,
            resolution,
            _dir: dir,
        }
    }

    /// Detector that returns the same results for every image
    pub fn with_detections(results: Vec<DetectionResult>) -> Self {
        let mut detector = MockDetectionAdapter::new();
        detector
            .expect_detect()
            .returning(move |_| Ok(results.clone()));
        Self::new(Arc::new(detector))
    }

    /// Detector that must never be called
    pub fn without_detector() -> Self {
        let mut detector = MockDetectionAdapter::new();
        detector.expect_detect().never();
        Self::new(Arc::new(detector))
    }

    pub fn parcel(&self, tracking_number: &str) -> Parcel {
        self.parcels.register_parcel(tracking_number).unwrap()
    }

    /// Parcel + in-progress inspection with `images` recorded in capture order
    pub fn inspection_with_images(
        &self,
        tracking_number: &str,
        images: usize,
    ) -> (Parcel, Inspection, Vec<InspectionImage>) {
        let parcel = self.parcel(tracking_number);
        let inspection = self
            .inspections
            .create_inspection(parcel.id, InspectionType::Automated, None)
            .unwrap();

        let recorded = (0..images)
            .map(|n| {
                let angle = ImageAngle::CAPTURE_ORDER[n % ImageAngle::CAPTURE_ORDER.len()];
                self.inspections
                    .record_image(inspection.id, angle, n as u32 + 1, Some(b"jpeg-bytes"))
                    .unwrap()
            })
            .collect();

        (parcel, inspection, recorded)
    }

    pub fn count_events(&self, event_type: &str) -> usize {
        self.bus
            .get_event_log()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

pub(crate) fn detection(class_name: &str, confidence: f64) -> DetectionResult {
    DetectionResult {
        class_name: class_name.to_string(),
        confidence,
        bbox: BoundingBox::new(0.1, 0.2, 0.4, 0.6),
    }
}
