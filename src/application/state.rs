// src/application/state.rs

use std::sync::Arc;

use log::info;

use crate::db::ConnectionPool;
use crate::error::AppResult;
use crate::events::{register_logging_handlers, EventBus};
use crate::integrations::DetectionAdapter;
use crate::repositories::{
    ParcelRepository, SqliteDetectionRepository, SqliteInspectionRepository,
    SqliteParcelRepository, SqliteSettingsRepository,
};
use crate::services::{
    InspectionService, ParcelService, ResolutionService, SettingsProvider, SettingsService,
};

/// Application state shared by every command.
/// All fields are Arc-wrapped for thread-safe sharing across commands.
pub struct AppState {
    pub pool: Arc<ConnectionPool>,
    pub event_bus: Arc<EventBus>,
    pub parcel_service: Arc<ParcelService>,
    pub inspection_service: Arc<InspectionService>,
    pub resolution_service: Arc<ResolutionService>,
    pub settings_service: Arc<SettingsService>,

    /// Boundary limit on images per inspection
    pub max_images_per_inspection: u32,
}

impl AppState {
    /// Wire repositories and services on top of an initialized pool
    ///
    /// The detector is owned by the caller; default settings are seeded.
    pub fn new(
        pool: Arc<ConnectionPool>,
        detector: Arc<dyn DetectionAdapter>,
        max_images_per_inspection: u32,
    ) -> AppResult<Self> {
        let event_bus = Arc::new(EventBus::new());
        register_logging_handlers(&event_bus);

        let parcel_repo: Arc<dyn ParcelRepository> =
            Arc::new(SqliteParcelRepository::new(Arc::clone(&pool)));
        let inspection_repo = Arc::new(SqliteInspectionRepository::new(Arc::clone(&pool)));
        let detection_repo = Arc::new(SqliteDetectionRepository::new(Arc::clone(&pool)));
        let settings_repo = Arc::new(SqliteSettingsRepository::new(Arc::clone(&pool)));

        let parcel_service = Arc::new(ParcelService::new(
            Arc::clone(&parcel_repo),
            Arc::clone(&event_bus),
        ));
        let inspection_service = Arc::new(
            InspectionService::new(
                Arc::clone(&parcel_repo),
                inspection_repo,
                detection_repo,
                detector,
                Arc::clone(&event_bus),
            )
            .with_image_limit(max_images_per_inspection),
        );

        let settings_service = Arc::new(SettingsService::new(settings_repo));
        settings_service.seed_defaults()?;

        let provider: Arc<dyn SettingsProvider> = settings_service.clone();
        let resolution_service = Arc::new(ResolutionService::new(
            parcel_repo,
            Arc::clone(&inspection_service),
            provider,
            Arc::clone(&event_bus),
        ));

        info!(
            "Application state ready (max {} images per inspection)",
            max_images_per_inspection
        );

        Ok(Self {
            pool,
            event_bus,
            parcel_service,
            inspection_service,
            resolution_service,
            settings_service,
            max_images_per_inspection,
        })
    }
}
