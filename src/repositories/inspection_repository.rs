// src/repositories/inspection_repository.rs
//
// Inspection Repository
//
// Covers the `inspections` and `inspection_images` tables. These operations
// are whole units of work, each one IMMEDIATE transaction:
//
// - create:    inspection insert + parcel moved to inspecting
// - add_image: bounded images_received increment + image insert
// - complete:  confidences read + aggregation + status update + parcel damage fields
//
// IMMEDIATE takes the write lock at BEGIN, so concurrent callers queue on the
// busy timeout instead of interleaving their read-modify-write.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use super::row_mapping::{
    count_column, enum_column, opt_timestamp_column, timestamp_column, uuid_column,
};
use crate::db::ConnectionPool;
use crate::domain::{DamageSeverity, DomainResult, Inspection, InspectionImage, ParcelStatus};
use crate::error::{AppError, AppResult};

const INSPECTION_COLUMNS: &str = "id, parcel_id, inspection_type, overall_status,
    images_expected, images_received, has_damage, damage_count, overall_confidence,
    failure_reason, started_at, completed_at, duration_seconds";

const IMAGE_COLUMNS: &str =
    "id, inspection_id, angle, sequence_number, content_digest, processed, processed_at, uploaded_at";

/// Applies the completion transition to a loaded inspection given the
/// confidences of its stored detections, returning the worst severity seen
pub type CompletionFn<'a> = &'a dyn Fn(&mut Inspection, &[f64]) -> DomainResult<Option<DamageSeverity>>;

/// Outcome of `InspectionRepository::add_image`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAdmission {
    /// Stored; carries the new `images_received`
    Accepted(u32),

    /// Inspection missing or no longer in progress
    Closed,

    /// Inspection already holds the maximum number of images
    Full,
}

pub trait InspectionRepository: Send + Sync {
    /// Insert an inspection and move its parcel to `inspecting`
    fn create(&self, inspection: &Inspection) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Inspection>>;

    /// Newest first
    fn list_by_parcel(&self, parcel_id: Uuid) -> AppResult<Vec<Inspection>>;

    /// Insert the image and increment `images_received` atomically
    ///
    /// With `max_images` set, the increment only happens while the inspection
    /// holds fewer images. Nothing is written unless the image is accepted.
    fn add_image(&self, image: &InspectionImage, max_images: Option<u32>) -> AppResult<ImageAdmission>;

    fn get_image(&self, image_id: Uuid) -> AppResult<Option<InspectionImage>>;

    /// Ordered by sequence number
    fn list_images(&self, inspection_id: Uuid) -> AppResult<Vec<InspectionImage>>;

    /// Finalize an inspection in one transaction
    ///
    /// `finalize` runs against the row as read inside the transaction; its
    /// error aborts everything. The parcel receives the damage outcome.
    fn complete(&self, inspection_id: Uuid, finalize: CompletionFn<'_>) -> AppResult<Inspection>;

    /// Conditional in_progress -> failed. Returns false when nothing changed.
    fn mark_failed(&self, inspection: &Inspection) -> AppResult<bool>;
}

pub struct SqliteInspectionRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteInspectionRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_inspection(row: &Row) -> rusqlite::Result<Inspection> {
        Ok(Inspection {
            id: uuid_column(row, "id")?,
            parcel_id: uuid_column(row, "parcel_id")?,
            inspection_type: enum_column(row, "inspection_type")?,
            status: enum_column(row, "overall_status")?,
            images_expected: count_column(row, "images_expected")?,
            images_received: count_column(row, "images_received")?,
            has_damage: row.get("has_damage")?,
            damage_count: count_column(row, "damage_count")?,
            overall_confidence: row.get("overall_confidence")?,
            failure_reason: row.get("failure_reason")?,
            started_at: timestamp_column(row, "started_at")?,
            completed_at: opt_timestamp_column(row, "completed_at")?,
            duration_seconds: row.get("duration_seconds")?,
        })
    }

    fn row_to_image(row: &Row) -> rusqlite::Result<InspectionImage> {
        Ok(InspectionImage {
            id: uuid_column(row, "id")?,
            inspection_id: uuid_column(row, "inspection_id")?,
            angle: enum_column(row, "angle")?,
            sequence_number: count_column(row, "sequence_number")?,
            content_digest: row.get("content_digest")?,
            processed: row.get("processed")?,
            processed_at: opt_timestamp_column(row, "processed_at")?,
            uploaded_at: timestamp_column(row, "uploaded_at")?,
        })
    }

    fn load_inspection(conn: &Connection, id: Uuid) -> AppResult<Option<Inspection>> {
        let inspection = conn
            .query_row(
                &format!("SELECT {} FROM inspections WHERE id = ?1", INSPECTION_COLUMNS),
                params![id.to_string()],
                Self::row_to_inspection,
            )
            .optional()?;
        Ok(inspection)
    }
}

impl InspectionRepository for SqliteInspectionRepository {
    fn create(&self, inspection: &Inspection) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            &format!(
                "INSERT INTO inspections ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                INSPECTION_COLUMNS
            ),
            params![
                inspection.id.to_string(),
                inspection.parcel_id.to_string(),
                inspection.inspection_type.as_str(),
                inspection.status.as_str(),
                inspection.images_expected,
                inspection.images_received,
                inspection.has_damage,
                inspection.damage_count,
                inspection.overall_confidence,
                inspection.failure_reason,
                inspection.started_at.to_rfc3339(),
                inspection.completed_at.map(|t| t.to_rfc3339()),
                inspection.duration_seconds,
            ],
        )?;

        tx.execute(
            "UPDATE parcels SET status = ?1, auto_resolved = 0, resolution_action = NULL, updated_at = ?2
             WHERE id = ?3",
            params![
                ParcelStatus::Inspecting.as_str(),
                inspection.started_at.to_rfc3339(),
                inspection.parcel_id.to_string(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Inspection>> {
        let conn = self.pool.get()?;
        Self::load_inspection(&conn, id)
    }

    fn list_by_parcel(&self, parcel_id: Uuid) -> AppResult<Vec<Inspection>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM inspections WHERE parcel_id = ?1 ORDER BY started_at DESC",
            INSPECTION_COLUMNS
        ))?;
        let inspections = stmt
            .query_map(params![parcel_id.to_string()], Self::row_to_inspection)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(inspections)
    }

    fn add_image(&self, image: &InspectionImage, max_images: Option<u32>) -> AppResult<ImageAdmission> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = tx.execute(
            "UPDATE inspections SET images_received = images_received + 1
             WHERE id = ?1 AND overall_status = 'in_progress'
               AND (?2 IS NULL OR images_received < ?2)",
            params![image.inspection_id.to_string(), max_images],
        )?;
        if updated == 0 {
            let open: bool = tx
                .query_row(
                    "SELECT 1 FROM inspections WHERE id = ?1 AND overall_status = 'in_progress'",
                    params![image.inspection_id.to_string()],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false);
            return Ok(if open {
                ImageAdmission::Full
            } else {
                ImageAdmission::Closed
            });
        }

        tx.execute(
            &format!(
                "INSERT INTO inspection_images ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                IMAGE_COLUMNS
            ),
            params![
                image.id.to_string(),
                image.inspection_id.to_string(),
                image.angle.as_str(),
                image.sequence_number,
                image.content_digest,
                image.processed,
                image.processed_at.map(|t| t.to_rfc3339()),
                image.uploaded_at.to_rfc3339(),
            ],
        )?;

        let images_received: i64 = tx.query_row(
            "SELECT images_received FROM inspections WHERE id = ?1",
            params![image.inspection_id.to_string()],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(ImageAdmission::Accepted(images_received.max(0) as u32))
    }

    fn get_image(&self, image_id: Uuid) -> AppResult<Option<InspectionImage>> {
        let conn = self.pool.get()?;
        let image = conn
            .query_row(
                &format!("SELECT {} FROM inspection_images WHERE id = ?1", IMAGE_COLUMNS),
                params![image_id.to_string()],
                Self::row_to_image,
            )
            .optional()?;
        Ok(image)
    }

    fn list_images(&self, inspection_id: Uuid) -> AppResult<Vec<InspectionImage>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM inspection_images WHERE inspection_id = ?1
             ORDER BY sequence_number, uploaded_at",
            IMAGE_COLUMNS
        ))?;
        let images = stmt
            .query_map(params![inspection_id.to_string()], Self::row_to_image)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }

    fn complete(&self, inspection_id: Uuid, finalize: CompletionFn<'_>) -> AppResult<Inspection> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut inspection = Self::load_inspection(&tx, inspection_id)?
            .ok_or_else(|| AppError::not_found("Inspection", inspection_id))?;

        let confidences = {
            let mut stmt =
                tx.prepare("SELECT confidence FROM damage_detections WHERE inspection_id = ?1")?;
            let rows = stmt
                .query_map(params![inspection_id.to_string()], |row| row.get::<_, f64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let worst_severity = finalize(&mut inspection, &confidences)?;

        let updated = tx.execute(
            "UPDATE inspections SET
                overall_status = ?1, has_damage = ?2, damage_count = ?3,
                overall_confidence = ?4, completed_at = ?5, duration_seconds = ?6
             WHERE id = ?7 AND overall_status = 'in_progress'",
            params![
                inspection.status.as_str(),
                inspection.has_damage,
                inspection.damage_count,
                inspection.overall_confidence,
                inspection.completed_at.map(|t| t.to_rfc3339()),
                inspection.duration_seconds,
                inspection.id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(AppError::invalid_state(format!(
                "Inspection {} is no longer in progress",
                inspection.id
            )));
        }

        let now = inspection.completed_at.unwrap_or_else(Utc::now).to_rfc3339();
        tx.execute(
            "UPDATE parcels SET has_damage = ?1, damage_severity = ?2, inspected_at = ?3, updated_at = ?3
             WHERE id = ?4",
            params![
                inspection.has_damage,
                worst_severity.map(|s| s.as_str()),
                now,
                inspection.parcel_id.to_string(),
            ],
        )?;

        tx.commit()?;
        Ok(inspection)
    }

    fn mark_failed(&self, inspection: &Inspection) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE inspections SET overall_status = ?1, failure_reason = ?2, completed_at = ?3
             WHERE id = ?4 AND overall_status = 'in_progress'",
            params![
                inspection.status.as_str(),
                inspection.failure_reason,
                inspection.completed_at.map(|t| t.to_rfc3339()),
                inspection.id.to_string(),
            ],
        )?;
        Ok(updated == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::domain::{
        DetectionAggregate, ImageAngle, InspectionStatus, InspectionType, Parcel,
    };
    use crate::repositories::{ParcelRepository, SqliteParcelRepository};

    fn setup() -> (SqliteInspectionRepository, SqliteParcelRepository, Parcel, tempfile::TempDir) {
        let (pool, dir) = create_test_pool();
        let pool = Arc::new(pool);
        let parcels = SqliteParcelRepository::new(Arc::clone(&pool));
        let parcel = Parcel::new("TRK-INSP".to_string());
        parcels.insert(&parcel).unwrap();
        (SqliteInspectionRepository::new(pool), parcels, parcel, dir)
    }

    fn finalize(inspection: &mut Inspection, confidences: &[f64]) -> DomainResult<Option<DamageSeverity>> {
        let aggregate = DetectionAggregate::from_confidences(confidences);
        inspection.complete(&aggregate)?;
        Ok(aggregate.worst_severity)
    }

    #[test]
    fn test_create_moves_parcel_to_inspecting() {
        let (repo, parcels, parcel, _dir) = setup();
        let inspection = Inspection::new(parcel.id, InspectionType::Automated, 6);
        repo.create(&inspection).unwrap();

        let loaded = repo.get_by_id(inspection.id).unwrap().unwrap();
        assert_eq!(loaded.status, InspectionStatus::InProgress);
        assert_eq!(loaded.images_expected, 6);

        let parcel = parcels.get_by_id(parcel.id).unwrap().unwrap();
        assert_eq!(parcel.status, ParcelStatus::Inspecting);
    }

    #[test]
    fn test_reinspection_clears_previous_resolution() {
        let (repo, parcels, mut parcel, _dir) = setup();
        parcel.status = ParcelStatus::Approved;
        parcel.auto_resolved = true;
        parcel.resolution_action = Some(crate::domain::ResolutionAction::Approved);
        parcels.update(&parcel).unwrap();

        repo.create(&Inspection::new(parcel.id, InspectionType::Automated, 6))
            .unwrap();

        let parcel = parcels.get_by_id(parcel.id).unwrap().unwrap();
        assert_eq!(parcel.status, ParcelStatus::Inspecting);
        assert!(!parcel.auto_resolved);
        assert_eq!(parcel.resolution_action, None);
        assert!(crate::domain::validate_parcel(&parcel).is_ok());
    }

    #[test]
    fn test_add_image_increments() {
        let (repo, _parcels, parcel, _dir) = setup();
        let inspection = Inspection::new(parcel.id, InspectionType::Automated, 6);
        repo.create(&inspection).unwrap();

        for (seq, angle) in ImageAngle::CAPTURE_ORDER.iter().take(3).enumerate() {
            let image = InspectionImage::new(inspection.id, *angle, seq as u32 + 1, None);
            assert_eq!(
                repo.add_image(&image, None).unwrap(),
                ImageAdmission::Accepted(seq as u32 + 1)
            );
        }

        let images = repo.list_images(inspection.id).unwrap();
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].angle, ImageAngle::Front);
        assert_eq!(repo.get_by_id(inspection.id).unwrap().unwrap().images_received, 3);
    }

    #[test]
    fn test_add_image_rejected_after_completion() {
        let (repo, _parcels, parcel, _dir) = setup();
        let inspection = Inspection::new(parcel.id, InspectionType::Automated, 6);
        repo.create(&inspection).unwrap();
        repo.complete(inspection.id, &finalize).unwrap();

        let image = InspectionImage::new(inspection.id, ImageAngle::Top, 1, None);
        assert_eq!(repo.add_image(&image, None).unwrap(), ImageAdmission::Closed);
        assert!(repo.get_image(image.id).unwrap().is_none());

        let orphan = InspectionImage::new(Uuid::new_v4(), ImageAngle::Top, 1, None);
        assert_eq!(repo.add_image(&orphan, Some(6)).unwrap(), ImageAdmission::Closed);
    }

    #[test]
    fn test_add_image_stops_at_limit() {
        let (repo, _parcels, parcel, _dir) = setup();
        let inspection = Inspection::new(parcel.id, InspectionType::Automated, 2);
        repo.create(&inspection).unwrap();

        for seq in 1..=2 {
            let image = InspectionImage::new(inspection.id, ImageAngle::Front, seq, None);
            assert_eq!(
                repo.add_image(&image, Some(2)).unwrap(),
                ImageAdmission::Accepted(seq)
            );
        }

        let third = InspectionImage::new(inspection.id, ImageAngle::Back, 3, None);
        assert_eq!(repo.add_image(&third, Some(2)).unwrap(), ImageAdmission::Full);
        assert!(repo.get_image(third.id).unwrap().is_none());
        assert_eq!(repo.get_by_id(inspection.id).unwrap().unwrap().images_received, 2);
    }

    #[test]
    fn test_complete_twice_fails_without_mutation() {
        let (repo, parcels, parcel, _dir) = setup();
        let inspection = Inspection::new(parcel.id, InspectionType::Automated, 6);
        repo.create(&inspection).unwrap();

        let completed = repo.complete(inspection.id, &finalize).unwrap();
        assert_eq!(completed.status, InspectionStatus::Completed);
        assert_eq!(completed.overall_confidence, Some(1.0));

        let second = repo.complete(inspection.id, &finalize);
        assert!(matches!(
            second,
            Err(AppError::Domain(crate::domain::DomainError::InvalidState(_)))
        ));

        let parcel = parcels.get_by_id(parcel.id).unwrap().unwrap();
        assert!(!parcel.has_damage);
        assert!(parcel.inspected_at.is_some());
        assert_eq!(parcel.status, ParcelStatus::Inspecting);
    }

    #[test]
    fn test_mark_failed_is_conditional() {
        let (repo, _parcels, parcel, _dir) = setup();
        let mut inspection = Inspection::new(parcel.id, InspectionType::Manual, 6);
        repo.create(&inspection).unwrap();

        inspection.mark_failed("lighting".to_string()).unwrap();
        assert!(repo.mark_failed(&inspection).unwrap());
        assert!(!repo.mark_failed(&inspection).unwrap());

        let loaded = repo.get_by_id(inspection.id).unwrap().unwrap();
        assert_eq!(loaded.status, InspectionStatus::Failed);
        assert_eq!(loaded.failure_reason.as_deref(), Some("lighting"));
    }

    #[test]
    fn test_second_active_inspection_rejected() {
        let (repo, _parcels, parcel, _dir) = setup();
        repo.create(&Inspection::new(parcel.id, InspectionType::Automated, 6))
            .unwrap();
        let err = repo
            .create(&Inspection::new(parcel.id, InspectionType::Automated, 6))
            .unwrap_err();
        assert!(crate::repositories::is_constraint_violation(&err));
        assert_eq!(repo.list_by_parcel(parcel.id).unwrap().len(), 1);
    }
}
