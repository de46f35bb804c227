// src/repositories/detection_repository.rs
//
// Damage Detection Repository
//
// Detections are written only as a batch together with the processed flag of
// the image they came from.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Row, TransactionBehavior};
use uuid::Uuid;

use super::row_mapping::{enum_column, opt_uuid_column, timestamp_column, uuid_column};
use crate::db::ConnectionPool;
use crate::domain::{BoundingBox, DamageDetection};
use crate::error::AppResult;

const DETECTION_COLUMNS: &str = "id, inspection_id, image_id, damage_type, confidence, severity,
    bbox_x1, bbox_y1, bbox_x2, bbox_y2, detected_at";

pub trait DetectionRepository: Send + Sync {
    /// Store one image's detections and mark the image processed
    ///
    /// Applies only while the image is unprocessed and its inspection is in
    /// progress; returns false (nothing written) otherwise.
    fn record_batch(
        &self,
        image_id: Uuid,
        detections: &[DamageDetection],
        processed_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    fn list_by_inspection(&self, inspection_id: Uuid) -> AppResult<Vec<DamageDetection>>;
}

pub struct SqliteDetectionRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteDetectionRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_detection(row: &Row) -> rusqlite::Result<DamageDetection> {
        Ok(DamageDetection {
            id: uuid_column(row, "id")?,
            inspection_id: uuid_column(row, "inspection_id")?,
            image_id: opt_uuid_column(row, "image_id")?,
            damage_type: row.get("damage_type")?,
            confidence: row.get("confidence")?,
            severity: enum_column(row, "severity")?,
            bbox: BoundingBox::new(
                row.get("bbox_x1")?,
                row.get("bbox_y1")?,
                row.get("bbox_x2")?,
                row.get("bbox_y2")?,
            ),
            detected_at: timestamp_column(row, "detected_at")?,
        })
    }

}

impl DetectionRepository for SqliteDetectionRepository {
    fn record_batch(
        &self,
        image_id: Uuid,
        detections: &[DamageDetection],
        processed_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = tx.execute(
            "UPDATE inspection_images SET processed = 1, processed_at = ?1
             WHERE id = ?2 AND processed = 0
               AND EXISTS (SELECT 1 FROM inspections i
                           WHERE i.id = inspection_images.inspection_id
                             AND i.overall_status = 'in_progress')",
            params![processed_at.to_rfc3339(), image_id.to_string()],
        )?;
        if updated == 0 {
            return Ok(false);
        }

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO damage_detections ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                DETECTION_COLUMNS
            ))?;
            for detection in detections {
                stmt.execute(params![
                    detection.id.to_string(),
                    detection.inspection_id.to_string(),
                    detection.image_id.map(|id| id.to_string()),
                    detection.damage_type,
                    detection.confidence,
                    detection.severity.as_str(),
                    detection.bbox.x1,
                    detection.bbox.y1,
                    detection.bbox.x2,
                    detection.bbox.y2,
                    detection.detected_at.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(true)
    }

    fn list_by_inspection(&self, inspection_id: Uuid) -> AppResult<Vec<DamageDetection>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM damage_detections WHERE inspection_id = ?1 ORDER BY detected_at, id",
            DETECTION_COLUMNS
        ))?;
        let detections = stmt
            .query_map(params![inspection_id.to_string()], Self::row_to_detection)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(detections)
    }
}
