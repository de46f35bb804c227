// src/services/inspection_service_tests.rs
//
// Inspection State Machine tests
//
// INVARIANTS TESTED:
// - images_received increments by exactly one per image, also under concurrency
// - Detections are stored only as a byproduct of processing one image
// - Completion aggregates stored detections exactly once
// - Concurrent completion: exactly one success, the rest InvalidState
// - A failed detector call leaves no trace and does not block completion

#[cfg(test)]
mod lifecycle_tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use crate::domain::{
        DamageSeverity, ImageAngle, InspectionStatus, InspectionType, ParcelStatus,
    };
    use crate::error::ErrorKind;
    use crate::integrations::detector::{DetectionError, MockDetectionAdapter};
    use crate::services::test_support::{detection, Harness};

    #[test]
    fn test_create_inspection_defaults() {
        let h = Harness::without_detector();
        let parcel = h.parcel("TRK-C1");

        let inspection = h
            .inspections
            .create_inspection(parcel.id, InspectionType::Automated, None)
            .unwrap();

        assert_eq!(inspection.status, InspectionStatus::InProgress);
        assert_eq!(inspection.images_expected, 6);
        assert_eq!(inspection.images_received, 0);
        assert_eq!(
            h.parcels.get_parcel(parcel.id).unwrap().status,
            ParcelStatus::Inspecting
        );
        assert_eq!(h.count_events("InspectionCreated"), 1);
        assert_eq!(h.count_events("ParcelStatusChanged"), 1);
    }

    #[test]
    fn test_create_inspection_rejections() {
        let h = Harness::without_detector();
        let parcel = h.parcel("TRK-C2");

        let missing = h
            .inspections
            .create_inspection(Uuid::new_v4(), InspectionType::Manual, None)
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let zero = h
            .inspections
            .create_inspection(parcel.id, InspectionType::Manual, Some(0))
            .unwrap_err();
        assert_eq!(zero.kind(), ErrorKind::Validation);

        let custom = h
            .inspections
            .create_inspection(parcel.id, InspectionType::Appeal, Some(3))
            .unwrap();
        assert_eq!(custom.images_expected, 3);

        let second = h
            .inspections
            .create_inspection(parcel.id, InspectionType::Automated, None)
            .unwrap_err();
        assert_eq!(second.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_record_image_increments_and_digests() {
        let h = Harness::without_detector();
        let (_parcel, inspection, images) = h.inspection_with_images("TRK-R1", 3);

        assert_eq!(
            h.inspections.get_inspection(inspection.id).unwrap().images_received,
            3
        );
        assert_eq!(images[0].angle, ImageAngle::Front);
        assert_eq!(images[2].angle, ImageAngle::Left);

        let digest = images[0].content_digest.as_deref().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

        let stored = h.inspections.list_images(inspection.id).unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|img| !img.processed));
    }

    #[test]
    fn test_no_upper_bound_on_images() {
        let h = Harness::without_detector();
        let (_parcel, inspection, _images) = h.inspection_with_images("TRK-R2", 8);

        let loaded = h.inspections.get_inspection(inspection.id).unwrap();
        assert_eq!(loaded.images_received, 8);
        assert_eq!(loaded.images_expected, 6);
    }

    #[test]
    fn test_concurrent_image_recording_loses_no_updates() {
        let h = Harness::without_detector();
        let (_parcel, inspection, _images) = h.inspection_with_images("TRK-R3", 0);

        std::thread::scope(|s| {
            for t in 0..6u32 {
                let inspections = Arc::clone(&h.inspections);
                s.spawn(move || {
                    for n in 0..5u32 {
                        inspections
                            .record_image(
                                inspection.id,
                                ImageAngle::CAPTURE_ORDER[t as usize],
                                t * 5 + n + 1,
                                None,
                            )
                            .unwrap();
                    }
                });
            }
        });

        let loaded = h.inspections.get_inspection(inspection.id).unwrap();
        assert_eq!(loaded.images_received, 30);
        assert_eq!(h.inspections.list_images(inspection.id).unwrap().len(), 30);
    }

    #[test]
    fn test_process_image_stores_detections_once() {
        let h = Harness::with_detections(vec![detection("dent", 0.9), detection("scratch", 0.5)]);
        let (_parcel, inspection, images) = h.inspection_with_images("TRK-P1", 1);

        let detections = h.inspections.process_image(images[0].id, b"jpeg").unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].severity, DamageSeverity::Severe);
        assert_eq!(detections[1].severity, DamageSeverity::Minor);
        assert!(h.inspections.get_image(images[0].id).unwrap().processed);

        let again = h
            .inspections
            .process_image(images[0].id, b"jpeg")
            .unwrap_err();
        assert_eq!(again.kind(), ErrorKind::InvalidState);
        assert_eq!(h.inspections.list_detections(inspection.id).unwrap().len(), 2);

        // Detections alone never change aggregates
        let loaded = h.inspections.get_inspection(inspection.id).unwrap();
        assert_eq!(loaded.damage_count, 0);
        assert!(!loaded.has_damage);
    }

    #[test]
    fn test_detector_failure_records_nothing_and_does_not_block_completion() {
        let mut detector = MockDetectionAdapter::new();
        let mut calls = 0;
        detector.expect_detect().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(DetectionError::Timeout)
            } else {
                Ok(vec![detection("crushed_corner", 0.7)])
            }
        });
        let h = Harness::new(Arc::new(detector));
        let (parcel, inspection, images) = h.inspection_with_images("TRK-P2", 2);

        let err = h
            .inspections
            .process_image(images[0].id, b"first")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DetectionUnavailable);
        assert!(!h.inspections.get_image(images[0].id).unwrap().processed);
        assert!(h.inspections.list_detections(inspection.id).unwrap().is_empty());
        assert_eq!(h.count_events("ImageProcessingFailed"), 1);

        h.inspections.process_image(images[1].id, b"second").unwrap();

        let completed = h.inspections.complete_inspection(inspection.id).unwrap();
        assert_eq!(completed.damage_count, 1);
        assert_eq!(completed.overall_confidence, Some(0.7));

        let parcel = h.parcels.get_parcel(parcel.id).unwrap();
        assert!(parcel.has_damage);
        assert_eq!(parcel.damage_severity, Some(DamageSeverity::Moderate));
    }

    #[test]
    fn test_record_detections_validates_input() {
        let h = Harness::without_detector();
        let (_parcel, inspection, images) = h.inspection_with_images("TRK-P3", 1);

        let err = h
            .inspections
            .record_detections(images[0].id, &[detection("dent", 0.8), detection("dent", 1.4)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(h.inspections.list_detections(inspection.id).unwrap().is_empty());
        assert!(!h.inspections.get_image(images[0].id).unwrap().processed);

        let missing = h
            .inspections
            .record_detections(Uuid::new_v4(), &[])
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_complete_aggregates_detections() {
        let h = Harness::without_detector();
        let (parcel, inspection, images) = h.inspection_with_images("TRK-A1", 6);

        h.inspections
            .record_detections(images[0].id, &[detection("dent", 0.9)])
            .unwrap();
        h.inspections
            .record_detections(images[3].id, &[detection("tear", 0.6)])
            .unwrap();

        let completed = h.inspections.complete_inspection(inspection.id).unwrap();
        assert_eq!(completed.status, InspectionStatus::Completed);
        assert!(completed.has_damage);
        assert_eq!(completed.damage_count, 2);
        assert!((completed.overall_confidence.unwrap() - 0.75).abs() < 1e-9);
        assert!(completed.completed_at.is_some());
        assert!(completed.duration_seconds.is_some());

        let parcel = h.parcels.get_parcel(parcel.id).unwrap();
        assert!(parcel.has_damage);
        assert_eq!(parcel.damage_severity, Some(DamageSeverity::Severe));
        assert!(parcel.inspected_at.is_some());
        assert_eq!(parcel.status, ParcelStatus::Inspecting);
    }

    #[test]
    fn test_complete_without_detections_is_fully_confident() {
        let h = Harness::without_detector();
        let (parcel, inspection, _images) = h.inspection_with_images("TRK-A2", 6);

        let completed = h.inspections.complete_inspection(inspection.id).unwrap();
        assert!(!completed.has_damage);
        assert_eq!(completed.damage_count, 0);
        assert_eq!(completed.overall_confidence, Some(1.0));
        assert_eq!(h.parcels.get_parcel(parcel.id).unwrap().damage_severity, None);
    }

    #[test]
    fn test_second_completion_fails_without_mutation() {
        let h = Harness::without_detector();
        let (_parcel, inspection, images) = h.inspection_with_images("TRK-A3", 2);

        h.inspections
            .record_detections(images[0].id, &[detection("dent", 0.8)])
            .unwrap();
        let first = h.inspections.complete_inspection(inspection.id).unwrap();

        let second = h.inspections.complete_inspection(inspection.id).unwrap_err();
        assert_eq!(second.kind(), ErrorKind::InvalidState);

        let loaded = h.inspections.get_inspection(inspection.id).unwrap();
        assert_eq!(loaded.damage_count, first.damage_count);
        assert_eq!(loaded.overall_confidence, first.overall_confidence);
        assert_eq!(loaded.completed_at, first.completed_at);
        assert_eq!(h.count_events("InspectionCompleted"), 1);
    }

    #[test]
    fn test_concurrent_completion_has_one_winner() {
        let h = Harness::without_detector();
        let (_parcel, inspection, _images) = h.inspection_with_images("TRK-A4", 6);

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let inspections = Arc::clone(&h.inspections);
                    s.spawn(move || inspections.complete_inspection(inspection.id))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for result in results.iter().filter(|r| r.is_err()) {
            assert_eq!(
                result.as_ref().unwrap_err().kind(),
                ErrorKind::InvalidState
            );
        }
    }

    #[test]
    fn test_concurrent_processing_of_distinct_images() {
        let h = Harness::with_detections(vec![detection("dent", 0.65)]);
        let (_parcel, inspection, images) = h.inspection_with_images("TRK-A5", 6);

        std::thread::scope(|s| {
            for image in &images {
                let inspections = Arc::clone(&h.inspections);
                let image_id = image.id;
                s.spawn(move || inspections.process_image(image_id, b"jpeg").unwrap());
            }
        });

        let completed = h.inspections.complete_inspection(inspection.id).unwrap();
        assert_eq!(completed.damage_count, 6);
        assert!(h
            .inspections
            .list_images(inspection.id)
            .unwrap()
            .iter()
            .all(|img| img.processed));
    }

    #[test]
    fn test_terminal_states_reject_further_work() {
        let h = Harness::without_detector();
        let (_parcel, inspection, images) = h.inspection_with_images("TRK-T1", 1);
        h.inspections.complete_inspection(inspection.id).unwrap();

        let image = h
            .inspections
            .record_image(inspection.id, ImageAngle::Top, 2, None)
            .unwrap_err();
        assert_eq!(image.kind(), ErrorKind::InvalidState);

        let detections = h
            .inspections
            .record_detections(images[0].id, &[detection("dent", 0.9)])
            .unwrap_err();
        assert_eq!(detections.kind(), ErrorKind::InvalidState);

        let fail = h
            .inspections
            .mark_failed(inspection.id, "operator error")
            .unwrap_err();
        assert_eq!(fail.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_mark_failed_is_terminal() {
        let h = Harness::without_detector();
        let (parcel, inspection, _images) = h.inspection_with_images("TRK-F1", 2);

        assert_eq!(
            h.inspections.mark_failed(inspection.id, "  ").unwrap_err().kind(),
            ErrorKind::Validation
        );

        let failed = h
            .inspections
            .mark_failed(inspection.id, "camera offline")
            .unwrap();
        assert_eq!(failed.status, InspectionStatus::Failed);
        assert_eq!(h.count_events("InspectionFailed"), 1);

        let complete = h.inspections.complete_inspection(inspection.id).unwrap_err();
        assert_eq!(complete.kind(), ErrorKind::InvalidState);

        // A failed inspection frees the parcel for a new one
        h.inspections
            .create_inspection(parcel.id, InspectionType::Manual, None)
            .unwrap();
        assert_eq!(
            h.inspections
                .list_inspections_for_parcel(parcel.id)
                .unwrap()
                .len(),
            2
        );
    }
}
