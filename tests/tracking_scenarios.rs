use blob_tracker::core_modules::blob_detector::ComponentLabeler;
use blob_tracker::core_modules::correlator::{BlobCorrelator, WeightedCorrelator};
use blob_tracker::pipeline::{BlobEvent, BoundingBox, ChannelListener, OwnedMask, RowOrder};
use blob_tracker::{TrackerConfig, TrackingPipeline};
use std::sync::Arc;

fn config() -> TrackerConfig {
    TrackerConfig {
        min_blob_pixel_count: 1,
        ..TrackerConfig::default()
    }
}

fn square_at(x: u32, y: u32) -> OwnedMask {
    let mut mask = OwnedMask::blank(80, 60);
    mask.fill_rect(x, y, 6, 6);
    mask
}

#[test]
fn blank_frames_never_produce_blobs() {
    let mut labeler = ComponentLabeler::new(64, RowOrder::TopDown);
    for (w, h) in [(1, 1), (2, 2), (3, 3), (64, 48)] {
        let outcome = labeler.label(&OwnedMask::blank(w, h).as_mask());
        assert_eq!(outcome.label_count(), 0);
        assert!(outcome.blobs.is_empty());
    }
}

#[test]
fn isolated_rectangles_are_reported_exactly() {
    let mut labeler = ComponentLabeler::new(64, RowOrder::TopDown);
    for (x, y, w, h) in [(1, 1, 1, 1), (5, 7, 10, 3), (20, 2, 3, 20)] {
        let mut mask = OwnedMask::blank(40, 30);
        mask.fill_rect(x, y, w, h);
        let outcome = labeler.label(&mask.as_mask());
        assert_eq!(outcome.blobs.len(), 1);
        assert_eq!(outcome.blobs[0].bounds, BoundingBox::new(x, y, w, h));
        assert_eq!(outcome.blobs[0].pixel_count, (w * h) as usize);
    }
}

#[test]
fn gaps_of_one_pixel_keep_regions_apart() {
    let mut labeler = ComponentLabeler::new(64, RowOrder::TopDown);

    let mut columns = OwnedMask::blank(20, 10);
    columns.fill_rect(2, 2, 3, 5);
    columns.fill_rect(6, 2, 3, 5);
    assert_eq!(labeler.label(&columns.as_mask()).label_count(), 2);

    let mut rows = OwnedMask::blank(20, 10);
    rows.fill_rect(2, 2, 8, 2);
    rows.fill_rect(2, 5, 8, 2);
    assert_eq!(labeler.label(&rows.as_mask()).label_count(), 2);
}

#[test]
fn every_scanned_neighbor_direction_merges() {
    let mut labeler = ComponentLabeler::new(64, RowOrder::TopDown);
    // Second pixel relative to a first pixel at (5, 5).
    for (dx, dy) in [(1i32, 0i32), (-1, 1), (0, 1), (1, 1)] {
        let mut mask = OwnedMask::blank(12, 12);
        mask.set(5, 5, true);
        mask.set((5 + dx) as u32, (5 + dy) as u32, true);
        let outcome = labeler.label(&mask.as_mask());
        assert_eq!(outcome.label_count(), 1, "offset ({dx}, {dy})");
        assert_eq!(outcome.blobs[0].pixel_count, 2);
    }
}

#[test]
fn staircase_with_many_merges_is_one_region() {
    // Alternating teeth joined by a bottom bar force several equivalences.
    let mut mask = OwnedMask::blank(40, 12);
    for tooth in 0..8 {
        mask.fill_rect(2 + tooth * 4, 2, 2, 6);
    }
    mask.fill_rect(2, 8, 32, 1);
    let mut labeler = ComponentLabeler::new(64, RowOrder::TopDown);
    let outcome = labeler.label(&mask.as_mask());
    assert_eq!(outcome.provisional_labels, 8);
    assert_eq!(outcome.label_count(), 1);
    assert_eq!(outcome.blobs[0].pixel_count, 8 * 12 + 32);
}

#[test]
fn repeated_detection_keeps_identity_and_zero_velocity() {
    let mut correlator = WeightedCorrelator::default();
    let mut labeler = ComponentLabeler::new(64, RowOrder::TopDown);
    let detections = labeler.label(&square_at(10, 10).as_mask()).blobs;

    let first = correlator.correlate(&detections, &[], 3.0);
    let second = correlator.correlate(&detections, &first.tracked, 3.0);
    assert_eq!(second.tracked.len(), 1);
    assert_eq!(second.tracked[0].id, first.tracked[0].id);
    assert_eq!(second.tracked[0].velocity, (0.0, 0.0));
}

#[test]
fn moving_object_keeps_its_identity() {
    let mut pipeline = TrackingPipeline::new(config()).unwrap();
    let mut ids = Vec::new();
    for step in 0..10 {
        let report = pipeline.process_frame(&square_at(5 + step * 3, 20).as_mask(), step as f64 * 0.1);
        assert_eq!(report.tracked().len(), 1);
        ids.push(report.tracked()[0].id);
    }
    assert!(ids.iter().all(|&id| id == ids[0]));

    let blob = &pipeline.manager().tracked()[0];
    assert!((blob.velocity.0 - 30.0).abs() < 1e-6);
    assert!(blob.velocity.1.abs() < 1e-6);
}

#[test]
fn lost_objects_disappear_with_one_event() {
    let mut pipeline = TrackingPipeline::new(config()).unwrap();
    let (listener, mut events) = ChannelListener::new();
    pipeline.manager_mut().add_listener(Arc::new(listener));

    pipeline.process_frame(&square_at(10, 10).as_mask(), 0.0);
    let blank = OwnedMask::blank(80, 60);
    let mut lost_at = None;
    for step in 1..=8 {
        let t = step as f64 * 0.25;
        let report = pipeline.process_frame(&blank.as_mask(), t);
        if !report.lost.is_empty() {
            assert!(lost_at.is_none());
            lost_at = Some(t);
            assert!(report.tracked().is_empty());
        }
    }
    // Missing time first exceeds 1.0s at t = 1.25.
    assert_eq!(lost_at, Some(1.25));

    let mut lost_events = 0;
    let mut updates = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            BlobEvent::BlobLost(blob) => {
                assert_eq!(blob.id, 1);
                lost_events += 1;
            }
            BlobEvent::BlobsUpdated => updates += 1,
            BlobEvent::NewBlobDetected(_) => {}
        }
    }
    assert_eq!(lost_events, 1);
    assert_eq!(updates, 9);
}

#[test]
fn new_objects_wait_for_acceptance() {
    let mut pipeline = TrackingPipeline::new(config()).unwrap();
    let (listener, mut events) = ChannelListener::new();
    pipeline.manager_mut().add_listener(Arc::new(listener));

    let report = pipeline.process_frame(&square_at(10, 10).as_mask(), 0.0);
    assert_eq!(report.tracked().len(), 1);
    assert!(report.accepted().is_empty());

    let report = pipeline.process_frame(&square_at(11, 10).as_mask(), 0.3);
    assert!(report.accepted().is_empty());

    let report = pipeline.process_frame(&square_at(12, 10).as_mask(), 0.4);
    assert_eq!(report.accepted().len(), 1);
    assert_eq!(report.newly_accepted.len(), 1);

    let report = pipeline.process_frame(&square_at(13, 10).as_mask(), 0.5);
    assert!(report.newly_accepted.is_empty());

    let announced = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|e| matches!(e, BlobEvent::NewBlobDetected(_)))
        .count();
    assert_eq!(announced, 1);
}

#[test]
fn identical_runs_produce_identical_tracks() {
    let frames: Vec<OwnedMask> = (0..6)
        .map(|step| {
            let mut mask = OwnedMask::blank(80, 60);
            mask.fill_rect(5 + step * 4, 10, 6, 6);
            mask.fill_rect(60 - step * 4, 12, 6, 6);
            if step % 2 == 0 {
                mask.fill_rect(30, 45, 3, 3);
            }
            mask
        })
        .collect();

    let run = || {
        let mut pipeline = TrackingPipeline::new(config()).unwrap();
        frames
            .iter()
            .enumerate()
            .map(|(i, mask)| pipeline.process_frame(&mask.as_mask(), i as f64 / 15.0).tracked().to_vec())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn frame_size_changes_are_handled() {
    let mut pipeline = TrackingPipeline::new(config()).unwrap();
    pipeline.process_frame(&square_at(10, 10).as_mask(), 0.0);

    let mut larger = OwnedMask::blank(160, 120);
    larger.fill_rect(11, 10, 6, 6);
    let report = pipeline.process_frame(&larger.as_mask(), 0.1);
    assert_eq!(report.snapshot.frame_size, (160, 120));
    assert_eq!(report.matched, 1);
    assert_eq!(pipeline.labeler().label_image_size(), (160, 120));
}
