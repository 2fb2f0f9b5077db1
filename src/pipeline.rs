// THEORY:
// The `pipeline` module is the top-level API of the tracking core. It wires the
// layers together so a caller only hands in a mask and a timestamp per frame:
//
//   mask -> ComponentLabeler -> BlobFilter chain -> BlobManager -> FrameReport
//
// Failure policy: a frame whose buffer does not match its declared size is
// rejected before labeling, but the manager is still advanced with an empty
// detection list. Tracked objects therefore keep accumulating missing time
// exactly as if the camera had seen nothing, and the persistent list is never
// corrupted by a bad frame.

use crate::config::TrackerConfig;
use crate::core_modules::blob_detector::ComponentLabeler;
use crate::core_modules::blob_manager::{BlobManager, BlobSnapshot, UpdateSummary};
use crate::core_modules::filter::{BlobFilter, SizeFilter};
use crate::core_modules::mask::Mask;
use crate::error::{ConfigError, Result};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

// Re-export key data structures for the public API.
pub use crate::core_modules::correlator::TrackedBlob;
pub use crate::core_modules::detected_blob::{BoundingBox, DetectedBlob};
pub use crate::core_modules::events::{BlobEvent, BlobListener, ChannelListener, ListenerId};
pub use crate::core_modules::mask::{OwnedMask, RowOrder};

/// Converts `Instant` readings into monotonic seconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    origin: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.seconds_at(Instant::now())
    }

    /// Seconds between the clock's origin and `instant`, 0.0 if `instant` is earlier.
    pub fn seconds_at(&self, instant: Instant) -> f64 {
        instant.saturating_duration_since(self.origin).as_secs_f64()
    }
}

/// Everything that happened while processing one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// 1-based index of the frame within this pipeline.
    pub frame_number: u64,
    pub timestamp: f64,
    /// Provisional labels allocated by the scan.
    pub provisional_labels: u32,
    /// Regions found by the labeler.
    pub regions: usize,
    /// Regions left after filtering.
    pub detected: usize,
    pub matched: usize,
    pub born: usize,
    pub lost: Vec<TrackedBlob>,
    pub newly_accepted: Vec<TrackedBlob>,
    /// Label capacity ran out and part of the frame was not labeled.
    pub degraded: bool,
    /// The manager's state after this frame.
    pub snapshot: Arc<BlobSnapshot>,
}

impl FrameReport {
    pub fn accepted(&self) -> &[TrackedBlob] {
        &self.snapshot.accepted
    }

    pub fn tracked(&self) -> &[TrackedBlob] {
        &self.snapshot.tracked
    }
}

/// The main, top-level struct for the tracking engine.
pub struct TrackingPipeline {
    config: TrackerConfig,
    labeler: ComponentLabeler,
    filters: Vec<Box<dyn BlobFilter>>,
    manager: BlobManager,
    frames_seen: u64,
}

impl TrackingPipeline {
    /// Builds a pipeline with the size filter from `config` as its only filter.
    pub fn new(config: TrackerConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let size_filter = SizeFilter::new(config.min_blob_pixel_count, config.max_blob_pixel_count);
        Ok(Self {
            labeler: ComponentLabeler::new(config.max_label_capacity, config.row_order),
            filters: vec![Box::new(size_filter)],
            manager: BlobManager::new(&config),
            config,
            frames_seen: 0,
        })
    }

    /// Appends a filter after the existing ones.
    pub fn add_filter(&mut self, filter: Box<dyn BlobFilter>) {
        self.filters.push(filter);
    }

    /// Labels `mask`, filters the regions and advances the tracked list.
    pub fn process_frame(&mut self, mask: &Mask, timestamp: f64) -> FrameReport {
        self.frames_seen += 1;

        // Stage 1: Connected-component labeling
        let outcome = self.labeler.label(mask);
        if outcome.degraded {
            warn!(
                "frame {} degraded: more than {} labels needed",
                self.frames_seen,
                self.labeler.capacity()
            );
        }
        let regions = outcome.blobs.len();

        // Stage 2: Filtering
        let detections = self
            .filters
            .iter()
            .fold(outcome.blobs, |blobs, filter| filter.process(blobs));
        let detected = detections.len();

        // Stage 3: Correlation & lifecycle
        self.manager.set_frame_size(mask.width(), mask.height());
        let summary = self.manager.update(detections, timestamp);
        debug!(
            "frame {}: {} regions, {} kept, {} matched, {} born",
            self.frames_seen, regions, detected, summary.matched, summary.born
        );

        self.report(timestamp, outcome.provisional_labels, regions, detected, outcome.degraded, summary)
    }

    /// Validates a raw buffer and processes it. A malformed frame still
    /// advances missing time on every tracked object before the error is returned.
    pub fn process_buffer(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Result<FrameReport> {
        match Mask::new(data, width, height) {
            Ok(mask) => Ok(self.process_frame(&mask, timestamp)),
            Err(err) => {
                warn!("frame rejected: {err}");
                self.skip_frame(timestamp);
                Err(err.into())
            }
        }
    }

    /// Advances the tracked list as if an empty frame arrived at `timestamp`.
    pub fn skip_frame(&mut self, timestamp: f64) -> FrameReport {
        self.frames_seen += 1;
        let summary = self.manager.update(Vec::new(), timestamp);
        self.report(timestamp, 0, 0, 0, false, summary)
    }

    fn report(
        &self,
        timestamp: f64,
        provisional_labels: u32,
        regions: usize,
        detected: usize,
        degraded: bool,
        summary: UpdateSummary,
    ) -> FrameReport {
        FrameReport {
            frame_number: self.frames_seen,
            timestamp,
            provisional_labels,
            regions,
            detected,
            matched: summary.matched,
            born: summary.born,
            lost: summary.lost,
            newly_accepted: summary.newly_accepted,
            degraded,
            snapshot: self.manager.snapshot(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn labeler(&self) -> &ComponentLabeler {
        &self.labeler
    }

    pub fn manager(&self) -> &BlobManager {
        &self.manager
    }

    /// Mutable access for registering listeners and tuning thresholds.
    pub fn manager_mut(&mut self) -> &mut BlobManager {
        &mut self.manager
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::mask::OwnedMask;
    use crate::error::TrackingError;

    fn config() -> TrackerConfig {
        TrackerConfig {
            min_blob_pixel_count: 4,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn small_regions_are_filtered_before_tracking() {
        let mut pipeline = TrackingPipeline::new(config()).unwrap();
        let mut mask = OwnedMask::blank(20, 20);
        mask.fill_rect(2, 2, 1, 1);
        mask.fill_rect(10, 10, 3, 3);
        let report = pipeline.process_frame(&mask.as_mask(), 0.0);
        assert_eq!(report.regions, 2);
        assert_eq!(report.detected, 1);
        assert_eq!(report.tracked().len(), 1);
        assert_eq!(report.tracked()[0].pixel_count, 9);
        assert_eq!(report.snapshot.frame_size, (20, 20));
    }

    #[test]
    fn malformed_frame_still_ages_tracked_objects() {
        let mut pipeline = TrackingPipeline::new(config()).unwrap();
        let mut mask = OwnedMask::blank(20, 20);
        mask.fill_rect(5, 5, 4, 4);
        pipeline.process_frame(&mask.as_mask(), 0.0);

        let err = pipeline.process_buffer(&[0; 10], 20, 20, 0.25).unwrap_err();
        assert!(matches!(err, TrackingError::Label(_)));

        let tracked = pipeline.manager().tracked();
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].missing_duration, 0.25);
        assert_eq!(pipeline.frames_seen(), 2);
    }

    #[test]
    fn degraded_frames_are_reported() {
        let mut pipeline = TrackingPipeline::new(TrackerConfig {
            max_label_capacity: 1,
            min_blob_pixel_count: 1,
            ..TrackerConfig::default()
        })
        .unwrap();
        let mut mask = OwnedMask::blank(12, 6);
        mask.fill_rect(2, 2, 2, 2);
        mask.fill_rect(7, 2, 2, 2);
        let report = pipeline.process_frame(&mask.as_mask(), 0.0);
        assert!(report.degraded);
        assert_eq!(report.detected, 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = TrackingPipeline::new(TrackerConfig {
            max_label_capacity: 0,
            ..TrackerConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn extra_filters_run_after_the_size_filter() {
        struct FirstOnly;
        impl BlobFilter for FirstOnly {
            fn process(&self, mut blobs: Vec<DetectedBlob>) -> Vec<DetectedBlob> {
                blobs.truncate(1);
                blobs
            }
        }

        let mut pipeline = TrackingPipeline::new(config()).unwrap();
        pipeline.add_filter(Box::new(FirstOnly));
        let mut mask = OwnedMask::blank(30, 10);
        mask.fill_rect(2, 2, 1, 1);
        mask.fill_rect(5, 2, 3, 3);
        mask.fill_rect(15, 2, 3, 3);
        let report = pipeline.process_frame(&mask.as_mask(), 0.0);
        assert_eq!(report.detected, 1);
        assert_eq!(report.tracked()[0].bounds.x, 5);
    }

    #[test]
    fn frame_clock_is_monotonic() {
        let clock = FrameClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(a >= 0.0);
    }
}
