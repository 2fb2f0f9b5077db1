// THEORY:
// The correlator adds "object permanence" to the vision system. It takes the
// stateless list of `DetectedBlob`s from a single frame and associates each of
// them with an object that was already being tracked, or declares it new.
//
// This module solves the data association problem with a greedy weighted
// assignment:
// 1.  **Scoring**: Every (detection, tracked) pair gets a confidence score,
//     the negated weighted sum of (a) the distance between the detection's
//     center and the tracked object's velocity-predicted center and (b) the
//     difference in width and height. Higher is better, 0 is a perfect match.
// 2.  **Greedy Assignment**: The globally best unused pair is committed first,
//     then the next best among the remaining rows and columns, until one side
//     runs out or the best remaining score falls below the confidence floor.
//     This is not an optimal bipartite matching, it is a cheap heuristic that
//     behaves well when objects are sparse.
// 3.  **State Updating**: Matched objects absorb the detection's geometry and
//     get a fresh velocity estimate. Unmatched objects accumulate missing time.
//     Unmatched detections are born as new objects with fresh identities.
//
// The correlator never mutates the previous list. Each cycle builds a new
// `Vec<TrackedBlob>`, so a published snapshot of the previous cycle stays
// valid for readers while the next one is being computed.
//
// Time is always supplied by the caller in monotonic seconds. Velocities are
// in pixels per second, and missing time grows by the real gap between cycles,
// so a dropped frame does not distort either.

use crate::config::TrackerConfig;
use crate::core_modules::detected_blob::{BoundingBox, DetectedBlob};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// An object tracked across frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedBlob {
    /// Stable identity, unique for the lifetime of the correlator. Never reused.
    pub id: u64,
    /// Bounding box of the detection this object last absorbed.
    pub bounds: BoundingBox,
    /// Pixel count of the detection this object last absorbed.
    pub pixel_count: usize,
    /// Per-frame label of the detection this object last absorbed.
    pub frame_label: u32,
    /// Center displacement rate in pixels per second.
    pub velocity: (f64, f64),
    /// Timestamp of the cycle in which this object was born.
    pub created_at: f64,
    /// Timestamp of the last cycle in which this object was matched.
    pub last_updated: f64,
    /// Time accumulated since the last match. 0.0 while actively matched.
    pub missing_duration: f64,
    /// Whether the object has already been reported as accepted.
    pub accepted: bool,
}

impl TrackedBlob {
    /// Creates a newly born object from an unmatched detection.
    pub fn born(id: u64, detection: &DetectedBlob, now: f64) -> Self {
        Self {
            id,
            bounds: detection.bounds,
            pixel_count: detection.pixel_count,
            frame_label: detection.label,
            velocity: (0.0, 0.0),
            created_at: now,
            last_updated: now,
            missing_duration: 0.0,
            accepted: false,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        self.bounds.center()
    }

    /// Time since birth.
    pub fn age(&self, now: f64) -> f64 {
        now - self.created_at
    }

    pub fn is_missing(&self) -> bool {
        self.missing_duration > 0.0
    }

    /// Where the center is expected to be at `now`, extrapolated from the last
    /// match along the current velocity.
    pub fn predicted_center(&self, now: f64) -> (f64, f64) {
        let dt = (now - self.last_updated).max(0.0);
        let (cx, cy) = self.center();
        (cx + self.velocity.0 * dt, cy + self.velocity.1 * dt)
    }

    /// A copy of this object updated with a matching detection.
    fn absorb(&self, detection: &DetectedBlob, now: f64) -> Self {
        let dt = now - self.last_updated;
        let (old_x, old_y) = self.center();
        let (new_x, new_y) = detection.center();
        let velocity = if dt > 0.0 {
            ((new_x - old_x) / dt, (new_y - old_y) / dt)
        } else {
            (0.0, 0.0)
        };

        Self {
            bounds: detection.bounds,
            pixel_count: detection.pixel_count,
            frame_label: detection.label,
            velocity,
            last_updated: now,
            missing_duration: 0.0,
            ..self.clone()
        }
    }

    /// A copy of this object that went unmatched for `elapsed` seconds.
    fn missed(&self, elapsed: f64) -> Self {
        Self {
            missing_duration: self.missing_duration + elapsed,
            ..self.clone()
        }
    }
}

/// The outcome of one correlation cycle.
#[derive(Debug, Clone, Default)]
pub struct Correlation {
    /// Previously tracked objects first (in their previous order), then
    /// newly born objects in detection order.
    pub tracked: Vec<TrackedBlob>,
    /// Number of detections matched to an existing object.
    pub matched: usize,
    /// Number of objects born this cycle.
    pub born: usize,
}

/// Associates one frame's detections with the previously tracked objects.
pub trait BlobCorrelator: Send {
    fn correlate(
        &mut self,
        detections: &[DetectedBlob],
        previous: &[TrackedBlob],
        now: f64,
    ) -> Correlation;
}

/// Greedy weighted-distance correlator.
#[derive(Debug, Clone)]
pub struct WeightedCorrelator {
    /// Weight applied to the predicted-position error.
    position_weight: f64,
    /// Weight applied to `|dw| + |dh|`.
    size_weight: f64,
    /// Pairs scoring below this are never matched.
    min_confidence: f64,
    /// Next identity to hand out.
    next_id: u64,
    /// Timestamp of the previous cycle, `None` before the first one.
    previous_timestamp: Option<f64>,
}

impl Default for WeightedCorrelator {
    fn default() -> Self {
        Self::new(1.0, 1.0, f64::NEG_INFINITY)
    }
}

impl WeightedCorrelator {
    pub fn new(position_weight: f64, size_weight: f64, min_confidence: f64) -> Self {
        Self {
            position_weight,
            size_weight,
            min_confidence,
            next_id: 1,
            previous_timestamp: None,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(
            config.position_weight,
            config.size_weight,
            config.min_confidence(),
        )
    }

    pub fn set_weights(&mut self, position_weight: f64, size_weight: f64) {
        self.position_weight = position_weight;
        self.size_weight = size_weight;
    }

    pub fn set_min_confidence(&mut self, min_confidence: f64) {
        self.min_confidence = min_confidence;
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// The identity the next born object will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Confidence that `detection` is `tracked` observed at `now`.
    pub fn confidence(&self, detection: &DetectedBlob, tracked: &TrackedBlob, now: f64) -> f64 {
        let (px, py) = tracked.predicted_center(now);
        let (cx, cy) = detection.center();
        let distance = (cx - px).hypot(cy - py);
        let dw = (detection.bounds.width as f64 - tracked.bounds.width as f64).abs();
        let dh = (detection.bounds.height as f64 - tracked.bounds.height as f64).abs();
        -(self.position_weight * distance + self.size_weight * (dw + dh))
    }
}

impl BlobCorrelator for WeightedCorrelator {
    fn correlate(
        &mut self,
        detections: &[DetectedBlob],
        previous: &[TrackedBlob],
        now: f64,
    ) -> Correlation {
        let elapsed = self
            .previous_timestamp
            .map_or(0.0, |prev| (now - prev).max(0.0));
        let rows = detections.len();
        let cols = previous.len();

        // --- 1. Scoring ---
        let mut confidence = Vec::with_capacity(rows * cols);
        for detection in detections {
            for tracked in previous {
                confidence.push(self.confidence(detection, tracked, now));
            }
        }

        // --- 2. Greedy Assignment ---
        let mut detection_match: Vec<Option<usize>> = vec![None; rows];
        let mut tracked_match: Vec<Option<usize>> = vec![None; cols];
        let mut matched = 0;

        while matched < rows.min(cols) {
            let mut best: Option<(usize, usize, f64)> = None;
            for d in (0..rows).filter(|&d| detection_match[d].is_none()) {
                for t in (0..cols).filter(|&t| tracked_match[t].is_none()) {
                    let score = confidence[d * cols + t];
                    if best.is_none_or(|(_, _, top)| score > top) {
                        best = Some((d, t, score));
                    }
                }
            }

            let Some((d, t, score)) = best else { break };
            if score < self.min_confidence {
                trace!("best remaining pair scores {score:.3}, below floor; stopping");
                break;
            }
            trace!(
                "detection {} -> object {} (confidence {score:.3})",
                detections[d].label, previous[t].id
            );
            detection_match[d] = Some(t);
            tracked_match[t] = Some(d);
            matched += 1;
        }

        // --- 3. State Updating ---
        let mut tracked: Vec<TrackedBlob> = previous
            .iter()
            .zip(&tracked_match)
            .map(|(blob, m)| match m {
                Some(d) => blob.absorb(&detections[*d], now),
                None => blob.missed(elapsed),
            })
            .collect();

        let mut born = 0;
        for (detection, m) in detections.iter().zip(&detection_match) {
            if m.is_none() {
                tracked.push(TrackedBlob::born(self.next_id, detection, now));
                self.next_id += 1;
                born += 1;
            }
        }

        debug!(
            "correlated {} detections against {} objects: {} matched, {} born, {} missing",
            rows,
            cols,
            matched,
            born,
            cols - matched
        );

        self.previous_timestamp = Some(now);
        Correlation {
            tracked,
            matched,
            born,
        }
    }
}
