// THEORY:
// The `BlobManager` is the top-level orchestrator of the behavioral layer. It
// owns the persistent tracked list and turns raw per-frame detections into a
// stable, filtered, event-driven view of the scene.
//
// One call to `update` does, in order:
// 1.  **Correlation**: hand the detections and the previous tracked list to the
//     correlator, which returns a brand-new tracked list.
// 2.  **Eviction**: drop every object whose missing time exceeds the maximum,
//     reporting each one to listeners as lost.
// 3.  **Acceptance**: an object that has existed longer than the age of
//     acceptance is "confirmed". The first time an object crosses that line it
//     is reported to listeners as a new blob. This suppresses flicker from
//     single-frame noise.
// 4.  **Publication**: the whole result is frozen into an immutable
//     `BlobSnapshot` and published through a `watch` channel. Readers on other
//     threads either see the previous snapshot or the new one, never a list
//     that is half-way through an update.
// 5.  **Notification**: every listener hears `blobs_updated` exactly once.
//
// `update` takes `&mut self`, so the borrow checker already guarantees it is
// never run concurrently. Readers that live elsewhere use `subscribe`.

use crate::config::TrackerConfig;
use crate::core_modules::correlator::{BlobCorrelator, TrackedBlob, WeightedCorrelator};
use crate::core_modules::detected_blob::DetectedBlob;
use crate::core_modules::events::{BlobListener, ListenerId};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::watch;

/// An immutable view of the manager's state after one update.
#[derive(Debug, Clone, Default)]
pub struct BlobSnapshot {
    /// Timestamp of the update that produced this snapshot.
    pub timestamp: f64,
    /// Dimensions of the frame the detections came from.
    pub frame_size: (u32, u32),
    /// The detections fed into this update, after filtering.
    pub detected: Vec<DetectedBlob>,
    /// Every tracked object, accepted or not.
    pub tracked: Vec<TrackedBlob>,
    /// Tracked objects older than the age of acceptance.
    pub accepted: Vec<TrackedBlob>,
}

/// Counts describing what one update changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSummary {
    pub matched: usize,
    pub born: usize,
    pub lost: Vec<TrackedBlob>,
    pub newly_accepted: Vec<TrackedBlob>,
}

/// Owns the tracked list and drives object lifecycles.
pub struct BlobManager {
    correlator: Box<dyn BlobCorrelator>,
    /// The tracked list produced by the last update.
    tracked: Vec<TrackedBlob>,
    /// Seconds an object must exist before it is accepted.
    age_of_acceptance: f64,
    /// Seconds an object may stay unmatched before it is dropped.
    max_missing_time: f64,
    /// Dimensions of the most recent frame.
    frame_size: (u32, u32),
    listeners: Vec<(ListenerId, Arc<dyn BlobListener>)>,
    next_listener_id: u64,
    snapshot_tx: watch::Sender<Arc<BlobSnapshot>>,
}

impl Default for BlobManager {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}

impl BlobManager {
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_correlator(config, Box::new(WeightedCorrelator::from_config(config)))
    }

    /// Builds a manager around a custom correlation strategy.
    pub fn with_correlator(config: &TrackerConfig, correlator: Box<dyn BlobCorrelator>) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(BlobSnapshot::default()));
        Self {
            correlator,
            tracked: Vec::new(),
            age_of_acceptance: config.age_of_acceptance_seconds,
            max_missing_time: config.max_missing_time_seconds,
            frame_size: (0, 0),
            listeners: Vec::new(),
            next_listener_id: 0,
            snapshot_tx,
        }
    }

    /// Feeds one frame's detections through correlation, eviction and acceptance.
    pub fn update(&mut self, detections: Vec<DetectedBlob>, now: f64) -> UpdateSummary {
        // --- 1. Correlation ---
        let correlation = self.correlator.correlate(&detections, &self.tracked, now);

        // --- 2. Eviction ---
        let max_missing = self.max_missing_time;
        let (lost, mut tracked): (Vec<_>, Vec<_>) = correlation
            .tracked
            .into_iter()
            .partition(|blob| blob.missing_duration > max_missing);
        for blob in &lost {
            info!(
                "object {} lost after {:.3}s missing",
                blob.id, blob.missing_duration
            );
            for (_, listener) in &self.listeners {
                listener.blob_lost(blob);
            }
        }

        // --- 3. Acceptance ---
        let mut newly_accepted = Vec::new();
        for blob in tracked.iter_mut() {
            if !blob.accepted && blob.age(now) > self.age_of_acceptance {
                blob.accepted = true;
                info!("object {} accepted at {:?}", blob.id, blob.bounds);
                newly_accepted.push(blob.clone());
            }
        }
        for blob in &newly_accepted {
            for (_, listener) in &self.listeners {
                listener.new_blob_detected(blob);
            }
        }

        // --- 4. Publication ---
        let accepted = tracked.iter().filter(|b| b.accepted).cloned().collect();
        self.tracked = tracked;
        self.snapshot_tx.send_replace(Arc::new(BlobSnapshot {
            timestamp: now,
            frame_size: self.frame_size,
            detected: detections,
            tracked: self.tracked.clone(),
            accepted,
        }));

        // --- 5. Notification ---
        for (_, listener) in &self.listeners {
            listener.blobs_updated();
        }

        debug!(
            "update at {now:.3}s: {} tracked, {} lost, {} newly accepted",
            self.tracked.len(),
            lost.len(),
            newly_accepted.len()
        );

        UpdateSummary {
            matched: correlation.matched,
            born: correlation.born,
            lost,
            newly_accepted,
        }
    }

    pub fn add_listener(&mut self, listener: Arc<dyn BlobListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<BlobSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// A receiver that observes every future snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<BlobSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Every tracked object, accepted or not.
    pub fn tracked(&self) -> &[TrackedBlob] {
        &self.tracked
    }

    /// Tracked objects that have reached the age of acceptance.
    pub fn accepted(&self) -> Vec<TrackedBlob> {
        self.snapshot().accepted.clone()
    }

    /// The detections fed into the last update.
    pub fn detected(&self) -> Vec<DetectedBlob> {
        self.snapshot().detected.clone()
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    pub fn set_frame_size(&mut self, width: u32, height: u32) {
        self.frame_size = (width, height);
    }

    pub fn age_of_acceptance(&self) -> f64 {
        self.age_of_acceptance
    }

    pub fn set_age_of_acceptance(&mut self, seconds: f64) {
        self.age_of_acceptance = seconds;
    }

    pub fn max_missing_time(&self) -> f64 {
        self.max_missing_time
    }

    pub fn set_max_missing_time(&mut self, seconds: f64) {
        self.max_missing_time = seconds;
    }
}
