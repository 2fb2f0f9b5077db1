// THEORY:
// Filters sit between the labeler and the correlator. They take the raw list of
// regions from one frame and decide which of them are worth tracking at all.
// Noise specks and whole-frame lighting changes are dropped here, before they
// ever receive a persistent identity.
//
// A filter may drop, reorder or rewrite entries. Filters run in the order they
// were added to the pipeline, each seeing the previous one's output.

use crate::core_modules::detected_blob::DetectedBlob;

/// A processing stage over one frame's detections.
pub trait BlobFilter: Send {
    fn process(&self, blobs: Vec<DetectedBlob>) -> Vec<DetectedBlob>;
}

/// Keeps blobs whose pixel count lies within `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFilter {
    pub min_pixel_count: usize,
    pub max_pixel_count: usize,
}

impl SizeFilter {
    pub fn new(min_pixel_count: usize, max_pixel_count: usize) -> Self {
        Self {
            min_pixel_count,
            max_pixel_count,
        }
    }

    pub fn accepts(&self, blob: &DetectedBlob) -> bool {
        (self.min_pixel_count..=self.max_pixel_count).contains(&blob.pixel_count)
    }
}

impl BlobFilter for SizeFilter {
    fn process(&self, mut blobs: Vec<DetectedBlob>) -> Vec<DetectedBlob> {
        blobs.retain(|b| self.accepts(b));
        blobs
    }
}
