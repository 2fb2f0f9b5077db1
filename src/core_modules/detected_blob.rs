// THEORY:
// A `DetectedBlob` is one connected region of foreground pixels in a single
// frame. It is a "dumb" data container: it carries geometry and size, and
// knows nothing about earlier frames. Its `label` is only meaningful inside
// the frame that produced it.
//
// Persistent identity is added one layer up by the correlator, which wraps
// the geometry into a `TrackedBlob`.

use serde::{Deserialize, Serialize};

/// An axis-aligned pixel rectangle with a top-left origin.
/// `width` and `height` count pixels, so a single pixel is 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from inclusive corner coordinates.
    pub fn from_corners(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    /// Geometric center in pixel coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Inclusive right-most column.
    pub fn max_x(&self) -> u32 {
        self.x + self.width.saturating_sub(1)
    }

    /// Inclusive bottom-most row.
    pub fn max_y(&self) -> u32 {
        self.y + self.height.saturating_sub(1)
    }
}

/// A single connected region found in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedBlob {
    /// Canonical label within the frame, dense in `1..=n`. Not persistent.
    pub label: u32,
    /// Bounding box of every pixel carrying `label`.
    pub bounds: BoundingBox,
    /// Number of pixels carrying `label`.
    pub pixel_count: usize,
}

impl DetectedBlob {
    pub fn new(label: u32, bounds: BoundingBox, pixel_count: usize) -> Self {
        Self {
            label,
            bounds,
            pixel_count,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        self.bounds.center()
    }
}
