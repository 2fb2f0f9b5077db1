// THEORY:
// A `Mask` is the single input of the tracking core: one byte per pixel, where
// 0 is background and any other value is foreground. It is produced upstream
// (thresholding, background difference, dilation) and is read-only here.
//
// The borrowed `Mask` is what the labeler consumes, so a caller can hand in a
// frame buffer it already owns without copying. `OwnedMask` exists for the
// cases where the tracker itself produces the buffer (image loading, tests).
//
// Dimension validation happens exactly once, at construction. Every consumer
// downstream may index `width * height` bytes without re-checking.

use crate::error::LabelError;
use serde::{Deserialize, Serialize};

/// Row order of the producer's buffer.
///
/// Bounding boxes are always reported with a top-left origin. Masks stored
/// bottom-up (row 0 is the bottom of the image) are flipped on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    #[default]
    TopDown,
    BottomUp,
}

/// A validated, borrowed view over a binary mask.
#[derive(Debug, Clone, Copy)]
pub struct Mask<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> Mask<'a> {
    /// Wraps `data` as a `width` x `height` mask.
    /// Fails if the buffer length is not exactly `width * height`.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self, LabelError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(LabelError::DimensionMismatch {
                width,
                height,
                expected,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.data[y as usize * self.width as usize + x as usize] != 0
    }

    /// Number of foreground pixels anywhere in the mask, borders included.
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&p| p != 0).count()
    }
}

/// An owned mask buffer. Useful when the mask is built or decoded locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedMask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl OwnedMask {
    /// An all-background mask.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn from_vec(data: Vec<u8>, width: u32, height: u32) -> Result<Self, LabelError> {
        Mask::new(&data, width, height)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn as_mask(&self) -> Mask<'_> {
        Mask {
            data: &self.data,
            width: self.width,
            height: self.height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Marks a single pixel as foreground (255) or background (0).
    /// Out-of-bounds coordinates are ignored.
    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        if x < self.width && y < self.height {
            self.data[y as usize * self.width as usize + x as usize] =
                if foreground { 255 } else { 0 };
        }
    }

    /// Fills the rectangle with top-left corner (`x`, `y`) and the given size,
    /// clipped to the mask.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for row in y..y_end {
            for col in x..x_end {
                self.set(col, row, true);
            }
        }
    }
}
