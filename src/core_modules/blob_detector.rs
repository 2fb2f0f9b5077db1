// THEORY:
// The `ComponentLabeler` is the engine of the spatial grouping layer. It turns a
// binary mask into a list of connected regions ("blobs") with a single raster
// scan plus one lightweight resolve pass, instead of a flood fill per region.
//
// Algorithm steps:
// 1.  **Provisional Labeling**: Pixels are scanned in row-major order. Each
//     foreground pixel looks at the four neighbors that were already visited
//     (left, upper-left, upper, upper-right). If any carry a label, the pixel
//     takes the lowest one and every other neighbor label is recorded as
//     equivalent in the `EquivalenceTable`. Otherwise it gets a fresh label.
// 2.  **Compression**: After the scan, every provisional label is pointed
//     straight at its root. Labels only ever map downward, so a single
//     descending pass is enough.
// 3.  **Renumbering**: Roots are renumbered to a dense `1..=n` range so every
//     frame's labels are contiguous.
// 4.  **Resolve & Aggregate**: A second pass rewrites every pixel to its
//     canonical label while accumulating bounding boxes and pixel counts.
//
// Documented simplifications:
// - The first row and the first and last column are never labeled. The scan
//   needs an upper row and both horizontal neighbors, and skipping the border
//   avoids bounds checks in the hot loop. Regions touching the border lose
//   those pixels.
// - Label capacity is fixed. When a frame needs more labels than the table
//   holds, scanning stops and the outcome is flagged `degraded`. The blobs
//   found up to that point are still returned.
//
// The labeler owns its scratch buffers (label image and equivalence table) and
// reuses them across frames. They are only reallocated when the frame size
// changes.

use crate::core_modules::detected_blob::{BoundingBox, DetectedBlob};
use crate::core_modules::equivalence::{EquivalenceTable, Label};
use crate::core_modules::mask::{Mask, RowOrder};
use crate::error::LabelError;
use log::{debug, warn};

/// The result of labeling one frame.
#[derive(Debug, Clone, Default)]
pub struct LabelOutcome {
    /// One entry per canonical label, `blobs[i].label == i + 1`.
    pub blobs: Vec<DetectedBlob>,
    /// Number of provisional labels allocated during the scan.
    pub provisional_labels: u32,
    /// Set when label capacity ran out and the rest of the frame was skipped.
    pub degraded: bool,
}

impl LabelOutcome {
    /// Number of canonical labels, i.e. distinct regions found.
    pub fn label_count(&self) -> u32 {
        self.blobs.len() as u32
    }
}

/// Running min/max and pixel count of one canonical label.
#[derive(Debug, Clone, Copy)]
struct Extent {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixel_count: usize,
}

impl Extent {
    const EMPTY: Extent = Extent {
        min_x: u32::MAX,
        min_y: u32::MAX,
        max_x: 0,
        max_y: 0,
        pixel_count: 0,
    };

    #[inline]
    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }
}

/// Single-pass connected-component labeler with reusable scratch buffers.
pub struct ComponentLabeler {
    /// Provisional-to-canonical label mapping, sized for `capacity` labels.
    table: EquivalenceTable,
    /// Label of every pixel of the last frame, 0 for background.
    labels: Vec<Label>,
    /// Dimensions of the last frame labeled.
    width: u32,
    height: u32,
    /// Row order of incoming masks, used to flip output boxes.
    row_order: RowOrder,
    /// Number of frames labeled so far.
    frames_processed: u64,
}

impl ComponentLabeler {
    /// Creates a labeler able to distinguish up to `capacity` provisional
    /// labels per frame.
    pub fn new(capacity: u32, row_order: RowOrder) -> Self {
        Self {
            table: EquivalenceTable::with_capacity(capacity),
            labels: Vec::new(),
            width: 0,
            height: 0,
            row_order,
            frames_processed: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.table.capacity()
    }

    pub fn row_order(&self) -> RowOrder {
        self.row_order
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// The resolved label image of the last frame, row-major, in the
    /// producer's row order. Every foreground pixel carries its canonical label.
    pub fn label_image(&self) -> &[Label] {
        &self.labels
    }

    /// Dimensions of `label_image`.
    pub fn label_image_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Convenience wrapper that validates a raw buffer before labeling it.
    pub fn label_buffer(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<LabelOutcome, LabelError> {
        let mask = Mask::new(data, width, height)?;
        Ok(self.label(&mask))
    }

    /// Labels every connected foreground region of `mask`.
    pub fn label(&mut self, mask: &Mask) -> LabelOutcome {
        // --- 0. Frame Setup ---
        self.prepare(mask.width(), mask.height());

        // --- 1. Provisional Labeling ---
        let degraded = self.scan(mask);
        let provisional_labels = self.table.used();
        if degraded {
            warn!(
                "frame {}: label capacity {} exhausted, remainder of frame skipped",
                self.frames_processed,
                self.table.capacity()
            );
        }
        if provisional_labels == 0 {
            debug!("frame {}: no foreground regions", self.frames_processed);
            return LabelOutcome {
                blobs: Vec::new(),
                provisional_labels,
                degraded,
            };
        }

        // --- 2. Compression & 3. Renumbering ---
        self.table.compress();
        let label_count = self.table.make_contiguous();

        // --- 4. Resolve & Aggregate ---
        let blobs = self.resolve(label_count);
        debug!(
            "frame {}: {} provisional labels resolved to {} regions",
            self.frames_processed, provisional_labels, label_count
        );

        LabelOutcome {
            blobs,
            provisional_labels,
            degraded,
        }
    }

    /// Resets scratch state and resizes the label image when the frame size changes.
    fn prepare(&mut self, width: u32, height: u32) {
        self.frames_processed += 1;
        self.table.reset();

        let size = width as usize * height as usize;
        if (width, height) != (self.width, self.height) {
            debug!(
                "label image resized from {}x{} to {}x{}",
                self.width, self.height, width, height
            );
            self.width = width;
            self.height = height;
            self.labels.clear();
            self.labels.resize(size, 0);
        } else {
            self.labels.fill(0);
        }
    }

    /// Assigns provisional labels. Returns `true` if capacity ran out.
    fn scan(&mut self, mask: &Mask) -> bool {
        let width = mask.width() as usize;
        let height = mask.height() as usize;
        if width < 3 || height < 2 {
            return false;
        }
        let data = mask.data();

        for y in 1..height {
            let row = y * width;
            for x in 1..width - 1 {
                let i = row + x;
                if data[i] == 0 {
                    continue;
                }

                let neighbors = [
                    self.labels[i - 1],
                    self.labels[i - width - 1],
                    self.labels[i - width],
                    self.labels[i - width + 1],
                ];
                let lowest = neighbors.iter().copied().filter(|&l| l != 0).min();

                match lowest {
                    Some(lowest) => {
                        self.labels[i] = lowest;
                        for neighbor in neighbors {
                            if neighbor > lowest {
                                self.table.union(lowest, neighbor);
                            }
                        }
                    }
                    None => match self.table.allocate() {
                        Some(label) => self.labels[i] = label,
                        None => return true,
                    },
                }
            }
        }
        false
    }

    /// Rewrites the label image to canonical labels and builds the blob list.
    fn resolve(&mut self, label_count: u32) -> Vec<DetectedBlob> {
        let width = self.width as usize;
        let mut extents = vec![Extent::EMPTY; label_count as usize];

        for (i, label) in self.labels.iter_mut().enumerate() {
            if *label == 0 {
                continue;
            }
            let canonical = self.table.resolve(*label);
            *label = canonical;
            extents[canonical as usize - 1].include((i % width) as u32, (i / width) as u32);
        }

        extents
            .into_iter()
            .enumerate()
            .map(|(index, extent)| {
                debug_assert!(extent.pixel_count > 0, "canonical label without pixels");
                let (min_y, max_y) = match self.row_order {
                    RowOrder::TopDown => (extent.min_y, extent.max_y),
                    RowOrder::BottomUp => (
                        self.height - 1 - extent.max_y,
                        self.height - 1 - extent.min_y,
                    ),
                };
                DetectedBlob::new(
                    index as u32 + 1,
                    BoundingBox::from_corners(extent.min_x, min_y, extent.max_x, max_y),
                    extent.pixel_count,
                )
            })
            .collect()
    }
}
