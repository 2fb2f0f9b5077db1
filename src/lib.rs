// THEORY:
// This file is the main entry point for the `blob_tracker` library crate.
// It exports the `TrackingPipeline` and its data structures (`TrackerConfig`,
// `FrameReport`, `TrackedBlob`, ...) as the high-level interface for tracking
// moving objects in a stream of binary foreground masks.
//
// The layers underneath live in `core_modules`, leaves first:
// - `mask` / `equivalence` / `blob_detector`: per-frame connected-component
//   labeling into `DetectedBlob`s.
// - `filter`: per-frame pruning before anything gets an identity.
// - `correlator`: cross-frame association into persistent `TrackedBlob`s.
// - `blob_manager` / `events`: lifecycle (acceptance, eviction), snapshots and
//   listener notification.
//
// `async_pipeline` wraps the synchronous pipeline in a tokio-friendly actor.

pub mod async_pipeline;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::TrackerConfig;
pub use core_modules::blob_manager::{BlobManager, BlobSnapshot};
pub use core_modules::mask::Mask;
pub use error::{Result, TrackingError};
pub use pipeline::{FrameClock, FrameReport, TrackingPipeline};
