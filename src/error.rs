// THEORY:
// Errors in the tracking core are always local to a single frame. Nothing in
// here is fatal: a bad mask fails its own frame, a bad config fails at load
// time, and the persistent tracked list is never touched by a failure.
//
// Capacity overflow is deliberately absent from this taxonomy. A frame with
// more regions than the labeler can hold still produces a (partial) result,
// so it is reported through `LabelOutcome::degraded` instead of an `Err`.

use thiserror::Error;

pub type Result<T, E = TrackingError> = std::result::Result<T, E>;

/// Failures raised while labeling a single mask.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// The mask buffer does not hold exactly `width * height` bytes.
    #[error("mask buffer holds {len} bytes but {width}x{height} requires {expected}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        len: usize,
    },
}

/// Failures raised while loading or validating a `TrackerConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error for the public pipeline API.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load mask image: {0}")]
    Image(#[from] image::ImageError),

    /// The background tracking task has stopped and can no longer take frames.
    #[error("tracking actor is no longer running")]
    ActorClosed,
}
