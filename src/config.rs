// THEORY:
// `TrackerConfig` gathers every tunable of the tracking core in one place so a
// deployment can be adjusted without touching code. It deserializes from JSON
// with every field optional; anything missing falls back to the defaults that
// were tuned for a 320x240 motion-tracking camera.
//
// Validation is explicit (`validate`) and runs on every load, so a pipeline is
// never built from a config with, say, a negative missing time.

use crate::core_modules::mask::RowOrder;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default label capacity: a quarter of a 320x240 frame.
pub const DEFAULT_MAX_LABEL_CAPACITY: u32 = 320 * 240 / 4;

/// Configuration for the labeler, correlator and lifecycle manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Hard cap on provisional labels per frame.
    pub max_label_capacity: u32,
    /// Smallest region, in pixels, allowed into the tracked pool.
    pub min_blob_pixel_count: usize,
    /// Largest region, in pixels, allowed into the tracked pool.
    pub max_blob_pixel_count: usize,
    /// How long an object must exist before it is reported as accepted.
    pub age_of_acceptance_seconds: f64,
    /// How long an object may go unmatched before it is dropped.
    pub max_missing_time_seconds: f64,
    /// Weight of the predicted-position error in the correlator's score.
    pub position_weight: f64,
    /// Weight of the width/height difference in the correlator's score.
    pub size_weight: f64,
    /// Pairs scoring below this are never matched. `None` accepts any pair.
    pub min_correlation_confidence: Option<f64>,
    /// Row order of incoming masks.
    pub row_order: RowOrder,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_label_capacity: DEFAULT_MAX_LABEL_CAPACITY,
            min_blob_pixel_count: 16,
            max_blob_pixel_count: usize::MAX,
            age_of_acceptance_seconds: 0.333,
            max_missing_time_seconds: 1.0,
            position_weight: 1.0,
            size_weight: 1.0,
            min_correlation_confidence: None,
            row_order: RowOrder::TopDown,
        }
    }
}

impl TrackerConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The confidence floor as a plain number, `-inf` when unset.
    pub fn min_confidence(&self) -> f64 {
        self.min_correlation_confidence.unwrap_or(f64::NEG_INFINITY)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_label_capacity == 0 {
            return Err(invalid("max_label_capacity", "must be at least 1"));
        }
        if self.min_blob_pixel_count > self.max_blob_pixel_count {
            return Err(invalid(
                "min_blob_pixel_count",
                format!(
                    "{} exceeds max_blob_pixel_count {}",
                    self.min_blob_pixel_count, self.max_blob_pixel_count
                ),
            ));
        }
        non_negative("age_of_acceptance_seconds", self.age_of_acceptance_seconds)?;
        non_negative("max_missing_time_seconds", self.max_missing_time_seconds)?;
        non_negative("position_weight", self.position_weight)?;
        non_negative("size_weight", self.size_weight)?;
        if let Some(floor) = self.min_correlation_confidence {
            if floor.is_nan() {
                return Err(invalid("min_correlation_confidence", "must be a number"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("{value} is not a finite, non-negative number"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_label_capacity, 19200);
        assert_eq!(config.min_confidence(), f64::NEG_INFINITY);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = TrackerConfig::from_json_str(
            r#"{ "max_missing_time_seconds": 2.5, "row_order": "bottom_up" }"#,
        )
        .unwrap();
        assert_eq!(config.max_missing_time_seconds, 2.5);
        assert_eq!(config.row_order, RowOrder::BottomUp);
        assert_eq!(config.min_blob_pixel_count, 16);
    }

    #[test]
    fn confidence_floor_round_trips_through_json() {
        let config = TrackerConfig::from_json_str(r#"{ "min_correlation_confidence": -40.0 }"#)
            .unwrap();
        assert_eq!(config.min_confidence(), -40.0);
    }

    #[test]
    fn rejects_inverted_size_range() {
        let config = TrackerConfig {
            min_blob_pixel_count: 100,
            max_blob_pixel_count: 10,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "min_blob_pixel_count",
                ..
            })
        ));
    }

    #[test]
    fn rejects_negative_times() {
        let err = TrackerConfig::from_json_str(r#"{ "age_of_acceptance_seconds": -1.0 }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "age_of_acceptance_seconds",
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            TrackerConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
