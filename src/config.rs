//! Runner configuration.
//!
//! Loaded from JSON by hosts, e.g.
//! `{"cast": "reject", "boundary": {"constant": 0.0}, "stack_mode": "current_slice"}`.
//! Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::cast::CastPolicy;
use crate::error::{FilterError, FilterResult};
use crate::ndimage::BoundaryMode;

/// Which slices of a stack a slice-only filter processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackMode {
    #[default]
    AllSlices,
    /// Only [`crate::Image::current_slice`].
    CurrentSlice,
}

/// Settings shared by every invocation of a [`crate::FilterRunner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Storage cast for filters with wide intermediate arithmetic.
    pub cast: CastPolicy,
    /// Boundary extension used by every library call.
    pub boundary: BoundaryMode,
    /// Gaussian kernel truncation, in standard deviations.
    pub truncate: f64,
    pub stack_mode: StackMode,
    /// Filter independent slices of a stack on the rayon pool.
    pub parallel_slices: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            cast: CastPolicy::Saturate,
            boundary: BoundaryMode::Reflect,
            truncate: 4.0,
            stack_mode: StackMode::AllSlices,
            parallel_slices: true,
        }
    }
}

impl RunnerConfig {
    pub fn from_json(json: &str) -> FilterResult<Self> {
        let config: RunnerConfig =
            serde_json::from_str(json).map_err(|e| FilterError::invalid("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FilterResult<()> {
        if !(self.truncate.is_finite() && self.truncate > 0.0) {
            return Err(FilterError::invalid(
                "truncate",
                format!("must be a positive number, got {}", self.truncate),
            ));
        }
        if let BoundaryMode::Constant(v) = self.boundary {
            if !v.is_finite() {
                return Err(FilterError::invalid("boundary", "constant must be finite"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RunnerConfig::from_json(r#"{"cast": "wrap"}"#).unwrap();
        assert_eq!(config.cast, CastPolicy::Wrap);
        assert_eq!(config.boundary, BoundaryMode::Reflect);
        assert_eq!(config.truncate, 4.0);
        assert!(config.parallel_slices);
    }

    #[test]
    fn test_full_json() {
        let config = RunnerConfig::from_json(
            r#"{"cast": "reject", "boundary": {"constant": 2.0}, "truncate": 3.0,
                "stack_mode": "current_slice", "parallel_slices": false}"#,
        )
        .unwrap();
        assert_eq!(config.cast, CastPolicy::Reject);
        assert_eq!(config.boundary, BoundaryMode::Constant(2.0));
        assert_eq!(config.stack_mode, StackMode::CurrentSlice);
        assert!(!config.parallel_slices);
    }

    #[test]
    fn test_invalid_truncate() {
        assert!(RunnerConfig::from_json(r#"{"truncate": 0.0}"#).is_err());
        assert!(RunnerConfig::from_json(r#"{"cast": "clip"}"#).is_err());
    }
}
