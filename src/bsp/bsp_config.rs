// src/bsp/bsp_config.rs

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bsp::{BALANCE_WEIGHT, BSP_DEPTH_LIMIT, EPSILON, MAX_SEGS, MIN_SEG_LENGTH, SPLIT_WEIGHT};
use crate::error::ConfigError;

/// Tunable weights and safety limits for one BSP build.
///
/// Missing fields in a JSON config fall back to the defaults, so a file that
/// only says `{ "split_weight": 4.0 }` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Cost of each seg the partition line would split.
    pub split_weight: f64,
    /// Cost of each unit of front/back imbalance.
    pub balance_weight: f64,
    /// Distance from a line below which a point counts as on it.
    pub epsilon: f64,
    /// Shortest seg a split may produce.
    pub min_seg_length: f64,
    /// Deepest interior node chain allowed.
    pub max_depth: usize,
    /// Most segs (initial, split halves and minisegs) a build may create.
    pub max_segments: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            split_weight: SPLIT_WEIGHT,
            balance_weight: BALANCE_WEIGHT,
            epsilon: EPSILON,
            min_seg_length: MIN_SEG_LENGTH,
            max_depth: BSP_DEPTH_LIMIT,
            max_segments: MAX_SEGS,
        }
    }
}

impl BuildConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: BuildConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that every weight and tolerance is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.split_weight.is_finite() && self.split_weight >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "split_weight",
                message: format!("must be a finite, non-negative number (got {})", self.split_weight),
            });
        }
        if !(self.balance_weight.is_finite() && self.balance_weight >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "balance_weight",
                message: format!("must be a finite, non-negative number (got {})", self.balance_weight),
            });
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigError::Invalid {
                field: "epsilon",
                message: format!("must be a finite, positive number (got {})", self.epsilon),
            });
        }
        if !(self.min_seg_length.is_finite() && self.min_seg_length > 0.0) {
            return Err(ConfigError::Invalid {
                field: "min_seg_length",
                message: format!("must be a finite, positive number (got {})", self.min_seg_length),
            });
        }
        if self.min_seg_length > self.epsilon {
            return Err(ConfigError::Invalid {
                field: "min_seg_length",
                message: format!(
                    "must not exceed epsilon {} (got {})",
                    self.epsilon, self.min_seg_length
                ),
            });
        }
        if self.max_segments == 0 {
            return Err(ConfigError::Invalid {
                field: "max_segments",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
