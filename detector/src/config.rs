//! Detector configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::inference::{BackendKind, InputShape};
use crate::pipeline::{Axis, DEFAULT_WINDOW_SIZE, FEATURE_COUNT};
use crate::tracking::{Hand, HandJoint};

/// Tunables for one tap detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Confidence cutoff; a tap fires on scores strictly above it.
    pub detection_threshold: f32,
    /// Sequence length; must match the model's input.
    pub window_size: usize,
    /// Features per step. Only 3 (position, velocity, acceleration) is supported.
    pub num_features: usize,
    /// How long the indicator stays visible per tap (seconds).
    pub indicator_visible_duration_s: f64,
    /// Spatial axis fed to the model.
    pub axis: Axis,
    /// Preferred execution backend; falls back to cpu.
    pub backend: BackendKind,
    /// Clamp scores to [0, 1] before thresholding.
    pub clamp_confidence: bool,
    /// Hand whose joint is tracked.
    pub hand: Hand,
    /// Tracked joint.
    pub joint: HandJoint,
    /// Minimum tracking confidence for the hand to count as tracked.
    pub min_tracking_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 0.7,
            window_size: DEFAULT_WINDOW_SIZE,
            num_features: FEATURE_COUNT,
            indicator_visible_duration_s: 0.05,
            axis: Axis::Z,
            backend: BackendKind::Accelerated,
            clamp_confidence: false,
            hand: Hand::Right,
            joint: HandJoint::IndexTip,
            min_tracking_confidence: 0.5,
        }
    }
}

impl DetectorConfig {
    /// Check values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(ConfigError::Invalid(format!(
                "detection_threshold must be in [0, 1], got {}",
                self.detection_threshold
            )));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be > 0".to_string()));
        }
        if self.num_features != FEATURE_COUNT {
            return Err(ConfigError::Invalid(format!(
                "num_features must be {}, got {}",
                FEATURE_COUNT, self.num_features
            )));
        }
        if !(self.indicator_visible_duration_s > 0.0) || !self.indicator_visible_duration_s.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "indicator_visible_duration_s must be a positive number of seconds, got {}",
                self.indicator_visible_duration_s
            )));
        }
        if !(0.0..=1.0).contains(&self.min_tracking_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min_tracking_confidence must be in [0, 1], got {}",
                self.min_tracking_confidence
            )));
        }
        Ok(())
    }

    /// Model input shape implied by this config.
    pub fn input_shape(&self) -> InputShape {
        InputShape::new(self.window_size, self.num_features)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
