//! Feature pipeline: kinematic extraction and the classifier input window.

pub mod features;
pub mod window;

pub use features::{extract, Axis, Extraction, FeatureVector, KinematicState, Sample, SkipReason, FEATURE_COUNT};
pub use window::{FeatureWindow, DEFAULT_WINDOW_SIZE};
