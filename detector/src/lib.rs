//! Fingertip tap detection for XR hand tracking.
//!
//! Each tracking tick the index-tip position is differentiated into a
//! (position, velocity, acceleration) feature along one axis, pushed into a
//! fixed 100-step window, and scored by a sequence classifier.  Scores above
//! the threshold pulse an indicator for a fixed duration.
//!
//! ```text
//! sensor ─▶ features ─▶ window ─▶ classifier ─▶ controller ─▶ indicator
//! ```
//!
//! - [`tracking`]: sensor interface and XR skeleton adapter
//! - [`pipeline`]: feature extraction and the sliding window
//! - [`inference`]: model runtime, backend selection, and lifecycle
//! - [`indicator`]: threshold, debounce, and auto-hide
//! - [`detector`]: the per-tick loop

pub mod config;
pub mod detector;
pub mod error;
pub mod indicator;
pub mod inference;
pub mod pipeline;
pub mod replay;
pub mod tracking;

pub use config::DetectorConfig;
pub use detector::{DetectorStats, TapDetector, TickOutcome};
pub use error::{ConfigError, Error, InferenceError, ModelLoadError, Result};
pub use indicator::{Indicator, IndicatorAction, TapEventController};
pub use inference::{Backend, BackendKind, InferenceAdapter, InputShape, ModelRuntime, ModelSource, OnnxRuntime};
pub use pipeline::{Axis, FeatureVector, FeatureWindow, KinematicState, Sample};
pub use tracking::{FingertipSensor, SkeletonSensor};
