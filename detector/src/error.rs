//! Error taxonomy for the tap detector.
//!
//! Only model loading and configuration are fatal.  Per-tick conditions
//! (sensor gaps, clock anomalies, failed inference) are reported through
//! `TickOutcome` and never abort the loop.

use std::path::PathBuf;

/// Result type alias for the tap detector.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error surfaced to the host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Model load error: {0}")]
    ModelLoad(#[from] ModelLoadError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Fatal: the detector cannot start without a loaded model.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse model: {0}")]
    Parse(String),

    #[error("model input shape {actual:?} does not match expected {expected:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        actual: Vec<usize>,
    },

    #[error("{0} backend unavailable: {1}")]
    BackendUnavailable(&'static str, String),

    #[error("model execution not supported: {0}")]
    Unsupported(String),
}

/// Non-fatal: the current tick is dropped and the next proceeds normally.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("inference backend already released")]
    Disposed,

    #[error("input has {actual} values, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model produced an empty output tensor")]
    EmptyOutput,

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Configuration load or validation failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid value: {0}")]
    Invalid(String),
}
