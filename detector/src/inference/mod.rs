//! Classifier execution: model loading, backend selection, and the
//! per-tick inference call.
//!
//! Provides:
//! - `ModelRuntime`: loads a model into a `Backend` of the requested kind
//! - `Backend`: one loaded model on one execution strategy
//! - `InferenceAdapter`: owns the backend for the detector's lifetime,
//!   validates tensor shapes, and releases the backend exactly once
//! - `OnnxRuntime`: tract-based ONNX execution (gated behind `onnx` feature)

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::OnnxRuntime;

#[cfg(not(feature = "onnx"))]
pub mod stub;

#[cfg(not(feature = "onnx"))]
pub use stub::OnnxRuntime;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{InferenceError, ModelLoadError};
use crate::pipeline::{DEFAULT_WINDOW_SIZE, FEATURE_COUNT};

// ── Types ──────────────────────────────────────────────────

/// Execution strategy for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU or other accelerator, when the runtime provides one.
    #[default]
    Accelerated,
    /// General-purpose CPU execution; always the fallback.
    Cpu,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accelerated => "accelerated",
            Self::Cpu => "cpu",
        }
    }
}

/// Where the model comes from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Rank-3 input shape `(batch, steps, features)`; batch is always 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub steps: usize,
    pub features: usize,
}

impl InputShape {
    pub fn new(steps: usize, features: usize) -> Self {
        Self { steps, features }
    }

    pub fn dims(&self) -> [usize; 3] {
        [1, self.steps, self.features]
    }

    /// Flat element count.
    pub fn len(&self) -> usize {
        self.steps * self.features
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InputShape {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE, FEATURE_COUNT)
    }
}

// ── Capability traits ─────────────────────────────────────

/// A loaded model bound to one execution strategy.
pub trait Backend: Send {
    fn kind(&self) -> BackendKind;

    /// Input dimensions the model declares, if the runtime can tell.
    fn input_shape(&self) -> Option<Vec<usize>> {
        None
    }

    /// Run the model on a flat input of `shape.len()` floats and return the
    /// flattened single output tensor.  Blocks until the result is
    /// readable on the host.
    fn run(&mut self, input: &[f32], shape: InputShape) -> Result<Vec<f32>, InferenceError>;

    /// Free execution resources.  Called at most once, before drop.
    fn release(&mut self) {}
}

/// Loads models into backends.
pub trait ModelRuntime {
    /// Load `source` for `kind`.  Return `ModelLoadError::BackendUnavailable`
    /// when `kind` cannot run here so the caller can fall back.
    fn load(
        &self,
        source: &ModelSource,
        shape: InputShape,
        kind: BackendKind,
    ) -> Result<Box<dyn Backend>, ModelLoadError>;
}

// ── Adapter ───────────────────────────────────────────────

/// Sole owner of the classifier backend.
pub struct InferenceAdapter {
    backend: Option<Box<dyn Backend>>,
    shape: InputShape,
    kind: BackendKind,
    runs: u64,
}

impl InferenceAdapter {
    /// Load the model, preferring `preferred` and falling back to the CPU
    /// backend if the preferred one is unavailable.  Any other failure is
    /// returned as-is: without a model there is no detector.
    pub fn initialize(
        runtime: &dyn ModelRuntime,
        source: &ModelSource,
        shape: InputShape,
        preferred: BackendKind,
    ) -> Result<Self, ModelLoadError> {
        let mut backend = match runtime.load(source, shape, preferred) {
            Ok(backend) => backend,
            Err(ModelLoadError::BackendUnavailable(name, reason))
                if preferred != BackendKind::Cpu =>
            {
                warn!("{} backend unavailable ({}), falling back to cpu", name, reason);
                runtime.load(source, shape, BackendKind::Cpu)?
            }
            Err(e) => return Err(e),
        };

        if let Some(declared) = backend.input_shape() {
            if declared.as_slice() != shape.dims().as_slice() {
                backend.release();
                return Err(ModelLoadError::ShapeMismatch {
                    expected: shape.dims(),
                    actual: declared,
                });
            }
        }

        let kind = backend.kind();
        info!("Classifier loaded on {} backend, input {:?}", kind.as_str(), shape.dims());
        Ok(Self {
            backend: Some(backend),
            shape,
            kind,
            runs: 0,
        })
    }

    /// Run one window through the model and return its first output value.
    pub fn infer(&mut self, input: &[f32]) -> Result<f32, InferenceError> {
        let backend = self.backend.as_mut().ok_or(InferenceError::Disposed)?;
        if input.len() != self.shape.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.shape.len(),
                actual: input.len(),
            });
        }

        let output = backend.run(input, self.shape)?;
        self.runs += 1;
        output.first().copied().ok_or(InferenceError::EmptyOutput)
    }

    /// Free the backend.  Returns false if it was already released.
    pub fn release(&mut self) -> bool {
        match self.backend.take() {
            Some(mut backend) => {
                backend.release();
                info!("Classifier backend released after {} run(s)", self.runs);
                true
            }
            None => {
                debug!("Classifier backend already released");
                false
            }
        }
    }

    pub fn is_released(&self) -> bool {
        self.backend.is_none()
    }

    /// Backend actually in use (after any fallback).
    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    pub fn input_shape(&self) -> InputShape {
        self.shape
    }

    /// Successful backend runs so far.
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

impl Drop for InferenceAdapter {
    fn drop(&mut self) {
        if self.backend.is_some() {
            self.release();
        }
    }
}

impl std::fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("kind", &self.kind)
            .field("shape", &self.shape)
            .field("released", &self.is_released())
            .field("runs", &self.runs)
            .finish()
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedBackend {
        kind: BackendKind,
        output: Vec<f32>,
        declared: Option<Vec<usize>>,
        runs: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
    }

    impl Backend for FixedBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn input_shape(&self) -> Option<Vec<usize>> {
            self.declared.clone()
        }

        fn run(&mut self, _input: &[f32], _shape: InputShape) -> Result<Vec<f32>, InferenceError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FixedRuntime {
        output: Vec<f32>,
        accelerated: bool,
        cpu: bool,
        declared: Option<Vec<usize>>,
        loads: Arc<AtomicUsize>,
        runs: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
    }

    impl FixedRuntime {
        fn new(output: Vec<f32>) -> Self {
            Self {
                output,
                accelerated: true,
                cpu: true,
                ..Self::default()
            }
        }
    }

    impl ModelRuntime for FixedRuntime {
        fn load(
            &self,
            _source: &ModelSource,
            _shape: InputShape,
            kind: BackendKind,
        ) -> Result<Box<dyn Backend>, ModelLoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let available = match kind {
                BackendKind::Accelerated => self.accelerated,
                BackendKind::Cpu => self.cpu,
            };
            if !available {
                return Err(ModelLoadError::BackendUnavailable(kind.as_str(), "absent".into()));
            }
            Ok(Box::new(FixedBackend {
                kind,
                output: self.output.clone(),
                declared: self.declared.clone(),
                runs: self.runs.clone(),
                releases: self.releases.clone(),
            }))
        }
    }

    fn source() -> ModelSource {
        ModelSource::Bytes(Vec::new())
    }

    #[test]
    fn test_prefers_accelerated() {
        let runtime = FixedRuntime::new(vec![0.3]);
        let adapter = InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Accelerated)
            .unwrap();
        assert_eq!(adapter.backend_kind(), BackendKind::Accelerated);
        assert_eq!(runtime.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_falls_back_to_cpu() {
        let runtime = FixedRuntime {
            accelerated: false,
            ..FixedRuntime::new(vec![0.3])
        };
        let adapter = InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Accelerated)
            .unwrap();
        assert_eq!(adapter.backend_kind(), BackendKind::Cpu);
        assert_eq!(runtime.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_backend_is_fatal() {
        let runtime = FixedRuntime {
            accelerated: false,
            cpu: false,
            ..FixedRuntime::new(vec![0.3])
        };
        let err = InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Accelerated)
            .unwrap_err();
        assert!(matches!(err, ModelLoadError::BackendUnavailable("cpu", _)));
    }

    #[test]
    fn test_cpu_preference_does_not_retry() {
        let runtime = FixedRuntime {
            cpu: false,
            ..FixedRuntime::new(vec![0.3])
        };
        let result = InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Cpu);
        assert!(result.is_err());
        assert_eq!(runtime.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_declared_shape_mismatch_rejected() {
        let runtime = FixedRuntime {
            declared: Some(vec![1, 50, 3]),
            ..FixedRuntime::new(vec![0.3])
        };
        let err = InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Cpu)
            .unwrap_err();
        match err {
            ModelLoadError::ShapeMismatch { expected, actual } => {
                assert_eq!(expected, [1, 100, 3]);
                assert_eq!(actual, vec![1, 50, 3]);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(runtime.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_declared_shape_match_accepted() {
        let runtime = FixedRuntime {
            declared: Some(vec![1, 100, 3]),
            ..FixedRuntime::new(vec![0.3])
        };
        assert!(InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Cpu).is_ok());
    }

    #[test]
    fn test_infer_returns_first_value() {
        let runtime = FixedRuntime::new(vec![0.85, 0.15]);
        let mut adapter =
            InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Cpu).unwrap();
        let score = adapter.infer(&vec![0.0; 300]).unwrap();
        assert!((score - 0.85).abs() < f32::EPSILON);
        assert_eq!(adapter.runs(), 1);
    }

    #[test]
    fn test_infer_wrong_length_skips_backend() {
        let runtime = FixedRuntime::new(vec![0.5]);
        let mut adapter =
            InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Cpu).unwrap();
        let err = adapter.infer(&[0.0; 299]).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { expected: 300, actual: 299 }));
        assert_eq!(runtime.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_output() {
        let runtime = FixedRuntime::new(Vec::new());
        let mut adapter =
            InferenceAdapter::initialize(&runtime, &source(), InputShape::new(2, 3), BackendKind::Cpu).unwrap();
        assert!(matches!(adapter.infer(&[0.0; 6]), Err(InferenceError::EmptyOutput)));
    }

    #[test]
    fn test_infer_after_release_is_disposed() {
        let runtime = FixedRuntime::new(vec![0.9]);
        let mut adapter =
            InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Cpu).unwrap();
        assert!(adapter.infer(&vec![0.0; 300]).is_ok());
        assert!(adapter.release());
        for _ in 0..3 {
            assert!(matches!(adapter.infer(&vec![0.0; 300]), Err(InferenceError::Disposed)));
        }
        assert_eq!(runtime.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_exactly_once() {
        let runtime = FixedRuntime::new(vec![0.9]);
        let mut adapter =
            InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Cpu).unwrap();
        assert!(adapter.release());
        assert!(!adapter.release());
        assert!(adapter.is_released());
        drop(adapter);
        assert_eq!(runtime.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let runtime = FixedRuntime::new(vec![0.9]);
        {
            let _adapter =
                InferenceAdapter::initialize(&runtime, &source(), InputShape::default(), BackendKind::Cpu).unwrap();
        }
        assert_eq!(runtime.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_input_shape_dims() {
        let shape = InputShape::default();
        assert_eq!(shape.dims(), [1, 100, 3]);
        assert_eq!(shape.len(), 300);
    }
}
