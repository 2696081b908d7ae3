//! ONNX stub: used when the `onnx` feature is not enabled.
//!
//! Keeps the `OnnxRuntime` name available so hosts compile without tract;
//! every load fails, which the detector treats as fatal at startup.

use tracing::info;

use super::{Backend, BackendKind, InputShape, ModelRuntime, ModelSource};
use crate::error::ModelLoadError;

/// Stub runtime when tract is not compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxRuntime;

impl OnnxRuntime {
    pub fn new() -> Self {
        info!("ONNX execution disabled (compiled without 'onnx' feature)");
        Self
    }
}

impl ModelRuntime for OnnxRuntime {
    fn load(
        &self,
        _source: &ModelSource,
        _shape: InputShape,
        _kind: BackendKind,
    ) -> Result<Box<dyn Backend>, ModelLoadError> {
        Err(ModelLoadError::Unsupported(
            "compiled without the 'onnx' feature".to_string(),
        ))
    }
}
