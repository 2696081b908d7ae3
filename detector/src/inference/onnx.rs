//! ONNX execution on tract.
//!
//! tract runs on the CPU only, so an `Accelerated` request reports the
//! backend as unavailable and the adapter falls back to `Cpu`.

use tract_onnx::prelude::*;
use tracing::debug;

use super::{Backend, BackendKind, InputShape, ModelRuntime, ModelSource};
use crate::error::{InferenceError, ModelLoadError};

/// Loads `.onnx` models with tract.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxRuntime;

impl OnnxRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl ModelRuntime for OnnxRuntime {
    fn load(
        &self,
        source: &ModelSource,
        shape: InputShape,
        kind: BackendKind,
    ) -> Result<Box<dyn Backend>, ModelLoadError> {
        if kind == BackendKind::Accelerated {
            return Err(ModelLoadError::BackendUnavailable(
                kind.as_str(),
                "tract executes on the CPU only".to_string(),
            ));
        }

        let onnx = tract_onnx::onnx();
        let model = match source {
            ModelSource::Path(path) => {
                if !path.exists() {
                    return Err(ModelLoadError::NotFound(path.clone()));
                }
                debug!("Loading ONNX model from {:?}", path);
                onnx.model_for_path(path)
            }
            ModelSource::Bytes(bytes) => {
                debug!("Loading ONNX model from {} in-memory bytes", bytes.len());
                onnx.model_for_read(&mut std::io::Cursor::new(bytes))
            }
        }
        .map_err(|e| ModelLoadError::Parse(e.to_string()))?;

        // Pinning the input fact makes tract reject models whose graph
        // cannot accept (1, steps, features).
        let plan = model
            .with_input_fact(0, f32::fact(shape.dims()).into())
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| ModelLoadError::Parse(format!("{:#}", e)))?;

        Ok(Box::new(OnnxBackend { plan }))
    }
}

struct OnnxBackend {
    plan: TypedRunnableModel<TypedModel>,
}

impl Backend for OnnxBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn run(&mut self, input: &[f32], shape: InputShape) -> Result<Vec<f32>, InferenceError> {
        let tensor = Tensor::from_shape(&shape.dims(), input)
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let first = outputs.first().ok_or(InferenceError::EmptyOutput)?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        Ok(view.iter().copied().collect())
    }
}
