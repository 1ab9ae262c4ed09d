//! ONNX Runtime integration.
//!
//! [`OrtInfer`] owns a single ONNX Runtime session behind a mutex and runs it
//! with named tensor inputs. It does not interpret outputs; model modules
//! decide what the returned tensors mean.

mod ort_infer_config;
mod session;

use crate::core::config::OrtSessionConfig;
use crate::core::errors::DigitizerError;
use ort::logging::LogLevel;
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::TensorRef;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A named tensor passed to [`OrtInfer::infer`].
#[derive(Debug)]
pub enum TensorInput<'a> {
    /// 2D i64 tensor (token ids, attention masks)
    I64x2(&'a ndarray::Array2<i64>),
    /// 3D i64 tensor (token boxes)
    I64x3(&'a ndarray::Array3<i64>),
    /// 4D f32 tensor (image batches)
    F32x4(&'a ndarray::Array4<f32>),
}

impl TensorInput<'_> {
    fn shape(&self) -> Vec<usize> {
        match self {
            TensorInput::I64x2(arr) => arr.shape().to_vec(),
            TensorInput::I64x3(arr) => arr.shape().to_vec(),
            TensorInput::F32x4(arr) => arr.shape().to_vec(),
        }
    }
}

/// Raw f32 output tensor.
#[derive(Debug, Clone)]
pub struct TensorOutput {
    /// Tensor shape as reported by ONNX Runtime.
    pub shape: Vec<i64>,
    /// Flattened row-major data.
    pub data: Vec<f32>,
}

impl TensorOutput {
    /// Converts the output into a 3D array, checking the rank.
    pub fn try_into_array3(self) -> Result<ndarray::Array3<f32>, DigitizerError> {
        if self.shape.len() != 3 || self.shape.iter().any(|&d| d < 0) {
            return Err(DigitizerError::InvalidInput {
                message: format!("expected a 3D output tensor, got shape {:?}", self.shape),
            });
        }
        let dims = (
            self.shape[0] as usize,
            self.shape[1] as usize,
            self.shape[2] as usize,
        );
        Ok(ndarray::Array3::from_shape_vec(dims, self.data)?)
    }
}

/// ONNX Runtime inference engine wrapping a single session.
#[derive(Debug)]
pub struct OrtInfer {
    session: Mutex<Session>,
    model_path: PathBuf,
    model_name: String,
}

impl OrtInfer {
    /// Creates a new engine with default ONNX Runtime settings.
    pub fn new(model_path: impl AsRef<Path>, model_name: &str) -> Result<Self, DigitizerError> {
        let path = model_path.as_ref();
        let session = session::load_session_with(
            path,
            |builder| builder.with_log_level(LogLevel::Error),
            Some("verify model path and that the model was exported to ONNX"),
        )?;

        Ok(Self {
            session: Mutex::new(session),
            model_path: path.to_path_buf(),
            model_name: model_name.to_string(),
        })
    }

    /// Creates a new engine, applying the given session configuration.
    pub fn from_config(
        model_path: impl AsRef<Path>,
        model_name: &str,
        config: &OrtSessionConfig,
    ) -> Result<Self, DigitizerError> {
        let path = model_path.as_ref();
        let session = session::load_session_with(
            path,
            |builder| Self::apply_ort_config(builder, config),
            Some("check device/EP configuration and model file"),
        )?;

        Ok(Self {
            session: Mutex::new(session),
            model_path: path.to_path_buf(),
            model_name: model_name.to_string(),
        })
    }

    /// Returns the model path associated with this engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the model name associated with this engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Runs the session with named inputs and returns the f32 output `output_name`.
    pub fn infer(
        &self,
        inputs: &[(&str, TensorInput<'_>)],
        output_name: &str,
    ) -> Result<TensorOutput, DigitizerError> {
        if inputs.is_empty() {
            return Err(DigitizerError::InvalidInput {
                message: "No inputs provided for inference".to_string(),
            });
        }

        let shapes: Vec<String> = inputs
            .iter()
            .map(|(name, input)| format!("{}{:?}", name, input.shape()))
            .collect();
        let context = format!("inputs: {}", shapes.join(", "));

        let mut ort_inputs = Vec::with_capacity(inputs.len());
        for (name, input) in inputs {
            let value: SessionInputValue<'_> = match input {
                TensorInput::I64x2(arr) => to_tensor_ref(arr.shape(), arr.as_slice())?.into(),
                TensorInput::I64x3(arr) => to_tensor_ref(arr.shape(), arr.as_slice())?.into(),
                TensorInput::F32x4(arr) => to_tensor_ref(arr.shape(), arr.as_slice())?.into(),
            };
            ort_inputs.push((Cow::Borrowed(*name), value));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| DigitizerError::Inference {
                model_name: self.model_name.clone(),
                context: "session lock poisoned".to_string(),
                source: None,
            })?;

        let outputs = session
            .run(SessionInputs::<0>::ValueMap(ort_inputs))
            .map_err(|e| DigitizerError::Inference {
                model_name: self.model_name.clone(),
                context: context.clone(),
                source: Some(Box::new(e)),
            })?;

        let value = outputs
            .get(output_name)
            .ok_or_else(|| DigitizerError::Inference {
                model_name: self.model_name.clone(),
                context: format!("model has no output named '{}'", output_name),
                source: None,
            })?;

        let (shape, data) =
            value
                .try_extract_tensor::<f32>()
                .map_err(|e| DigitizerError::Inference {
                    model_name: self.model_name.clone(),
                    context: format!("output '{}' is not an f32 tensor", output_name),
                    source: Some(Box::new(e)),
                })?;

        Ok(TensorOutput {
            shape: shape.iter().copied().collect(),
            data: data.to_vec(),
        })
    }
}

fn to_tensor_ref<'a, T>(
    shape: &[usize],
    data: Option<&'a [T]>,
) -> Result<TensorRef<'a, T>, DigitizerError>
where
    T: ort::tensor::PrimitiveTensorElementType + std::fmt::Debug + Clone + 'static,
{
    let dims: Vec<i64> = shape.iter().map(|&d| d as i64).collect();
    let data = data.ok_or_else(|| DigitizerError::InvalidInput {
        message: "input tensor is not contiguous in memory".to_string(),
    })?;
    TensorRef::from_array_view((dims, data)).map_err(|e| DigitizerError::InvalidInput {
        message: format!("Failed to create TensorRef: {}", e),
    })
}
