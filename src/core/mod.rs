//! The core module of the digitizer pipeline.
//!
//! This module contains the fundamental components shared by the pipeline:
//! - Constants of the reconstruction heuristics
//! - Configuration of ONNX Runtime sessions
//! - Error handling
//! - Inference engine integration
//! - Traits describing the external OCR and classifier components

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod traits;

pub use config::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
pub use constants::*;
pub use errors::{DigitizerError, DigitizerResult, ProcessingStage};
pub use inference::{OrtInfer, TensorInput, TensorOutput};
pub use traits::{TokenClassifier, WordDetector};
