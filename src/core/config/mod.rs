//! Configuration types for model inference.

pub mod onnx;

pub use onnx::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
