//! Core error types for the digitizer pipeline.
//!
//! This module defines the error enum shared by every pipeline component,
//! together with the [`ProcessingStage`] used to report where a failure happened.

use std::path::Path;
use thiserror::Error;

/// Stages of the digitizer pipeline, used as context in processing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Running OCR over the input image.
    WordDetection,
    /// Tokenizing words and preparing model inputs.
    Tokenization,
    /// Running the token classification model.
    Classification,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::WordDetection => write!(f, "word detection"),
            ProcessingStage::Tokenization => write!(f, "tokenization"),
            ProcessingStage::Classification => write!(f, "classification"),
        }
    }
}

/// Errors that can occur while digitizing a form.
#[derive(Error, Debug)]
pub enum DigitizerError {
    /// The image has a zero width or height.
    #[error("invalid image: {width}x{height} has a zero dimension")]
    InvalidImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// OCR found no non-blank word in the image.
    #[error("no text detected in the image")]
    NoTextDetected,

    /// Error occurred while decoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error reported by the OCR engine.
    #[error("ocr failed: {message}")]
    Ocr {
        /// A message describing the OCR failure.
        message: String,
    },

    /// Error occurred during a pipeline stage.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during inference.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        /// The name of the model where inference failed.
        model_name: String,
        /// Additional context about the inference error.
        context: String,
        /// The underlying error, when there is one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error loading a model resource, with context and suggestions.
    #[error("model load failed for '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path to the resource that failed to load.
        model_path: String,
        /// Short reason string.
        reason: String,
        /// Optional suggestion (prefixed with '; ' when present).
        suggestion: String,
        /// Underlying source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error reported by the tokenizer.
    #[error("tokenizer: {message}")]
    Tokenizer {
        /// A message describing the tokenizer error.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor shape operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type DigitizerResult<T> = Result<T, DigitizerError>;

impl From<image::ImageError> for DigitizerError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl DigitizerError {
    /// Creates a model-load error for `path`.
    ///
    /// The suggestion, when present, is appended to the message after `"; "`.
    pub fn model_load_error(
        path: &Path,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ModelLoad {
            model_path: path.display().to_string(),
            reason: reason.into(),
            suggestion: suggestion.map(|s| format!("; {s}")).unwrap_or_default(),
            source,
        }
    }

    /// Creates a configuration error with a suggestion for recovery.
    pub fn config_error_with_suggestion(
        context: impl Into<String>,
        details: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::ConfigError {
            message: format!(
                "{}: {}; suggestion: {}",
                context.into(),
                details.into(),
                suggestion.into()
            ),
        }
    }

    /// Wraps an error raised in a pipeline stage.
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: source.into(),
        }
    }

    /// Returns true when the error is caused by the caller's input rather
    /// than by the pipeline or its resources.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidImage { .. }
                | Self::NoTextDetected
                | Self::ImageLoad(_)
                | Self::InvalidInput { .. }
        )
    }
}
