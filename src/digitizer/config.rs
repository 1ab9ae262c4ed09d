//! Configuration of the form digitizer.

use crate::core::config::OrtSessionConfig;
use crate::core::constants::{DEFAULT_MAX_SEQUENCE_LENGTH, LINE_Y_TOLERANCE};
use crate::core::errors::DigitizerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything needed to build a [`FormDigitizer`](super::FormDigitizer) with
/// the Tesseract and LayoutLMv3 adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitizerConfig {
    /// Directory holding `model.onnx`, `tokenizer.json` and `config.json`
    pub model_dir: PathBuf,
    /// Device string (`cpu`, `cuda`, `cuda:N`)
    pub device: String,
    /// Explicit session configuration; takes precedence over `device`
    #[serde(default)]
    pub ort_session: Option<OrtSessionConfig>,
    /// Tesseract executable
    pub tesseract_cmd: PathBuf,
    /// Tesseract language(s), tesseract's default when unset
    #[serde(default)]
    pub ocr_language: Option<String>,
    /// Tesseract page segmentation mode, tesseract's default when unset
    #[serde(default)]
    pub page_segmentation_mode: Option<u8>,
    /// Vertical tolerance of the line grouper, in normalized units
    pub line_tolerance: i64,
    /// Classifier sequence length
    pub max_sequence_length: usize,
}

impl DigitizerConfig {
    /// Creates a configuration with defaults for everything but the model directory.
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            device: "cpu".to_string(),
            ort_session: None,
            tesseract_cmd: PathBuf::from("tesseract"),
            ocr_language: None,
            page_segmentation_mode: None,
            line_tolerance: LINE_Y_TOLERANCE,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        }
    }

    /// Sets the inference device (`cpu`, `cuda`, `cuda:N`).
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Sets an explicit ONNX Runtime session configuration.
    pub fn with_ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_session = Some(config);
        self
    }

    /// Sets the path of the tesseract executable.
    pub fn with_tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.tesseract_cmd = cmd.into();
        self
    }

    /// Sets the tesseract language(s), e.g. `fra` or `eng+fra`.
    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.ocr_language = Some(language.into());
        self
    }

    /// Sets the tesseract page segmentation mode.
    pub fn with_page_segmentation_mode(mut self, psm: u8) -> Self {
        self.page_segmentation_mode = Some(psm);
        self
    }

    /// Sets the vertical tolerance of the line grouper.
    pub fn with_line_tolerance(mut self, tolerance: i64) -> Self {
        self.line_tolerance = tolerance;
        self
    }

    /// Sets the classifier sequence length.
    pub fn with_max_sequence_length(mut self, length: usize) -> Self {
        self.max_sequence_length = length;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), DigitizerError> {
        if self.line_tolerance <= 0 {
            return Err(DigitizerError::config_error_with_suggestion(
                "line tolerance",
                format!("{} is not positive", self.line_tolerance),
                "use a positive number of normalized units, 15 by default",
            ));
        }
        if self.max_sequence_length < 2 {
            return Err(DigitizerError::config_error_with_suggestion(
                "sequence length",
                format!("{} cannot hold the start and end markers", self.max_sequence_length),
                "use the model's maximum length, 512 by default",
            ));
        }
        if let Some(psm) = self.page_segmentation_mode
            && psm > 13
        {
            return Err(DigitizerError::config_error_with_suggestion(
                "page segmentation mode",
                format!("{psm} is out of range"),
                "tesseract accepts 0 to 13",
            ));
        }
        Ok(())
    }

    /// Resolves the session configuration from `ort_session` or `device`.
    pub fn resolved_ort_session(&self) -> Result<Option<OrtSessionConfig>, DigitizerError> {
        match &self.ort_session {
            Some(config) => Ok(Some(config.clone())),
            None => OrtSessionConfig::from_device(&self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OrtExecutionProvider;

    #[test]
    fn test_defaults() {
        let config = DigitizerConfig::new("models/kyc");
        assert_eq!(config.model_dir, PathBuf::from("models/kyc"));
        assert_eq!(config.line_tolerance, 15);
        assert_eq!(config.max_sequence_length, 512);
        assert_eq!(config.tesseract_cmd, PathBuf::from("tesseract"));
        assert!(config.validate().is_ok());
        assert!(config.resolved_ort_session().unwrap().is_none());
    }

    #[test]
    fn test_setters() {
        let config = DigitizerConfig::new("m")
            .with_tesseract_cmd("/opt/tesseract/bin/tesseract")
            .with_ocr_language("fra")
            .with_page_segmentation_mode(11)
            .with_line_tolerance(20)
            .with_max_sequence_length(256);
        assert_eq!(config.tesseract_cmd, PathBuf::from("/opt/tesseract/bin/tesseract"));
        assert_eq!(config.ocr_language.as_deref(), Some("fra"));
        assert_eq!(config.page_segmentation_mode, Some(11));
        assert_eq!(config.line_tolerance, 20);
        assert_eq!(config.max_sequence_length, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = DigitizerConfig::new("m");
        assert!(base.clone().with_line_tolerance(0).validate().is_err());
        assert!(base.clone().with_max_sequence_length(1).validate().is_err());
        assert!(base.clone().with_page_segmentation_mode(14).validate().is_err());
        assert!(base.with_page_segmentation_mode(6).validate().is_ok());
    }

    #[test]
    fn test_device_resolution() {
        let config = DigitizerConfig::new("m").with_device("cuda:1");
        let ort = config.resolved_ort_session().unwrap().unwrap();
        assert_eq!(
            ort.execution_providers.unwrap()[0],
            OrtExecutionProvider::CUDA {
                device_id: Some(1),
                gpu_mem_limit: None
            }
        );

        let explicit = DigitizerConfig::new("m")
            .with_device("cuda")
            .with_ort_session(OrtSessionConfig::new());
        assert!(
            explicit
                .resolved_ort_session()
                .unwrap()
                .unwrap()
                .execution_providers
                .is_none()
        );

        assert!(DigitizerConfig::new("m").with_device("tpu").resolved_ort_session().is_err());
    }

    #[test]
    fn test_deserialize_with_optional_fields_missing() {
        let config: DigitizerConfig = serde_json::from_str(
            r#"{"model_dir":"m","device":"cpu","tesseract_cmd":"/usr/bin/tesseract","line_tolerance":10,"max_sequence_length":256}"#,
        )
        .unwrap();
        assert_eq!(config.line_tolerance, 10);
        assert!(config.ocr_language.is_none());
    }
}
