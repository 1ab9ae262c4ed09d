//! Analysis logic shared between CLI, server and remote client modes.

use kyc_form_digitizer::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to download image: {0}")]
    Download(String),

    #[error("Invalid upload: {0}")]
    Upload(String),

    #[error("No resources available: the model or OCR engine failed to load")]
    Unavailable,

    #[error("Backend request failed: {0}")]
    Remote(String),

    #[error(transparent)]
    Digitizer(#[from] DigitizerError),
}

/// Status of an analysis response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Response of the analyze endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: ResponseStatus,
    pub data: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

impl AnalyzeResponse {
    pub fn success(fields: Vec<Field>, processing_time_ms: f64) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: fields,
            error: None,
            processing_time_ms: Some(processing_time_ms),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: Vec::new(),
            error: Some(message),
            processing_time_ms: None,
        }
    }
}

/// Download content from a URL
pub async fn download_bytes(url: &str) -> Result<Vec<u8>, AnalysisError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| AnalysisError::Download(format!("Failed to fetch URL: {}", e)))?;

    if !response.status().is_success() {
        return Err(AnalysisError::Download(format!(
            "HTTP error: {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalysisError::Download(format!("Failed to read response body: {}", e)))?;

    Ok(bytes.to_vec())
}

/// Decodes and analyzes an uploaded image.
pub fn analyze_bytes(
    digitizer: &FormDigitizer,
    bytes: &[u8],
) -> Result<FormAnalysis, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::Upload("the uploaded file is empty".to_string()));
    }
    let image = load_image_from_bytes(bytes)?;
    Ok(digitizer.analyze(&image)?)
}

/// Thread-safe digitizer shared by the server handlers
pub type SharedDigitizer = Arc<FormDigitizer>;
