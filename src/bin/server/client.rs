//! Remote mode: sends an image to a running server and prints the fields.

use crate::analysis::{AnalysisError, AnalyzeResponse, ResponseStatus};
use crate::cli::print_fields;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

/// Upload `path` to `{backend_url}/analyze` and print the returned fields
pub async fn analyze_remote(
    path: &Path,
    backend_url: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime_for(path))
        .map_err(|e| AnalysisError::Remote(e.to_string()))?;
    let form = Form::new().part("file", part);

    let endpoint = format!("{}/analyze", backend_url.trim_end_matches('/'));
    info!(endpoint = %endpoint, "Sending image to backend");

    let start = Instant::now();
    let response = reqwest::Client::new()
        .post(&endpoint)
        .multipart(form)
        .send()
        .await
        .map_err(|e| {
            error!(endpoint = %endpoint, error = %e, "Backend unreachable");
            AnalysisError::Remote(format!("Failed to reach {}: {}", endpoint, e))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Backend returned an error");
        return Err(AnalysisError::Remote(format!("backend returned {}: {}", status, body)).into());
    }

    let payload: AnalyzeResponse = response
        .json()
        .await
        .map_err(|e| AnalysisError::Remote(format!("Invalid response body: {}", e)))?;
    if payload.status != ResponseStatus::Success {
        let message = payload.error.unwrap_or_else(|| "unknown error".to_string());
        return Err(AnalysisError::Remote(message).into());
    }

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    print_fields(
        &payload.data,
        None,
        payload.processing_time_ms.unwrap_or(elapsed_ms),
    );
    Ok(())
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
