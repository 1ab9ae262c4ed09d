//! HTTP server for form analysis.

use crate::analysis::{AnalysisError, AnalyzeResponse, SharedDigitizer, analyze_bytes};
use crate::config::ServerConfig;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use kyc_form_digitizer::prelude::*;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Name of the multipart part carrying the image
const FILE_FIELD: &str = "file";

/// Application state shared across handlers
struct AppState {
    /// `None` when the resources failed to load at startup
    digitizer: Option<SharedDigitizer>,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    resources_loaded: bool,
}

/// Run the HTTP server
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Loading digitizer resources...");
    let digitizer = match FormDigitizer::from_config(&config.digitizer) {
        Ok(digitizer) => {
            info!("Digitizer initialized successfully");
            Some(Arc::new(digitizer))
        }
        Err(e) => {
            error!(error = %e, "Failed to load resources, serving in degraded mode");
            None
        }
    };

    let app = build_router(Arc::new(AppState { digitizer }), config.max_upload_bytes);

    // Parse address
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    info!("Server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /health         - Health check");
    info!("  POST /analyze        - Form analysis");
    info!("  POST /api/v1/analyze - Form analysis (versioned API)");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .route("/api/v1/analyze", post(analyze_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let resources_loaded = state.digitizer.is_some();
    Json(HealthResponse {
        status: if resources_loaded { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        resources_loaded,
    })
}

/// Form analysis endpoint
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> impl IntoResponse {
    let request_id = uuid::Uuid::new_v4().to_string();
    let start = Instant::now();

    let bytes = match read_file_field(multipart).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Rejected upload");
            return error_response(&e);
        }
    };
    info!(request_id = %request_id, bytes = bytes.len(), "Processing analysis request");

    let Some(digitizer) = state.digitizer.clone() else {
        let e = AnalysisError::Unavailable;
        error!(request_id = %request_id, error = %e, "Cannot analyze");
        return error_response(&e);
    };

    let result = tokio::task::spawn_blocking(move || analyze_bytes(&digitizer, &bytes)).await;
    let analysis = match result {
        Ok(Ok(analysis)) => analysis,
        Ok(Err(e)) => {
            error!(request_id = %request_id, error = %e, "Analysis failed");
            return error_response(&e);
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Analysis task panicked");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AnalyzeResponse::error(format!("Analysis failed: {}", e))),
            );
        }
    };

    let processing_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(
        request_id = %request_id,
        words = analysis.word_count,
        fields = analysis.fields.len(),
        total_ms = processing_ms,
        "Analysis completed"
    );

    (
        StatusCode::OK,
        Json(AnalyzeResponse::success(analysis.fields, processing_ms)),
    )
}

/// Reads the bytes of the `file` part of a multipart upload
async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, AnalysisError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::Upload(e.body_text()))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AnalysisError::Upload(e.body_text()))?;
            if bytes.is_empty() {
                return Err(AnalysisError::Upload("the uploaded file is empty".to_string()));
            }
            return Ok(bytes.to_vec());
        }
    }
    Err(AnalysisError::Upload(format!(
        "missing '{}' field in multipart form",
        FILE_FIELD
    )))
}

fn error_response(error: &AnalysisError) -> (StatusCode, Json<AnalyzeResponse>) {
    (
        status_for(error),
        Json(AnalyzeResponse::error(error.to_string())),
    )
}

/// Maps an analysis error to its HTTP status
fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::Upload(_) | AnalysisError::Download(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::Remote(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Digitizer(DigitizerError::NoTextDetected) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AnalysisError::Digitizer(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
        AnalysisError::Digitizer(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "kyc-test-boundary";

    fn degraded_router() -> Router {
        build_router(Arc::new(AppState { digitizer: None }), 1 << 20)
    }

    fn multipart_request(uri: &str, name: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"form.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_file_field_is_rejected() {
        let (status, body) = send(
            degraded_router(),
            multipart_request("/analyze", "foo", b"not an image"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("missing 'file' field"));
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let (status, body) =
            send(degraded_router(), multipart_request("/analyze", "file", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_degraded_server_answers_unavailable() {
        for uri in ["/analyze", "/api/v1/analyze"] {
            let (status, body) = send(
                degraded_router(),
                multipart_request(uri, "file", b"\x89PNG\r\n\x1a\n"),
            )
            .await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body["status"], "error");
            assert!(
                body["error"]
                    .as_str()
                    .unwrap()
                    .contains("No resources available")
            );
        }
    }

    #[tokio::test]
    async fn test_health_reports_degraded() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(degraded_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["resources_loaded"], false);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&AnalysisError::Unavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&AnalysisError::Upload("missing".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DigitizerError::NoTextDetected.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&DigitizerError::InvalidImage { width: 0, height: 3 }.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(
                &DigitizerError::Inference {
                    model_name: "LayoutLMv3".into(),
                    context: "run".into(),
                    source: None,
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unavailable_message() {
        let (status, Json(body)) = error_response(&AnalysisError::Unavailable);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.unwrap().contains("No resources available"));
        assert!(body.data.is_empty());
    }
}
