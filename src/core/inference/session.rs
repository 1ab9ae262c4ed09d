//! Helpers for working directly with ONNX Runtime sessions.

use crate::core::errors::DigitizerError;
use ort::session::{Session, builder::SessionBuilder};
use std::path::Path;

const SESSION_CREATION_FAILURE: &str = "failed to create ONNX session";

/// Builds a session using a caller-provided builder configuration.
pub(crate) fn load_session_with<F>(
    model_path: impl AsRef<Path>,
    configure_builder: F,
    suggestion: Option<&str>,
) -> Result<Session, DigitizerError>
where
    F: FnOnce(SessionBuilder) -> Result<SessionBuilder, ort::Error>,
{
    let path = model_path.as_ref();
    if !path.is_file() {
        return Err(DigitizerError::model_load_error(
            path,
            "model file not found",
            suggestion,
            None,
        ));
    }
    let builder = Session::builder()?;
    let builder = configure_builder(builder)?;
    let session = builder.commit_from_file(path).map_err(|e| {
        DigitizerError::model_load_error(
            path,
            SESSION_CREATION_FAILURE,
            suggestion,
            Some(Box::new(e)),
        )
    })?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_reported_before_session_creation() {
        let err = load_session_with(
            "does/not/exist.onnx",
            |builder| builder.with_log_level(ort::logging::LogLevel::Error),
            Some("verify model file exists and is readable"),
        )
        .unwrap_err();
        assert!(matches!(err, DigitizerError::ModelLoad { .. }));
        assert!(err.to_string().contains("does/not/exist.onnx"));
        assert!(err.to_string().contains("model file not found"));
    }
}
