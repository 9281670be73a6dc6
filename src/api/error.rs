use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::convert::ConvertError;

/// How much failed-tool output is surfaced to the client. The full text
/// goes to the logs; the response gets a bounded excerpt so internal
/// paths do not leak wholesale.
const DETAIL_EXCERPT_LIMIT: usize = 1024;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    InvalidInput(String),

    #[error("Conversion timeout")]
    ConversionTimeout,

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Conversion completed but output file not found")]
    ArtifactMissing,

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<ConvertError> for AppError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::InvalidInput(msg) => AppError::InvalidInput(msg),
            ConvertError::Timeout(_) => AppError::ConversionTimeout,
            ConvertError::Failed(diagnostic) => AppError::ConversionFailed(diagnostic),
            ConvertError::ArtifactMissing => AppError::ArtifactMissing,
            ConvertError::Internal(e) => AppError::Anyhow(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, category, detail) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg),
            AppError::ConversionTimeout => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "conversion_timeout",
                "Conversion timeout".to_string(),
            ),
            AppError::ConversionFailed(diagnostic) => {
                tracing::error!("Conversion failed: {}", diagnostic);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "conversion_failed",
                    format!("Conversion failed: {}", excerpt(&diagnostic)),
                )
            }
            AppError::ArtifactMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "artifact_missing",
                "Conversion completed but output file not found".to_string(),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": category,
            "detail": detail
        }));

        (status, body).into_response()
    }
}

fn excerpt(text: &str) -> &str {
    if text.len() <= DETAIL_EXCERPT_LIMIT {
        return text;
    }
    let mut end = DETAIL_EXCERPT_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_bounds_long_diagnostics() {
        let long = "x".repeat(DETAIL_EXCERPT_LIMIT * 3);
        assert_eq!(excerpt(&long).len(), DETAIL_EXCERPT_LIMIT);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let long = "é".repeat(DETAIL_EXCERPT_LIMIT);
        let cut = excerpt(&long);
        assert!(cut.len() <= DETAIL_EXCERPT_LIMIT);
        assert!(long.is_char_boundary(cut.len()));
    }

    #[test]
    fn test_convert_error_mapping() {
        let err: AppError = ConvertError::InvalidInput("bad".into()).into();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err: AppError = ConvertError::Timeout(std::time::Duration::from_secs(30)).into();
        assert!(matches!(err, AppError::ConversionTimeout));

        let err: AppError = ConvertError::ArtifactMissing.into();
        assert!(matches!(err, AppError::ArtifactMissing));
    }
}
