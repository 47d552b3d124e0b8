use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::generation::validation::IntentErrors;
use crate::render::ExportError;
use crate::upload::UploadError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid intent: {0}")]
    InvalidIntent(#[from] IntentErrors),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<Value>) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::InvalidIntent(errors) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INTENT",
                "The assignment request has problems that must be fixed first".to_string(),
                Some(json!(errors.messages)),
            ),
            AppError::Export(e) => match e {
                ExportError::EmptyAssignment
                | ExportError::MalformedProblem { .. }
                | ExportError::InvalidImport(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXPORT_REJECTED",
                    e.to_string(),
                    None,
                ),
                _ => {
                    tracing::error!("Export error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "EXPORT_FAILED",
                        "The document could not be produced".to_string(),
                        None,
                    )
                }
            },
            AppError::Upload(e) => {
                let (status, code) = match e {
                    UploadError::UnsupportedType { .. } => {
                        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FILE_TYPE")
                    }
                    UploadError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE"),
                    UploadError::Empty(_) | UploadError::Extraction { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "UNREADABLE_FILE")
                    }
                };
                (status, code, e.to_string(), None)
            }
            AppError::Enrichment(msg) => {
                tracing::error!("Enrichment error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ENRICHMENT_ERROR",
                    "Problem enrichment failed".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn make_body(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_intent_lists_every_message() {
        let error = AppError::from(IntentErrors {
            messages: vec!["topic is required".to_string(), "bad total".to_string()],
        });
        let (status, body) = make_body(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INTENT");
        assert_eq!(body["error"]["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_export_is_unprocessable() {
        let error = AppError::from(ExportError::MalformedProblem {
            problem_id: "q-3".to_string(),
            reason: "question text is empty".to_string(),
        });
        let (status, body) = make_body(error).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["message"].as_str().unwrap().contains("q-3"));
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_upload_errors_map_to_statuses() {
        let unsupported = AppError::from(UploadError::UnsupportedType {
            file_name: "a.rtf".to_string(),
        });
        assert_eq!(make_body(unsupported).await.0, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let too_large = AppError::from(UploadError::TooLarge {
            file_name: "a.pdf".to_string(),
            size: 11,
            limit: 10,
        });
        assert_eq!(make_body(too_large).await.0, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, body) = make_body(AppError::Internal(anyhow::anyhow!("secret path"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("secret path"));
    }
}
