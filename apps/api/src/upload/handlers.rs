//! Axum route handlers for the Upload API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::state::AppState;
use crate::upload::{ingest, SourceDocument};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub documents: Vec<SourceDocument>,
}

/// POST /api/v1/uploads
///
/// Multipart upload; every part carrying a file name is ingested. One rejected
/// file fails the whole request.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let max_bytes = state.config.max_upload_bytes;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read '{file_name}': {e}")))?;
        files.push((file_name, bytes));
    }

    if files.is_empty() {
        return Err(AppError::Validation("No file was uploaded".to_string()));
    }

    let documents = tokio::task::spawn_blocking(move || {
        files
            .iter()
            .map(|(name, bytes)| ingest(name, bytes, max_bytes))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in upload: {e}")))??;

    Ok(Json(UploadResponse { documents }))
}
