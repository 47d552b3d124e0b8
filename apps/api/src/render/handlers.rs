//! Axum route handlers for the Export API.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::bloom::{validate_assignment_alignment, AlignmentReport};
use crate::errors::AppError;
use crate::layout::{PageLayoutConfig, RenderOptions};
use crate::models::Assignment;
use crate::render::json::parse_json_export;
use crate::render::{export, ExportFormat};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub assignment: Assignment,
    #[serde(default)]
    pub config: Option<PageLayoutConfig>,
    #[serde(default)]
    pub options: RenderOptions,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub title: String,
    pub content: String,
    pub assignment: Assignment,
    pub alignment: AlignmentReport,
}

/// POST /api/v1/export/:format
///
/// Renders the assignment as pdf, docx or json and returns it as a download.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(format): Path<String>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let format: ExportFormat = format.parse().map_err(AppError::Validation)?;
    let config = request.config.unwrap_or(state.page_config);
    config.validate().map_err(AppError::Validation)?;

    let artifact = tokio::task::spawn_blocking(move || {
        export(&request.assignment, &config, format, &request.options, Utc::now())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))??;

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

/// POST /api/v1/export/import
///
/// Accepts a raw `assignment-v1` document and re-checks its alignment.
pub async fn handle_import(body: Bytes) -> Result<Json<ImportResponse>, AppError> {
    let export = parse_json_export(&body)?;
    let alignment = validate_assignment_alignment(&export.assignment.metadata);

    Ok(Json(ImportResponse {
        title: export.assignment.title,
        content: export.assignment.content,
        assignment: export.assignment.metadata,
        alignment,
    }))
}
