//! Axum route handlers for the Layout API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::estimator::estimate_problem_height;
use crate::layout::page::PageLayoutConfig;
use crate::layout::paginator::{paginate, PaginationSummary, RenderOptions};
use crate::models::Assignment;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LayoutPreviewRequest {
    pub assignment: Assignment,
    /// Overrides the server's default page config.
    #[serde(default)]
    pub config: Option<PageLayoutConfig>,
    #[serde(default)]
    pub options: RenderOptions,
}

#[derive(Debug, Serialize)]
pub struct ProblemHeight {
    pub problem_id: String,
    pub height_mm: f32,
}

#[derive(Debug, Serialize)]
pub struct LayoutPreviewResponse {
    pub config: PageLayoutConfig,
    pub pagination: PaginationSummary,
    pub problem_heights: Vec<ProblemHeight>,
}

/// POST /api/v1/layout/preview
///
/// Estimates every problem and returns where the page breaks fall, without
/// rendering a document.
pub async fn handle_layout_preview(
    State(state): State<AppState>,
    Json(request): Json<LayoutPreviewRequest>,
) -> Result<Json<LayoutPreviewResponse>, AppError> {
    let config = request.config.unwrap_or(state.page_config);
    config.validate().map_err(AppError::Validation)?;

    let response = tokio::task::spawn_blocking(move || {
        let problem_heights = request
            .assignment
            .problems()
            .map(|p| ProblemHeight {
                problem_id: p.id.clone(),
                height_mm: estimate_problem_height(p, &config),
            })
            .collect();
        let pagination = paginate(&request.assignment, &config, &request.options).summary();
        LayoutPreviewResponse {
            config,
            pagination,
            problem_heights,
        }
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout preview: {e}")))?;

    Ok(Json(response))
}
