//! Axum route handlers for the Assignment API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::bloom::{validate_assignment_alignment, AlignmentReport};
use crate::errors::AppError;
use crate::generation::generator::generate_assignment;
use crate::generation::simulation::{simulate_performance, PerformanceSimulation, StudentProfile};
use crate::generation::validation::{check_intent, validate_intent, IntentValidationReport};
use crate::generation::versioning::{compare_assignments, VersionComparison, VersionSummary};
use crate::models::{Assignment, Intent};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub assignment: Assignment,
    pub alignment: AlignmentReport,
    pub version: VersionSummary,
    pub enrichment_backend: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AlignmentRequest {
    pub assignment: Assignment,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub assignment: Assignment,
    /// Empty means the default classroom personas.
    #[serde(default)]
    pub profiles: Vec<StudentProfile>,
}

#[derive(Debug, Deserialize)]
pub struct RecordVersionRequest {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub assignment: Assignment,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Serialize)]
pub struct VersionListResponse {
    pub assignment_id: Uuid,
    pub versions: Vec<VersionSummary>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub from: VersionSummary,
    pub to: VersionSummary,
    pub comparison: VersionComparison,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/assignments/validate
///
/// Reports every problem with an intent without generating anything.
pub async fn handle_validate_intent(
    Json(intent): Json<Intent>,
) -> Result<Json<IntentValidationReport>, AppError> {
    Ok(Json(check_intent(&intent)))
}

/// POST /api/v1/assignments/generate
///
/// Pipeline: validate → generate → enrich → alignment check → record version 1.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(intent): Json<Intent>,
) -> Result<Json<GenerateResponse>, AppError> {
    let intent = validate_intent(intent)?;

    let now = Utc::now();
    let draft = tokio::task::spawn_blocking(move || generate_assignment(&intent, now))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in generate: {e}")))?;

    let assignment = state.enricher.enrich(draft).await?;
    let alignment = validate_assignment_alignment(&assignment);
    if !alignment.valid {
        tracing::warn!(
            "Generated assignment {} has {} alignment violations",
            assignment.id,
            alignment.violations.len()
        );
    }

    let version = {
        let mut versions = state.versions.write().await;
        versions.record("Generated", None, assignment.clone(), now)
    };
    info!(
        "Generated assignment {} ({} problems, {} min)",
        assignment.id,
        assignment.problem_count(),
        assignment.estimated_minutes
    );

    Ok(Json(GenerateResponse {
        version: version.summary(),
        enrichment_backend: state.enricher.backend(),
        assignment,
        alignment,
    }))
}

/// POST /api/v1/assignments/alignment
pub async fn handle_alignment(
    Json(request): Json<AlignmentRequest>,
) -> Result<Json<AlignmentReport>, AppError> {
    Ok(Json(validate_assignment_alignment(&request.assignment)))
}

/// POST /api/v1/assignments/simulate
///
/// Predicts how each student profile would perform on the assignment.
pub async fn handle_simulate(
    Json(request): Json<SimulateRequest>,
) -> Result<Json<PerformanceSimulation>, AppError> {
    if request.assignment.problem_count() == 0 {
        return Err(AppError::Validation(
            "assignment has no problems to simulate".to_string(),
        ));
    }
    for profile in &request.profiles {
        if !(0.0..=1.0).contains(&profile.ability) || profile.pace <= 0.0 {
            return Err(AppError::Validation(format!(
                "profile '{}' needs ability in 0..=1 and a positive pace",
                profile.name
            )));
        }
    }
    Ok(Json(simulate_performance(
        &request.assignment,
        &request.profiles,
    )))
}

/// GET /api/v1/assignments/:id/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<VersionListResponse>, AppError> {
    let versions = state.versions.read().await;
    let history = versions
        .history(assignment_id)
        .ok_or_else(|| AppError::NotFound(format!("No versions for assignment {assignment_id}")))?;

    Ok(Json(VersionListResponse {
        assignment_id,
        versions: history.list(),
    }))
}

/// POST /api/v1/assignments/:id/versions
///
/// Appends a named snapshot. The payload's id must match the path.
pub async fn handle_record_version(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
    Json(request): Json<RecordVersionRequest>,
) -> Result<Json<VersionSummary>, AppError> {
    if request.label.trim().is_empty() {
        return Err(AppError::Validation("label cannot be empty".to_string()));
    }
    if request.assignment.id != assignment_id {
        return Err(AppError::Validation(format!(
            "assignment id {} does not match path id {assignment_id}",
            request.assignment.id
        )));
    }

    let version = state.versions.write().await.record(
        request.label.trim(),
        request.description,
        request.assignment,
        Utc::now(),
    );
    Ok(Json(version.summary()))
}

/// GET /api/v1/assignments/:id/versions/compare?from=1&to=2
pub async fn handle_compare_versions(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, AppError> {
    let versions = state.versions.read().await;
    let history = versions
        .history(assignment_id)
        .ok_or_else(|| AppError::NotFound(format!("No versions for assignment {assignment_id}")))?;
    let lookup = |number: u32| {
        history
            .get(number)
            .ok_or_else(|| AppError::NotFound(format!("Version {number} not found")))
    };
    let before = lookup(query.from)?;
    let after = lookup(query.to)?;

    Ok(Json(CompareResponse {
        comparison: compare_assignments(&before.assignment, &after.assignment),
        from: before.summary(),
        to: after.summary(),
    }))
}
