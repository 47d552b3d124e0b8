pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::flow::handlers as flow;
use crate::generation::handlers as assignments;
use crate::layout::handlers as layout;
use crate::render::handlers as export;
use crate::state::AppState;
use crate::upload::handlers as upload;

/// Multipart framing around the files themselves.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Oversize files must reach the handler to get a descriptive rejection.
    let upload_body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        // Assignment API
        .route(
            "/api/v1/assignments/validate",
            post(assignments::handle_validate_intent),
        )
        .route(
            "/api/v1/assignments/generate",
            post(assignments::handle_generate),
        )
        .route(
            "/api/v1/assignments/alignment",
            post(assignments::handle_alignment),
        )
        .route(
            "/api/v1/assignments/simulate",
            post(assignments::handle_simulate),
        )
        .route(
            "/api/v1/assignments/:id/versions",
            get(assignments::handle_list_versions).post(assignments::handle_record_version),
        )
        .route(
            "/api/v1/assignments/:id/versions/compare",
            get(assignments::handle_compare_versions),
        )
        // Layout API
        .route(
            "/api/v1/layout/preview",
            post(layout::handle_layout_preview),
        )
        // Export API
        .route("/api/v1/export/import", post(export::handle_import))
        .route("/api/v1/export/:format", post(export::handle_export))
        // Upload API
        .route(
            "/api/v1/uploads",
            post(upload::handle_upload).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        // Flow API
        .route("/api/v1/flow/next", post(flow::handle_flow_next))
        .route("/api/v1/flow/route", post(flow::handle_flow_route))
        .with_state(state)
}
