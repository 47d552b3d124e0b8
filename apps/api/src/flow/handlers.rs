//! Axum route handlers for the Flow API. Stateless: the client owns the wizard
//! state and sends it back with every event.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::flow::{current_route, next_step, FlowSnapshot, Step, WizardEvent, WizardState};

#[derive(Debug, Deserialize)]
pub struct FlowNextRequest {
    #[serde(default)]
    pub state: WizardState,
    pub event: WizardEvent,
}

#[derive(Debug, Serialize)]
pub struct FlowNextResponse {
    pub state: WizardState,
    pub step: Step,
    pub path: &'static str,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct FlowRouteResponse {
    pub step: Step,
    pub path: &'static str,
}

/// POST /api/v1/flow/next
pub async fn handle_flow_next(
    Json(request): Json<FlowNextRequest>,
) -> Result<Json<FlowNextResponse>, AppError> {
    let before = request.state.clone();
    let state = next_step(request.state, request.event);
    let step = state.step();

    Ok(Json(FlowNextResponse {
        changed: state != before,
        path: step.path(),
        step,
        state,
    }))
}

/// POST /api/v1/flow/route
///
/// Routes a flat snapshot as persisted by older clients.
pub async fn handle_flow_route(
    Json(snapshot): Json<FlowSnapshot>,
) -> Result<Json<FlowRouteResponse>, AppError> {
    let step = current_route(&snapshot);
    Ok(Json(FlowRouteResponse {
        step,
        path: step.path(),
    }))
}
