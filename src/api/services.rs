use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use super::{
    error::ApiError,
    models::{RegisterTargetRequest, RegisterTargetResponse, TargetsResponse},
    state::AppState,
};

/// Liveness probe (GET /health)
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Pending targets (GET /targets)
pub async fn list_targets(State(state): State<AppState>) -> impl IntoResponse {
    let targets = state.scheduler.registry().snapshot();

    Json(TargetsResponse {
        pending: targets.len(),
        targets,
    })
}

/// Register a connection for refresh (POST /targets)
///
/// The target is added before the scheduler is woken, so it is picked up by
/// the next cycle. If a cycle is running the request waits for it to finish
/// before returning 202.
pub async fn register_target(
    State(state): State<AppState>,
    payload: Result<Json<RegisterTargetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;

    let connection_name = request.connection_name.trim();
    if connection_name.is_empty() {
        return Err(ApiError::InvalidPayload(
            "connection_name must not be blank".to_string(),
        ));
    }

    let target = state.scheduler.register_target(connection_name).await?;
    let pending = state.scheduler.pending_count();
    info!(target_name = %target, pending, "Registration accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(RegisterTargetResponse { target, pending }),
    ))
}

/// Refresh counters (GET /operators/metrics)
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}
