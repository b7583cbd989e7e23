// Component reads and lifecycle writes

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::models::{Component, ComponentId};

#[derive(Debug, Deserialize)]
pub(super) struct StatusRequest {
    enabled: bool,
}

/// GET /api/components : ordered by `order`, then id.
pub(super) async fn list(State(state): State<AppState>) -> Json<Vec<Component>> {
    Json(state.registry.list())
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
) -> Result<Json<Component>, ApiError> {
    Ok(Json(state.registry.get(id)?))
}

/// POST /api/components/{id}/status: `{"enabled": true}` starts, `false` stops.
pub(super) async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Component>, ApiError> {
    Ok(Json(state.lifecycle.set_enabled(id, req.enabled).await?))
}

pub(super) async fn restart(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
) -> Result<Json<Component>, ApiError> {
    Ok(Json(state.lifecycle.restart(id).await?))
}

pub(super) async fn logs(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let logs = state.lifecycle.logs(id).await?;
    Ok(Json(serde_json::json!({ "logs": logs })))
}
