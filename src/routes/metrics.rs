// Metrics reads: latest/history for the system and per component

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use super::{ApiError, AppState, DEFAULT_HISTORY_LIMIT};
use crate::models::{ComponentId, ComponentMetricsSample, SystemMetricsSample};

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    limit: Option<String>,
}

impl HistoryQuery {
    /// Missing, non-numeric or zero limits fall back to the default.
    fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|l| l.parse::<usize>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
    }
}

pub(super) async fn system_latest(
    State(state): State<AppState>,
) -> Result<Json<SystemMetricsSample>, ApiError> {
    state
        .store
        .latest_system_sample()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no system metrics collected yet".into()))
}

pub(super) async fn system_history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Json<Vec<SystemMetricsSample>> {
    Json(state.store.system_history(q.limit()))
}

/// Unknown component ids yield an empty list rather than 404.
pub(super) async fn component_samples(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
) -> Json<Vec<ComponentMetricsSample>> {
    Json(state.store.component_samples(id))
}

pub(super) async fn component_history(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
    Query(q): Query<HistoryQuery>,
) -> Json<Vec<ComponentMetricsSample>> {
    Json(state.store.component_history(id, q.limit()))
}
