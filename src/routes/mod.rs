// HTTP + WebSocket routes over the registry, metrics store and lifecycle controller

mod components;
mod error;
mod http;
mod metrics;
mod ws;

pub use error::ApiError;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::lifecycle::LifecycleController;
use crate::metrics_store::MetricsStore;
use crate::registry::ComponentRegistry;

/// Number of samples returned by history endpoints when `limit` is absent or invalid.
pub const DEFAULT_HISTORY_LIMIT: usize = 24;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) registry: Arc<ComponentRegistry>,
    pub(crate) store: Arc<MetricsStore>,
    pub(crate) lifecycle: Arc<LifecycleController>,
}

pub fn app(
    registry: Arc<ComponentRegistry>,
    store: Arc<MetricsStore>,
    lifecycle: Arc<LifecycleController>,
) -> Router {
    let state = AppState {
        registry,
        store,
        lifecycle,
    };
    Router::new()
        .route("/version", get(http::version_handler))
        .route("/api/components", get(components::list))
        .route("/api/components/{id}", get(components::get_one))
        .route("/api/components/{id}/status", post(components::set_status))
        .route("/api/components/{id}/restart", post(components::restart))
        .route("/api/components/{id}/logs", get(components::logs))
        .route("/api/metrics/system", get(metrics::system_latest))
        .route("/api/metrics/system/history", get(metrics::system_history))
        .route("/api/metrics/components/{id}", get(metrics::component_samples))
        .route(
            "/api/metrics/components/{id}/history",
            get(metrics::component_history),
        )
        .route("/ws/events", get(ws::ws_events))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
