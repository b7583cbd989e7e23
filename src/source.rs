// Telemetry capability consumed by the collector

use crate::models::{Component, NewComponentSample, NewSystemSample};

/// A transient telemetry error. Never retried by the core: the next tick is a fresh attempt.
#[derive(Debug, thiserror::Error)]
pub enum MetricsFault {
    #[error("metrics source timed out after {0} ms")]
    Timeout(u64),
    #[error("metrics source error: {0}")]
    Source(#[from] anyhow::Error),
}

#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch_system_sample(&self) -> anyhow::Result<NewSystemSample>;

    async fn fetch_component_sample(
        &self,
        component: &Component,
    ) -> anyhow::Result<NewComponentSample>;
}
