// Periodic metrics collection.
// Each tick: one system sample, then one sample per non-stopped component, fetched serially.
// Faults are logged and skipped; they never stop the loop.

use crate::metrics_store::MetricsStore;
use crate::models::{Component, ComponentUpdate, NewSystemSample};
use crate::registry::{ComponentRegistry, RegistryError};
use crate::source::{MetricsFault, MetricsSource};
use crate::units::format_uptime;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tracing::{debug, info, instrument, warn};

/// Shared structures and the telemetry source the collector works against.
#[derive(Clone)]
pub struct CollectorDeps {
    pub registry: Arc<ComponentRegistry>,
    pub store: Arc<MetricsStore>,
    pub source: Arc<dyn MetricsSource>,
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub interval: Duration,
    /// Upper bound on each individual source call.
    pub source_timeout: Duration,
    /// How often to log collector counters at INFO.
    pub stats_log_interval: Duration,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub system_sampled: bool,
    pub components_sampled: usize,
    pub components_failed: usize,
    /// Components not sampled because they are stopped.
    pub components_skipped: usize,
    /// Samples discarded because the component was stopped, restarted or removed mid-fetch.
    pub components_stale: usize,
}

#[derive(Debug, Default)]
struct CollectorStats {
    ticks_total: u64,
    system_faults_total: u64,
    component_samples_total: u64,
    component_faults_total: u64,
}

impl CollectorStats {
    fn record(&mut self, report: &TickReport) {
        self.ticks_total += 1;
        if !report.system_sampled {
            self.system_faults_total += 1;
        }
        self.component_samples_total += report.components_sampled as u64;
        self.component_faults_total += report.components_failed as u64;
    }
}

async fn bounded<T>(
    limit: Duration,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, MetricsFault> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(MetricsFault::Source(e)),
        Err(_) => Err(MetricsFault::Timeout(limit.as_millis() as u64)),
    }
}

fn uptime_of(component: &Component) -> Option<String> {
    let started = component.created_at?;
    let elapsed = (chrono::Utc::now() - started).to_std().unwrap_or_default();
    Some(format_uptime(elapsed))
}

/// Runs a single collection pass against the given structures.
pub async fn run_one_tick(deps: &CollectorDeps, source_timeout: Duration) -> TickReport {
    let mut report = TickReport::default();

    match bounded(source_timeout, deps.source.fetch_system_sample()).await {
        Ok(sample) => {
            deps.store.append_system_sample(sample);
            report.system_sampled = true;
        }
        Err(e) => {
            warn!(
                error = %e,
                operation = "fetch_system_sample",
                "system sample skipped this tick"
            );
        }
    }

    for component in deps.registry.list() {
        if !component.is_collectable() {
            report.components_skipped += 1;
            continue;
        }
        let sample = match bounded(
            source_timeout,
            deps.source.fetch_component_sample(&component),
        )
        .await
        {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "fetch_component_sample",
                    component = %component.name,
                    "component sample skipped this tick"
                );
                report.components_failed += 1;
                continue;
            }
        };

        let update = ComponentUpdate {
            cpu_usage: Some(Some(sample.cpu_usage)),
            memory_usage: Some(Some(sample.memory_usage.clone())),
            uptime: uptime_of(&component).map(Some),
            ..Default::default()
        };
        // A control action may have landed during the fetch; only write onto the same incarnation.
        let unchanged = |c: &Component| {
            c.is_collectable()
                && c.container_id == component.container_id
                && c.created_at == component.created_at
        };
        match deps.registry.update_if(component.id, unchanged, update) {
            Ok(Some(_)) => {
                deps.store.append_component_sample(component.id, sample);
                report.components_sampled += 1;
            }
            Ok(None) => {
                debug!(
                    component = %component.name,
                    "component changed state during collection; sample dropped"
                );
                report.components_stale += 1;
            }
            Err(RegistryError::NotFound(id)) => {
                debug!(component_id = id, "component removed during collection");
                report.components_stale += 1;
            }
        }
    }

    report
}

/// Appends a zero-valued system sample if nothing has been collected yet.
fn seed_baseline_if_empty(store: &MetricsStore) {
    if store.latest_system_sample().is_none() {
        store.append_system_sample(NewSystemSample::baseline(chrono::Utc::now()));
        debug!(
            operation = "seed_system_sample",
            "no system sample after first tick; seeded baseline"
        );
    }
}

#[instrument(skip_all, fields(interval_secs = config.interval.as_secs()))]
async fn run(deps: CollectorDeps, config: CollectorConfig, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut tick = interval(config.interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_log_tick = interval(config.stats_log_interval);
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut stats = CollectorStats::default();

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let report = run_one_tick(&deps, config.source_timeout).await;
                if stats.ticks_total == 0 {
                    seed_baseline_if_empty(&deps.store);
                }
                stats.record(&report);
                debug!(
                    system_sampled = report.system_sampled,
                    components_sampled = report.components_sampled,
                    components_failed = report.components_failed,
                    components_skipped = report.components_skipped,
                    components_stale = report.components_stale,
                    "collection tick complete"
                );
            }
            _ = &mut shutdown_rx => {
                debug!("Collector shutting down");
                break;
            }
            _ = stats_log_tick.tick() => {
                info!(
                    ticks_total = stats.ticks_total,
                    system_faults_total = stats.system_faults_total,
                    component_samples_total = stats.component_samples_total,
                    component_faults_total = stats.component_faults_total,
                    "collector stats"
                );
            }
        }
    }
}

struct Running {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Idle until `start`; Running until `stop`, which returns it to Idle.
pub struct CollectionScheduler {
    deps: CollectorDeps,
    config: CollectorConfig,
    running: Option<Running>,
}

impl CollectionScheduler {
    pub fn new(deps: CollectorDeps, config: CollectorConfig) -> Self {
        Self {
            deps,
            config,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Spawns the tick loop; the first tick fires immediately. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run(self.deps.clone(), self.config.clone(), shutdown_rx));
        self.running = Some(Running {
            shutdown_tx,
            handle,
        });
        info!(
            interval_secs = self.config.interval.as_secs(),
            "collector started"
        );
        true
    }

    /// Cancels the pending tick and waits for the loop to exit. No-op when idle.
    pub async fn stop(&mut self) {
        if let Some(Running {
            shutdown_tx,
            handle,
        }) = self.running.take()
        {
            let _ = shutdown_tx.send(());
            if let Err(e) = handle.await {
                warn!(error = %e, "collector task ended abnormally");
            }
        }
    }
}
