// Shared test helpers: scripted container controller, scripted metrics source, sample builders
#![allow(dead_code)]

use chrono::Utc;
use stackwatch::controller::{ContainerController, ControllerError};
use stackwatch::lifecycle::{LifecycleConfig, LifecycleController};
use stackwatch::models::*;
use stackwatch::registry::ComponentRegistry;
use stackwatch::source::MetricsSource;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::Duration;

pub fn system_sample(cpu: u8) -> NewSystemSample {
    NewSystemSample {
        timestamp: Utc::now(),
        cpu_usage: cpu,
        memory_usage: "8.4 GB".into(),
        memory_total: "16 GB".into(),
        disk_usage: 42,
        disk_total: "512 GB".into(),
        network_io: "24 MB/s".into(),
    }
}

pub fn component_sample(cpu: u8) -> NewComponentSample {
    NewComponentSample {
        timestamp: Utc::now(),
        cpu_usage: cpu,
        memory_usage: "950 MB".into(),
        task_count: Some(12),
        additional_metrics: ScalarMap::new(),
    }
}

pub fn stopped(name: &str, order: i32) -> NewComponent {
    NewComponent::new(name, name.to_uppercase(), order)
}

pub fn running(name: &str, order: i32) -> NewComponent {
    NewComponent {
        status: ComponentStatus::Running,
        enabled: true,
        container_id: Some(format!("ctr-{name}")),
        created_at: Some(Utc::now()),
        ..NewComponent::new(name, name.to_uppercase(), order)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Reject,
    Missing,
    Hang,
}

/// Container controller whose outcome is set per test. Records every call as "op:name".
pub struct FakeController {
    behavior: Mutex<Behavior>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeController {
    pub fn new(behavior: Behavior) -> Self {
        Self::with_delay(behavior, Duration::ZERO)
    }

    pub fn with_delay(behavior: Behavior, delay: Duration) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            delay,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn act(&self, op: &str, target: &str) -> Result<String, ControllerError> {
        self.calls.lock().unwrap().push(format!("{op}:{target}"));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let behavior = *self.behavior.lock().unwrap();
        let result = match behavior {
            Behavior::Succeed => Ok(format!("ctr-{target}")),
            Behavior::Reject => Err(ControllerError::Rejected(format!("{op} refused"))),
            Behavior::Missing => Err(ControllerError::NotFound(target.to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!()
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait::async_trait]
impl ContainerController for FakeController {
    async fn start(&self, component: &Component) -> Result<String, ControllerError> {
        self.act("start", &component.name).await
    }

    async fn stop(&self, component: &Component) -> Result<(), ControllerError> {
        self.act("stop", &component.name).await.map(|_| ())
    }

    async fn restart(&self, component: &Component) -> Result<String, ControllerError> {
        self.act("restart", &component.name).await
    }

    async fn logs(&self, container_id: &str, tail: usize) -> Result<Vec<String>, ControllerError> {
        self.act("logs", container_id).await?;
        let lines: Vec<String> = (1..=3)
            .map(|i| format!("[{container_id}] line {i}"))
            .collect();
        Ok(lines.into_iter().take(tail).collect())
    }
}

/// Metrics source with a rising system CPU counter and per-component failure switches.
#[derive(Default)]
pub struct FakeSource {
    next_cpu: AtomicU8,
    fail_system: AtomicBool,
    failing: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
    slow: Mutex<HashMap<String, Duration>>,
    component_calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_system(&self, fail: bool) {
        self.fail_system.store(fail, Ordering::SeqCst);
    }

    pub fn fail_component(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn hang_component(&self, name: &str) {
        self.hanging.lock().unwrap().insert(name.to_string());
    }

    pub fn slow_component(&self, name: &str, delay: Duration) {
        self.slow.lock().unwrap().insert(name.to_string(), delay);
    }

    pub fn component_calls(&self) -> Vec<String> {
        self.component_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MetricsSource for FakeSource {
    async fn fetch_system_sample(&self) -> anyhow::Result<NewSystemSample> {
        anyhow::ensure!(
            !self.fail_system.load(Ordering::SeqCst),
            "system probe unavailable"
        );
        let cpu = self.next_cpu.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(system_sample(cpu))
    }

    async fn fetch_component_sample(
        &self,
        component: &Component,
    ) -> anyhow::Result<NewComponentSample> {
        self.component_calls
            .lock()
            .unwrap()
            .push(component.name.clone());
        if self.hanging.lock().unwrap().contains(&component.name) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let delay = self.slow.lock().unwrap().get(&component.name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        anyhow::ensure!(
            !self.failing.lock().unwrap().contains(&component.name),
            "stats unavailable for {}",
            component.name
        );
        Ok(NewComponentSample {
            memory_usage: format!("{} MB", component.id * 100),
            ..component_sample(10 + component.id as u8)
        })
    }
}

pub struct LifecycleFixture {
    pub registry: Arc<ComponentRegistry>,
    pub controller: Arc<FakeController>,
    pub lifecycle: Arc<LifecycleController>,
    pub events: broadcast::Receiver<LifecycleEvent>,
}

pub fn lifecycle_fixture(
    seeds: Vec<NewComponent>,
    controller: FakeController,
    timeout: Duration,
) -> LifecycleFixture {
    let registry = Arc::new(ComponentRegistry::seeded(seeds));
    let controller = Arc::new(controller);
    let (tx, events) = broadcast::channel(16);
    let lifecycle = Arc::new(LifecycleController::new(
        registry.clone(),
        controller.clone(),
        tx,
        LifecycleConfig {
            timeout,
            log_tail: 2,
        },
    ));
    LifecycleFixture {
        registry,
        controller,
        lifecycle,
        events,
    }
}
