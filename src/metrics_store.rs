// Bounded metrics history: one FIFO buffer for system samples, one per component.
// All buffers sit behind a single mutex; samples are never mutated once stored.

use crate::models::{
    ComponentId, ComponentMetricsSample, NewComponentSample, NewSystemSample, SystemMetricsSample,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Default number of samples retained per buffer.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

struct StoreInner {
    system: VecDeque<SystemMetricsSample>,
    components: HashMap<ComponentId, VecDeque<ComponentMetricsSample>>,
    next_system_id: u64,
    next_component_id: u64,
}

pub struct MetricsStore {
    capacity: usize,
    inner: Mutex<StoreInner>,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Pushes to the tail and evicts from the head until `len <= capacity`.
fn push_bounded<T>(buf: &mut VecDeque<T>, item: T, capacity: usize) {
    buf.push_back(item);
    while buf.len() > capacity {
        buf.pop_front();
    }
}

/// The last `limit` items, oldest first.
fn tail<T: Clone>(buf: &VecDeque<T>, limit: usize) -> Vec<T> {
    let start = buf.len().saturating_sub(limit);
    buf.iter().skip(start).cloned().collect()
}

impl MetricsStore {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(StoreInner {
                system: VecDeque::with_capacity(capacity),
                components: HashMap::new(),
                next_system_id: 1,
                next_component_id: 1,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append_system_sample(&self, sample: NewSystemSample) -> SystemMetricsSample {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_system_id;
        inner.next_system_id += 1;
        let stored = SystemMetricsSample::from_new(id, sample);
        push_bounded(&mut inner.system, stored.clone(), self.capacity);
        stored
    }

    pub fn system_history(&self, limit: usize) -> Vec<SystemMetricsSample> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        tail(&inner.system, limit)
    }

    pub fn latest_system_sample(&self) -> Option<SystemMetricsSample> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.system.back().cloned()
    }

    pub fn append_component_sample(
        &self,
        component_id: ComponentId,
        sample: NewComponentSample,
    ) -> ComponentMetricsSample {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_component_id;
        inner.next_component_id += 1;
        let stored = ComponentMetricsSample::from_new(id, component_id, sample);
        let capacity = self.capacity;
        let buf = inner
            .components
            .entry(component_id)
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        push_bounded(buf, stored.clone(), capacity);
        stored
    }

    /// Most recent `limit` samples for one component, oldest first. Unknown ids yield an empty vec.
    pub fn component_history(
        &self,
        component_id: ComponentId,
        limit: usize,
    ) -> Vec<ComponentMetricsSample> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .components
            .get(&component_id)
            .map(|buf| tail(buf, limit))
            .unwrap_or_default()
    }

    /// Every retained sample for one component, oldest first.
    pub fn component_samples(&self, component_id: ComponentId) -> Vec<ComponentMetricsSample> {
        self.component_history(component_id, self.capacity)
    }
}
