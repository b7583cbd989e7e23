// System-wide and per-component metrics samples

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ComponentId, ScalarMap};

/// A system sample as produced by a metrics source, before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSystemSample {
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: u8,
    pub memory_usage: String,
    pub memory_total: String,
    pub disk_usage: u8,
    pub disk_total: String,
    #[serde(rename = "networkIO")]
    pub network_io: String,
}

impl NewSystemSample {
    /// Zero-valued placeholder used when no real sample could be collected yet.
    pub fn baseline(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu_usage: 0,
            memory_usage: "0 B".into(),
            memory_total: "0 B".into(),
            disk_usage: 0,
            disk_total: "0 B".into(),
            network_io: "0 B/s".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetricsSample {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: u8,
    pub memory_usage: String,
    pub memory_total: String,
    pub disk_usage: u8,
    pub disk_total: String,
    #[serde(rename = "networkIO")]
    pub network_io: String,
}

impl SystemMetricsSample {
    pub(crate) fn from_new(id: u64, s: NewSystemSample) -> Self {
        Self {
            id,
            timestamp: s.timestamp,
            cpu_usage: s.cpu_usage,
            memory_usage: s.memory_usage,
            memory_total: s.memory_total,
            disk_usage: s.disk_usage,
            disk_total: s.disk_total,
            network_io: s.network_io,
        }
    }
}

/// A component sample as produced by a metrics source; the store stamps id and component id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComponentSample {
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: u8,
    pub memory_usage: String,
    pub task_count: Option<u32>,
    #[serde(default)]
    pub additional_metrics: ScalarMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetricsSample {
    pub id: u64,
    pub component_id: ComponentId,
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: u8,
    pub memory_usage: String,
    pub task_count: Option<u32>,
    #[serde(default)]
    pub additional_metrics: ScalarMap,
}

impl ComponentMetricsSample {
    pub(crate) fn from_new(id: u64, component_id: ComponentId, s: NewComponentSample) -> Self {
        Self {
            id,
            component_id,
            timestamp: s.timestamp,
            cpu_usage: s.cpu_usage,
            memory_usage: s.memory_usage,
            task_count: s.task_count,
            additional_metrics: s.additional_metrics,
        }
    }
}
