// Component records and the partial update applied through the registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ComponentId = u32;

/// Opaque configuration / additional-metrics value. Only scalars are modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Text(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Text(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int(v)
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

pub type ScalarMap = BTreeMap<String, ScalarValue>;

/// Lifecycle status; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Running,
    #[default]
    Stopped,
    Warning,
    Error,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Running => "running",
            ComponentStatus::Stopped => "stopped",
            ComponentStatus::Warning => "warning",
            ComponentStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    pub network_name: Option<String>,
    pub status: ComponentStatus,
    pub enabled: bool,
    pub order: i32,
    pub cpu_usage: Option<u8>,
    pub memory_usage: Option<String>,
    pub container_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub uptime: Option<String>,
    #[serde(default)]
    pub configuration: ScalarMap,
}

impl Component {
    /// Whether the collector should sample this component.
    pub fn is_collectable(&self) -> bool {
        self.status != ComponentStatus::Stopped
    }

    /// Container address: the recorded handle if any, else the component name.
    pub fn container_ref(&self) -> &str {
        self.container_id.as_deref().unwrap_or(&self.name)
    }
}

/// Everything a component record holds except its id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComponent {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub network_name: Option<String>,
    #[serde(default)]
    pub status: ComponentStatus,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub cpu_usage: Option<u8>,
    #[serde(default)]
    pub memory_usage: Option<String>,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub configuration: ScalarMap,
}

impl NewComponent {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            order,
            ..Default::default()
        }
    }

    /// Checks the record-level invariants a seed must satisfy.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.name.is_empty(), "component name must be non-empty");
        anyhow::ensure!(
            self.status != ComponentStatus::Running || self.enabled,
            "component {}: status running requires enabled = true",
            self.name
        );
        anyhow::ensure!(
            self.status != ComponentStatus::Stopped || self.container_id.is_none(),
            "component {}: a stopped component cannot carry a container_id",
            self.name
        );
        if let Some(cpu) = self.cpu_usage {
            anyhow::ensure!(
                cpu <= 100,
                "component {}: cpu_usage must be 0..=100, got {}",
                self.name,
                cpu
            );
        }
        Ok(())
    }

    pub(crate) fn into_component(self, id: ComponentId) -> Component {
        Component {
            id,
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            image: self.image,
            ports: self.ports,
            volumes: self.volumes,
            network_name: self.network_name,
            status: self.status,
            enabled: self.enabled,
            order: self.order,
            cpu_usage: self.cpu_usage,
            memory_usage: self.memory_usage,
            container_id: self.container_id,
            created_at: self.created_at,
            uptime: self.uptime,
            configuration: self.configuration,
        }
    }
}

/// Partial update merged into a stored record. `None` leaves a field untouched;
/// for nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentUpdate {
    pub display_name: Option<String>,
    pub status: Option<ComponentStatus>,
    pub enabled: Option<bool>,
    pub order: Option<i32>,
    pub cpu_usage: Option<Option<u8>>,
    pub memory_usage: Option<Option<String>>,
    pub container_id: Option<Option<String>>,
    pub created_at: Option<Option<DateTime<Utc>>>,
    pub uptime: Option<Option<String>>,
    pub configuration: Option<ScalarMap>,
}

impl ComponentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ComponentUpdate::default()
    }

    pub(crate) fn apply(self, c: &mut Component) {
        if let Some(v) = self.display_name {
            c.display_name = v;
        }
        if let Some(v) = self.status {
            c.status = v;
        }
        if let Some(v) = self.enabled {
            c.enabled = v;
        }
        if let Some(v) = self.order {
            c.order = v;
        }
        if let Some(v) = self.cpu_usage {
            c.cpu_usage = v.map(|cpu| cpu.min(100));
        }
        if let Some(v) = self.memory_usage {
            c.memory_usage = v;
        }
        if let Some(v) = self.container_id {
            c.container_id = v;
        }
        if let Some(v) = self.created_at {
            c.created_at = v;
        }
        if let Some(v) = self.uptime {
            c.uptime = v;
        }
        if let Some(v) = self.configuration {
            c.configuration = v;
        }
    }
}
