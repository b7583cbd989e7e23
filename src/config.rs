use crate::models::{ComponentStatus, NewComponent, ScalarMap};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub control: ControlConfig,
    /// Components registered at startup, in file order.
    #[serde(default)]
    pub components: Vec<ComponentSeed>,
}

/// One `[[components]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentSeed {
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
    pub order: i32,
    #[serde(default)]
    pub status: ComponentStatus,
    #[serde(default)]
    pub enabled: bool,
    pub container_id: Option<String>,
    #[serde(default)]
    pub configuration: ScalarMap,
}

impl From<ComponentSeed> for NewComponent {
    fn from(s: ComponentSeed) -> Self {
        NewComponent {
            name: s.name,
            display_name: s.display_name,
            description: s.description,
            image: s.image,
            ports: s.ports,
            volumes: s.volumes,
            network_name: s.network_name,
            status: s.status,
            enabled: s.enabled,
            order: s.order,
            container_id: s.container_id,
            configuration: s.configuration,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Samples retained per buffer (system, and each component).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
    /// How often to log collector counters at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_history_capacity() -> usize {
    crate::metrics_store::DEFAULT_HISTORY_CAPACITY
}

fn default_source_timeout_ms() -> u64 {
    5_000
}

fn default_stats_log_interval_secs() -> u64 {
    300
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            history_capacity: default_history_capacity(),
            source_timeout_ms: default_source_timeout_ms(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

impl CollectionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    pub fn stats_log_interval(&self) -> Duration {
        Duration::from_secs(self.stats_log_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    /// Bound on each container runtime call.
    #[serde(default = "default_control_timeout_ms")]
    pub timeout_ms: u64,
    /// Lifecycle events buffered for /ws/events subscribers (slow clients may lag).
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default = "default_log_tail")]
    pub log_tail: usize,
}

fn default_control_timeout_ms() -> u64 {
    10_000
}

fn default_event_capacity() -> usize {
    64
}

fn default_log_tail() -> usize {
    100
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_control_timeout_ms(),
            event_capacity: default_event_capacity(),
            log_tail: default_log_tail(),
        }
    }
}

impl ControlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Seeds converted to registry input, in file order.
    pub fn component_seeds(&self) -> Vec<NewComponent> {
        self.components.iter().cloned().map(NewComponent::from).collect()
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            self.collection.interval_secs > 0,
            "collection.interval_secs must be > 0, got {}",
            self.collection.interval_secs
        );
        anyhow::ensure!(
            self.collection.history_capacity > 0,
            "collection.history_capacity must be > 0, got {}",
            self.collection.history_capacity
        );
        anyhow::ensure!(
            self.collection.source_timeout_ms > 0,
            "collection.source_timeout_ms must be > 0, got {}",
            self.collection.source_timeout_ms
        );
        anyhow::ensure!(
            self.collection.stats_log_interval_secs > 0,
            "collection.stats_log_interval_secs must be > 0, got {}",
            self.collection.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.control.timeout_ms > 0,
            "control.timeout_ms must be > 0, got {}",
            self.control.timeout_ms
        );
        anyhow::ensure!(
            self.control.event_capacity > 0,
            "control.event_capacity must be > 0, got {}",
            self.control.event_capacity
        );
        anyhow::ensure!(
            self.control.log_tail > 0,
            "control.log_tail must be > 0, got {}",
            self.control.log_tail
        );

        let mut names = HashSet::new();
        for c in &self.components {
            NewComponent::from(c.clone()).validate()?;
            anyhow::ensure!(
                names.insert(c.name.as_str()),
                "components: duplicate name {}",
                c.name
            );
        }
        Ok(())
    }
}
