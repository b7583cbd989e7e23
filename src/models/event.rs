// Lifecycle events published after every start/stop/restart attempt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ComponentId, ComponentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Restart => "restart",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "started",
            LifecycleAction::Stop => "stopped",
            LifecycleAction::Restart => "restarted",
        }
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `status` is the component's status after the attempt (unchanged on failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub component_id: ComponentId,
    pub name: String,
    pub display_name: String,
    pub action: LifecycleAction,
    pub succeeded: bool,
    pub reason: Option<String>,
    pub status: ComponentStatus,
    pub timestamp: DateTime<Utc>,
}
