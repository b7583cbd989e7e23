// Domain models: component records, metrics samples, lifecycle events

mod component;
mod event;
mod metrics;

pub use component::{
    Component, ComponentId, ComponentStatus, ComponentUpdate, NewComponent, ScalarMap, ScalarValue,
};
pub use event::{LifecycleAction, LifecycleEvent};
pub use metrics::{
    ComponentMetricsSample, NewComponentSample, NewSystemSample, SystemMetricsSample,
};
