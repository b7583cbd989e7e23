// In-memory component registry. Sole owner of Component records; every mutation goes through
// `update` or `update_if`.

use crate::models::{Component, ComponentId, ComponentUpdate, NewComponent};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("component {0} not found")]
    NotFound(ComponentId),
}

/// Serializes control operations on one component. Lives and dies with the record.
pub type ControlLock = Arc<tokio::sync::Mutex<()>>;

struct Entry {
    component: Component,
    control: ControlLock,
}

struct RegistryInner {
    components: BTreeMap<ComponentId, Entry>,
    next_id: ComponentId,
}

pub struct ComponentRegistry {
    inner: RwLock<RegistryInner>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                components: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Builds a registry holding the given seeds, ids assigned in input order.
    pub fn seeded(seeds: impl IntoIterator<Item = NewComponent>) -> Self {
        let registry = Self::new();
        for seed in seeds {
            registry.create(seed);
        }
        registry
    }

    /// Stores a new record under the next unused id. Ids are never reused, even after delete.
    pub fn create(&self, new: NewComponent) -> Component {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        let component = new.into_component(id);
        inner.components.insert(
            id,
            Entry {
                component: component.clone(),
                control: ControlLock::default(),
            },
        );
        tracing::debug!(
            operation = "create_component",
            component_id = id,
            name = %component.name,
            "component registered"
        );
        component
    }

    pub fn get(&self, id: ComponentId) -> Result<Component, RegistryError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .components
            .get(&id)
            .map(|e| e.component.clone())
            .ok_or(RegistryError::NotFound(id))
    }

    /// The control lock of an existing component. Unknown ids get no lock.
    pub fn control_lock(&self, id: ComponentId) -> Result<ControlLock, RegistryError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .components
            .get(&id)
            .map(|e| e.control.clone())
            .ok_or(RegistryError::NotFound(id))
    }

    /// All records sorted by `order`, ties broken by id.
    pub fn list(&self) -> Vec<Component> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        // BTreeMap iterates by id and sort_by_key is stable, so equal orders stay id-ascending.
        let mut components: Vec<Component> = inner
            .components
            .values()
            .map(|e| e.component.clone())
            .collect();
        components.sort_by_key(|c| c.order);
        components
    }

    /// Merges the provided fields into the stored record and returns the result.
    pub fn update(
        &self,
        id: ComponentId,
        update: ComponentUpdate,
    ) -> Result<Component, RegistryError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = inner
            .components
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;
        update.apply(&mut entry.component);
        Ok(entry.component.clone())
    }

    /// Like `update`, but only merges when `condition` holds for the stored record,
    /// checked under the same write lock. `Ok(None)` means the condition failed.
    pub fn update_if(
        &self,
        id: ComponentId,
        condition: impl FnOnce(&Component) -> bool,
        update: ComponentUpdate,
    ) -> Result<Option<Component>, RegistryError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = inner
            .components
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;
        if !condition(&entry.component) {
            return Ok(None);
        }
        update.apply(&mut entry.component);
        Ok(Some(entry.component.clone()))
    }

    pub fn delete(&self, id: ComponentId) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let existed = inner.components.remove(&id).is_some();
        if existed {
            tracing::debug!(
                operation = "delete_component",
                component_id = id,
                "component removed"
            );
        }
        existed
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
