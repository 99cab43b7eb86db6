//! In-memory registry used by tests and examples.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use conductor_graph::ComponentId;

use super::{ComponentMetadata, ComponentRegistry};
use crate::error::RegistryError;

/// A request received by an [`InMemoryRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistryCall {
    /// `load` was called.
    Load(ComponentId),
    /// `start` was called.
    Start(ComponentId),
    /// `stop` was called.
    Stop(ComponentId),
}

#[derive(Debug, Default)]
struct State {
    /// Declared components in declaration order.
    declared: Vec<ComponentId>,
    metadata: HashMap<ComponentId, ComponentMetadata>,
    dependencies: HashMap<ComponentId, Vec<ComponentId>>,
    loaded: Vec<ComponentId>,
    running: HashSet<ComponentId>,
    failures: HashMap<RegistryCall, String>,
    calls: Vec<RegistryCall>,
}

/// Registry that keeps every component in memory.
///
/// Components must be declared before they can be loaded, and loaded before
/// they can be started. Failures can be injected per request with
/// [`fail_on`](Self::fail_on), and every request is recorded for later
/// inspection.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: Mutex<State>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declares a component and its direct dependencies.
    pub fn declare(&self, name: &str, dependencies: &[&str]) -> &Self {
        let id = ComponentId::from(name);
        let mut state = self.state();
        if !state.declared.contains(&id) {
            state.declared.push(id.clone());
        }
        state
            .metadata
            .insert(id.clone(), ComponentMetadata::new(name, "0.1.0"));
        state.dependencies.insert(
            id,
            dependencies.iter().copied().map(ComponentId::from).collect(),
        );
        self
    }

    /// Marks a declared component as already loaded.
    pub fn preload(&self, name: &str) -> &Self {
        let id = ComponentId::from(name);
        let mut state = self.state();
        if !state.loaded.contains(&id) {
            state.loaded.push(id);
        }
        self
    }

    /// Marks a loaded component as already running.
    pub fn prestart(&self, name: &str) -> &Self {
        self.preload(name);
        self.state().running.insert(ComponentId::from(name));
        self
    }

    /// Makes the given request fail with `message`.
    pub fn fail_on(&self, call: RegistryCall, message: &str) -> &Self {
        self.state().failures.insert(call, message.to_owned());
        self
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) -> &Self {
        self.state().failures.clear();
        self
    }

    /// Returns every request received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RegistryCall> {
        self.state().calls.clone()
    }

    /// Returns how many times `call` was received.
    #[must_use]
    pub fn count(&self, call: &RegistryCall) -> usize {
        self.state().calls.iter().filter(|c| *c == call).count()
    }

    /// Returns whether `name` is loaded.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.state().loaded.iter().any(|c| c.as_str() == name)
    }

    /// Returns whether `name` is running.
    #[must_use]
    pub fn is_running(&self, name: &str) -> bool {
        self.state().running.contains(name)
    }

    fn record(state: &mut State, call: RegistryCall) -> Result<(), String> {
        state.calls.push(call.clone());
        state.failures.get(&call).map_or(Ok(()), |message| Err(message.clone()))
    }
}

impl ComponentRegistry for InMemoryRegistry {
    fn declared_dependencies(&self, component: &ComponentId) -> Vec<ComponentId> {
        self.state()
            .dependencies
            .get(component)
            .cloned()
            .unwrap_or_default()
    }

    fn load(&self, component: &ComponentId) -> Result<(), RegistryError> {
        let mut state = self.state();
        Self::record(&mut state, RegistryCall::Load(component.clone()))
            .map_err(|message| RegistryError::failed(component.clone(), message))?;
        if state.loaded.contains(component) {
            return Err(RegistryError::AlreadyLoaded {
                component: component.clone(),
            });
        }
        if !state.declared.contains(component) {
            return Err(RegistryError::failed(
                component.clone(),
                "component is not declared",
            ));
        }
        state.loaded.push(component.clone());
        Ok(())
    }

    fn start(&self, component: &ComponentId) -> Result<(), RegistryError> {
        let mut state = self.state();
        Self::record(&mut state, RegistryCall::Start(component.clone()))
            .map_err(|message| RegistryError::failed(component.clone(), message))?;
        if state.running.contains(component) {
            return Err(RegistryError::AlreadyStarted {
                component: component.clone(),
            });
        }
        if !state.loaded.contains(component) {
            return Err(RegistryError::failed(
                component.clone(),
                "component is not loaded",
            ));
        }
        state.running.insert(component.clone());
        Ok(())
    }

    fn stop(&self, component: &ComponentId) -> Result<(), RegistryError> {
        let mut state = self.state();
        Self::record(&mut state, RegistryCall::Stop(component.clone()))
            .map_err(|message| RegistryError::failed(component.clone(), message))?;
        if !state.running.remove(component) {
            return Err(RegistryError::NotStarted {
                component: component.clone(),
            });
        }
        Ok(())
    }

    fn running(&self) -> HashSet<ComponentId> {
        self.state().running.clone()
    }

    fn loaded(&self) -> Vec<(ComponentId, ComponentMetadata)> {
        let state = self.state();
        state
            .loaded
            .iter()
            .map(|id| {
                let metadata = state.metadata.get(id).cloned().unwrap_or_default();
                (id.clone(), metadata)
            })
            .collect()
    }
}
