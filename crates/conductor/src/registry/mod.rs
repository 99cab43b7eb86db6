//! The component registry seam.
//!
//! The orchestrator never loads, starts or stops anything itself. It drives
//! an external registry through [`ComponentRegistry`], which reports declared
//! dependencies and carries out lifecycle requests. Failures that merely
//! restate the current state (`AlreadyLoaded`, `AlreadyStarted`,
//! `NotStarted`) must be reported with their dedicated
//! [`RegistryError`] variants so callers can treat them as no-ops.

use std::collections::HashSet;
use std::sync::Arc;

use conductor_graph::ComponentId;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

#[cfg(any(test, feature = "test-support"))]
mod memory;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{InMemoryRegistry, RegistryCall};

/// Descriptive metadata reported for a loaded component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    description: String,
    version: String,
}

impl ComponentMetadata {
    /// Creates metadata from a description and version string.
    #[must_use]
    pub fn new(description: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            version: version.into(),
        }
    }

    /// Returns the component description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the component version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// External registry able to load, start and stop components.
///
/// Calls are synchronous. Implementations own their own locking; the
/// orchestrator only ever issues one request at a time.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
///
/// use conductor::{ComponentId, ComponentMetadata, ComponentRegistry, RegistryError};
///
/// struct Static;
///
/// impl ComponentRegistry for Static {
///     fn declared_dependencies(&self, _component: &ComponentId) -> Vec<ComponentId> {
///         Vec::new()
///     }
///     fn load(&self, _component: &ComponentId) -> Result<(), RegistryError> {
///         Ok(())
///     }
///     fn start(&self, _component: &ComponentId) -> Result<(), RegistryError> {
///         Ok(())
///     }
///     fn stop(&self, _component: &ComponentId) -> Result<(), RegistryError> {
///         Ok(())
///     }
///     fn running(&self) -> HashSet<ComponentId> {
///         HashSet::new()
///     }
///     fn loaded(&self) -> Vec<(ComponentId, ComponentMetadata)> {
///         Vec::new()
///     }
/// }
/// ```
pub trait ComponentRegistry {
    /// Returns the direct dependencies declared by `component`.
    ///
    /// Unknown components and components without dependencies both yield an
    /// empty list.
    fn declared_dependencies(&self, component: &ComponentId) -> Vec<ComponentId>;

    /// Loads `component`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyLoaded`] when the component was loaded
    /// before, or another [`RegistryError`] when loading fails.
    fn load(&self, component: &ComponentId) -> Result<(), RegistryError>;

    /// Starts `component`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyStarted`] when the component is
    /// running, or another [`RegistryError`] when starting fails.
    fn start(&self, component: &ComponentId) -> Result<(), RegistryError>;

    /// Stops `component`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotStarted`] when the component is not
    /// running, or another [`RegistryError`] when stopping fails.
    fn stop(&self, component: &ComponentId) -> Result<(), RegistryError>;

    /// Returns the components currently running.
    fn running(&self) -> HashSet<ComponentId>;

    /// Returns the loaded components with their metadata.
    fn loaded(&self) -> Vec<(ComponentId, ComponentMetadata)>;
}

impl<T> ComponentRegistry for &T
where
    T: ComponentRegistry + ?Sized,
{
    fn declared_dependencies(&self, component: &ComponentId) -> Vec<ComponentId> {
        (**self).declared_dependencies(component)
    }

    fn load(&self, component: &ComponentId) -> Result<(), RegistryError> {
        (**self).load(component)
    }

    fn start(&self, component: &ComponentId) -> Result<(), RegistryError> {
        (**self).start(component)
    }

    fn stop(&self, component: &ComponentId) -> Result<(), RegistryError> {
        (**self).stop(component)
    }

    fn running(&self) -> HashSet<ComponentId> {
        (**self).running()
    }

    fn loaded(&self) -> Vec<(ComponentId, ComponentMetadata)> {
        (**self).loaded()
    }
}

impl<T> ComponentRegistry for Arc<T>
where
    T: ComponentRegistry + ?Sized,
{
    fn declared_dependencies(&self, component: &ComponentId) -> Vec<ComponentId> {
        (**self).declared_dependencies(component)
    }

    fn load(&self, component: &ComponentId) -> Result<(), RegistryError> {
        (**self).load(component)
    }

    fn start(&self, component: &ComponentId) -> Result<(), RegistryError> {
        (**self).start(component)
    }

    fn stop(&self, component: &ComponentId) -> Result<(), RegistryError> {
        (**self).stop(component)
    }

    fn running(&self) -> HashSet<ComponentId> {
        (**self).running()
    }

    fn loaded(&self) -> Vec<(ComponentId, ComponentMetadata)> {
        (**self).loaded()
    }
}
