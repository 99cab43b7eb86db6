//! Component lifecycle orchestration for Conductor.
//!
//! The `conductor` crate drives an external component registry. Given a set
//! of named components and their declared dependencies it loads transitive
//! dependency closures, computes start and stop orders, starts or stops
//! components with rollback on partial failure, and works out which
//! dependencies a component owns outright.
//!
//! # Architecture
//!
//! The registry is reached only through the [`ComponentRegistry`] trait. Each
//! operation asks a [`DependencyResolver`] for declared dependencies, builds
//! a fresh [`DependencyGraph`] from the loaded components and drops it when
//! it returns. The [`Orchestrator`] applies one lifecycle action to an ordered
//! list and reports every transition to a [`LifecycleReporter`].
//! [`Conductor`] ties these together.
//!
//! # Example
//!
//! ```rust
//! use std::collections::{HashMap, HashSet};
//! use std::sync::Mutex;
//!
//! use conductor::{
//!     ComponentId, ComponentMetadata, ComponentRegistry, Conductor, RegistryError,
//! };
//!
//! #[derive(Default)]
//! struct Services {
//!     running: Mutex<HashSet<ComponentId>>,
//! }
//!
//! impl ComponentRegistry for Services {
//!     fn declared_dependencies(&self, component: &ComponentId) -> Vec<ComponentId> {
//!         let table = HashMap::from([("web", vec!["db"]), ("db", vec![])]);
//!         table
//!             .get(component.as_str())
//!             .map(|deps| deps.iter().copied().map(ComponentId::from).collect())
//!             .unwrap_or_default()
//!     }
//!     fn load(&self, _component: &ComponentId) -> Result<(), RegistryError> {
//!         Ok(())
//!     }
//!     fn start(&self, component: &ComponentId) -> Result<(), RegistryError> {
//!         self.running.lock().unwrap().insert(component.clone());
//!         Ok(())
//!     }
//!     fn stop(&self, component: &ComponentId) -> Result<(), RegistryError> {
//!         self.running.lock().unwrap().remove(component);
//!         Ok(())
//!     }
//!     fn running(&self) -> HashSet<ComponentId> {
//!         self.running.lock().unwrap().clone()
//!     }
//!     fn loaded(&self) -> Vec<(ComponentId, ComponentMetadata)> {
//!         ["web", "db"]
//!             .into_iter()
//!             .map(|name| (ComponentId::from(name), ComponentMetadata::default()))
//!             .collect()
//!     }
//! }
//!
//! let conductor = Conductor::new(Services::default());
//! let report = conductor
//!     .start_all(&[ComponentId::from("web")])
//!     .expect("start succeeds");
//! assert_eq!(
//!     report.succeeded(),
//!     &[ComponentId::from("db"), ComponentId::from("web")]
//! );
//! ```

pub mod error;
mod facade;
pub mod loader;
pub mod orchestrator;
pub mod registry;
pub mod reporter;
pub mod resolver;
pub mod telemetry;
pub mod wait;

#[cfg(test)]
mod tests;

pub use self::facade::Conductor;
pub use self::error::{
    ConductorError, LifecycleError, LoadError, RegistryError, RegistryErrorKind, WaitError,
};
pub use self::orchestrator::{
    ComponentState, IterationOrder, OrchestrationReport, Orchestrator, RunState,
};
pub use self::registry::{ComponentMetadata, ComponentRegistry};
#[cfg(any(test, feature = "test-support"))]
pub use self::registry::{InMemoryRegistry, RegistryCall};
pub use self::reporter::{LifecycleReporter, StructuredLifecycleReporter};
pub use self::resolver::DependencyResolver;
pub use self::wait::{WaitPolicy, wait_for};
pub use conductor_config::{ConductorConfig, ConfigError, LogFormat};
pub use conductor_graph::{
    BuildMode, ComponentId, Dependency, DependencyGraph, EdgeDirection, GraphError,
};
