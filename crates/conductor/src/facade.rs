//! The orchestration facade.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use conductor_config::ConductorConfig;
use conductor_graph::{
    BuildMode, ComponentId, Dependency, DependencyGraph, EdgeDirection, GraphError, build,
    build_permissive,
};
use tracing::info;

use crate::error::{
    ConductorError, LifecycleError, LoadError, RegistryError, RegistryErrorKind, WaitError,
};
use crate::loader;
use crate::orchestrator::{
    IterationOrder, OrchestrationReport, Orchestrator, fail_start, fail_stop,
};
use crate::registry::{ComponentMetadata, ComponentRegistry};
use crate::reporter::{LifecycleReporter, StructuredLifecycleReporter};
use crate::resolver::DependencyResolver;
use crate::wait::{self, WaitPolicy};

/// Orchestrates the lifecycle of the components held by a registry.
///
/// Every operation builds what it needs (resolver, graph) from the
/// registry's current state and drops it before returning.
pub struct Conductor<R> {
    registry: R,
    config: ConductorConfig,
    reporter: Arc<dyn LifecycleReporter>,
}

impl<R: std::fmt::Debug> std::fmt::Debug for Conductor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conductor")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R> Conductor<R>
where
    R: ComponentRegistry,
{
    /// Creates a conductor with the default configuration.
    #[must_use]
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            config: ConductorConfig::default(),
            reporter: Arc::new(StructuredLifecycleReporter::new()),
        }
    }

    /// Creates a conductor with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConductorError::Config`] when `config` fails validation.
    pub fn with_config(registry: R, config: ConductorConfig) -> Result<Self, ConductorError> {
        config.validate()?;
        Ok(Self {
            registry,
            config,
            reporter: Arc::new(StructuredLifecycleReporter::new()),
        })
    }

    /// Replaces the reporter that receives lifecycle transitions.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn LifecycleReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the underlying registry.
    #[must_use]
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ConductorConfig {
        &self.config
    }

    fn resolver(&self) -> DependencyResolver<'_, R> {
        if self.config.memoize_dependencies() {
            DependencyResolver::memoized(&self.registry)
        } else {
            DependencyResolver::new(&self.registry)
        }
    }

    fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator::new(&*self.reporter)
    }

    /// Returns the direct dependencies declared by `component`.
    #[must_use]
    pub fn dependencies(&self, component: &ComponentId) -> Vec<ComponentId> {
        self.registry.declared_dependencies(component)
    }

    /// Loads `requested` together with its transitive dependencies.
    ///
    /// Returns the closure in discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] for the first component that fails to load.
    pub fn load_all(&self, requested: &[ComponentId]) -> Result<Vec<ComponentId>, LoadError> {
        loader::load_all(&self.resolver(), requested)
    }

    /// Builds a graph of every loaded component and its declared dependencies.
    ///
    /// Declared dependencies that are not loaded still appear as vertices.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] in [`BuildMode::Acyclic`] when the
    /// declared dependencies are cyclic.
    pub fn dependency_graph(
        &self,
        direction: EdgeDirection,
        mode: BuildMode,
    ) -> Result<DependencyGraph, GraphError> {
        let (vertices, dependencies) = self.loaded_relation();
        build(direction, mode, vertices, dependencies)
    }

    fn isolation_graph(&self) -> DependencyGraph {
        let (vertices, dependencies) = self.loaded_relation();
        build_permissive(EdgeDirection::Isolation, vertices, dependencies)
    }

    fn loaded_relation(&self) -> (Vec<ComponentId>, Vec<Dependency>) {
        let resolver = self.resolver();
        let vertices: Vec<ComponentId> = self
            .registry
            .loaded()
            .into_iter()
            .map(|(component, _)| component)
            .collect();
        let dependencies = vertices
            .iter()
            .flat_map(|dependent| {
                resolver
                    .dependencies(dependent)
                    .into_iter()
                    .map(move |dependency| Dependency::new(dependent.clone(), dependency))
            })
            .collect();
        (vertices, dependencies)
    }

    /// Orders the loaded components so dependencies come first.
    ///
    /// With `strip_unreachable` set, only `roots` and the components that
    /// (transitively) depend on them are kept.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] when the declared dependencies are
    /// cyclic.
    pub fn order(
        &self,
        roots: &[ComponentId],
        strip_unreachable: bool,
    ) -> Result<Vec<ComponentId>, GraphError> {
        self.dependency_graph(EdgeDirection::DependencyOrder, BuildMode::Acyclic)?
            .order(roots, strip_unreachable)
    }

    /// Returns the direct dependencies that only `root` depends on.
    ///
    /// Cyclic declarations are tolerated.
    #[must_use]
    pub fn isolated_dependencies(&self, root: &ComponentId) -> BTreeSet<ComponentId> {
        self.isolation_graph().isolated_dependencies(root)
    }

    /// Returns every transitive dependency owned by `root` alone.
    ///
    /// Cyclic declarations are tolerated.
    #[must_use]
    pub fn isolated_closure(&self, root: &ComponentId) -> BTreeSet<ComponentId> {
        self.isolation_graph().isolated_closure(root)
    }

    /// Applies `action` to `apps` with rollback, see [`Orchestrator::manage`].
    ///
    /// # Errors
    ///
    /// Returns whatever error `on_fatal` returns.
    pub fn manage<A, C, F>(
        &self,
        apps: &[ComponentId],
        order: IterationOrder,
        action: A,
        compensate: C,
        skip: RegistryErrorKind,
        on_fatal: F,
    ) -> Result<OrchestrationReport, LifecycleError>
    where
        A: FnMut(&ComponentId) -> Result<(), RegistryError>,
        C: FnMut(&ComponentId) -> Result<(), RegistryError>,
        F: FnMut(&ComponentId, RegistryError) -> Result<(), LifecycleError>,
    {
        self.orchestrator()
            .manage(apps, order, action, compensate, skip, on_fatal)
    }

    /// Starts `apps` first to last, stopping them again on failure.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::CannotStart`] after rolling back.
    pub fn start(&self, apps: &[ComponentId]) -> Result<OrchestrationReport, LifecycleError> {
        self.start_with(apps, fail_start)
    }

    /// Starts `apps` with a custom fatal handler.
    ///
    /// # Errors
    ///
    /// Returns whatever error `on_fatal` returns.
    pub fn start_with<F>(
        &self,
        apps: &[ComponentId],
        on_fatal: F,
    ) -> Result<OrchestrationReport, LifecycleError>
    where
        F: FnMut(&ComponentId, RegistryError) -> Result<(), LifecycleError>,
    {
        info!(
            target: "conductor::lifecycle",
            event = "start_requested",
            components = apps.len(),
            "starting components"
        );
        self.manage(
            apps,
            IterationOrder::Forward,
            |c| self.registry.start(c),
            |c| self.registry.stop(c),
            RegistryErrorKind::AlreadyStarted,
            on_fatal,
        )
    }

    /// Stops `apps` last to first, restarting them again on failure.
    ///
    /// `apps` is expected in start order.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::CannotStop`] after rolling back.
    pub fn stop(&self, apps: &[ComponentId]) -> Result<OrchestrationReport, LifecycleError> {
        self.stop_with(apps, fail_stop)
    }

    /// Stops `apps` with a custom fatal handler.
    ///
    /// # Errors
    ///
    /// Returns whatever error `on_fatal` returns.
    pub fn stop_with<F>(
        &self,
        apps: &[ComponentId],
        on_fatal: F,
    ) -> Result<OrchestrationReport, LifecycleError>
    where
        F: FnMut(&ComponentId, RegistryError) -> Result<(), LifecycleError>,
    {
        info!(
            target: "conductor::lifecycle",
            event = "stop_requested",
            components = apps.len(),
            "stopping components"
        );
        self.manage(
            apps,
            IterationOrder::Reverse,
            |c| self.registry.stop(c),
            |c| self.registry.start(c),
            RegistryErrorKind::NotStarted,
            on_fatal,
        )
    }

    /// Loads and starts `roots` with every transitive dependency.
    ///
    /// # Errors
    ///
    /// Returns [`ConductorError`] when loading, ordering or starting fails.
    pub fn start_all(&self, roots: &[ComponentId]) -> Result<OrchestrationReport, ConductorError> {
        let closure: HashSet<ComponentId> = self.load_all(roots)?.into_iter().collect();
        let apps: Vec<ComponentId> = self
            .order(roots, false)?
            .into_iter()
            .filter(|c| closure.contains(c))
            .collect();
        Ok(self.start(&apps)?)
    }

    /// Stops `roots` and every component that depends on them.
    ///
    /// Dependents are stopped before their dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`ConductorError`] when ordering or stopping fails.
    pub fn stop_all(&self, roots: &[ComponentId]) -> Result<OrchestrationReport, ConductorError> {
        let apps = self.order(roots, true)?;
        Ok(self.stop(&apps)?)
    }

    /// Stops `root` together with the dependencies it owns outright.
    ///
    /// # Errors
    ///
    /// Returns [`ConductorError`] when ordering or stopping fails.
    pub fn stop_isolated(&self, root: &ComponentId) -> Result<OrchestrationReport, ConductorError> {
        let mut owned = self.isolated_closure(root);
        owned.insert(root.clone());
        let apps: Vec<ComponentId> = self
            .order(&[], false)?
            .into_iter()
            .filter(|c| owned.contains(c))
            .collect();
        Ok(self.stop(&apps)?)
    }

    /// Blocks until `component` is running, using the configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Timeout`] when a configured timeout expires.
    pub fn wait_for(&self, component: &ComponentId) -> Result<(), WaitError> {
        wait::wait_for(
            &self.registry,
            component,
            &WaitPolicy::from_config(&self.config),
            None,
        )
    }

    /// Blocks until `component` is running or `cancel` is set.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Cancelled`] once `cancel` is set, or
    /// [`WaitError::Timeout`] when a configured timeout expires.
    pub fn wait_for_cancellable(
        &self,
        component: &ComponentId,
        cancel: &AtomicBool,
    ) -> Result<(), WaitError> {
        wait::wait_for(
            &self.registry,
            component,
            &WaitPolicy::from_config(&self.config),
            Some(cancel),
        )
    }

    /// Returns the components currently running.
    #[must_use]
    pub fn running(&self) -> HashSet<ComponentId> {
        self.registry.running()
    }

    /// Returns the loaded components with their metadata.
    #[must_use]
    pub fn loaded(&self) -> Vec<(ComponentId, ComponentMetadata)> {
        self.registry.loaded()
    }
}
