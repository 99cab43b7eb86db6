//! Crate-level test doubles and end-to-end tests.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

use mockall::mock;
use rstest::{fixture, rstest};

use crate::error::{ConductorError, LifecycleError, RegistryError};
use crate::orchestrator::{ComponentState, RunState};
use crate::registry::{ComponentMetadata, ComponentRegistry, InMemoryRegistry, RegistryCall};
use crate::reporter::LifecycleReporter;
use crate::{ComponentId, ConductorConfig, Conductor, WaitError};


mock! {
    pub Registry {}

    impl ComponentRegistry for Registry {
        fn declared_dependencies(&self, component: &ComponentId) -> Vec<ComponentId>;
        fn load(&self, component: &ComponentId) -> Result<(), RegistryError>;
        fn start(&self, component: &ComponentId) -> Result<(), RegistryError>;
        fn stop(&self, component: &ComponentId) -> Result<(), RegistryError>;
        fn running(&self) -> HashSet<ComponentId>;
        fn loaded(&self) -> Vec<(ComponentId, ComponentMetadata)>;
    }
}

/// A transition captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Component(ComponentId, ComponentState),
    Run(RunState),
    Compensated(ComponentId),
    CompensationFailed(ComponentId),
}

/// Reporter that keeps every transition in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingReporter {
    fn push(&self, event: Recorded) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn run_states(&self) -> Vec<RunState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Run(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn component_states(&self, component: &ComponentId) -> Vec<ComponentState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Component(c, state) if &c == component => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl LifecycleReporter for RecordingReporter {
    fn component_state_changed(&self, component: &ComponentId, state: ComponentState) {
        self.push(Recorded::Component(component.clone(), state));
    }

    fn run_state_changed(&self, state: RunState) {
        self.push(Recorded::Run(state));
    }

    fn component_compensated(&self, component: &ComponentId) {
        self.push(Recorded::Compensated(component.clone()));
    }

    fn compensation_failed(&self, component: &ComponentId, _error: &RegistryError) {
        self.push(Recorded::CompensationFailed(component.clone()));
    }
}

fn id(name: &str) -> ComponentId {
    ComponentId::from(name)
}

fn ids(names: &[&str]) -> Vec<ComponentId> {
    names.iter().copied().map(id).collect()
}

fn names(components: &[ComponentId]) -> Vec<&str> {
    components.iter().map(ComponentId::as_str).collect()
}

/// `web -> {api, static}`, `api -> {db, log}`, `db -> log`, `static`,
/// `metrics -> log`.
#[fixture]
fn stack() -> Arc<InMemoryRegistry> {
    let registry = Arc::new(InMemoryRegistry::new());
    registry
        .declare("web", &["api", "static"])
        .declare("api", &["db", "log"])
        .declare("db", &["log"])
        .declare("static", &[])
        .declare("log", &[])
        .declare("metrics", &["log"]);
    registry
}

#[rstest]
fn start_all_loads_and_starts_the_closure_in_dependency_order(stack: Arc<InMemoryRegistry>) {
    let conductor = Conductor::new(Arc::clone(&stack));
    let report = conductor.start_all(&ids(&["web"])).expect("start web");

    let started = report.succeeded();
    assert_eq!(started.len(), 5);
    let pos = |name: &str| {
        started
            .iter()
            .position(|c| c.as_str() == name)
            .unwrap_or_else(|| panic!("{name} not started"))
    };
    assert!(pos("log") < pos("db"));
    assert!(pos("db") < pos("api"));
    assert!(pos("api") < pos("web"));
    assert!(pos("static") < pos("web"));
    assert!(!stack.is_loaded("metrics"));
    assert!(!stack.is_running("metrics"));
}

#[rstest]
fn start_all_skips_components_already_running(stack: Arc<InMemoryRegistry>) {
    let conductor = Conductor::new(Arc::clone(&stack));
    conductor.start_all(&ids(&["db"])).expect("start db");

    let report = conductor.start_all(&ids(&["web"])).expect("start web");
    assert_eq!(names(report.skipped()), vec!["log", "db"]);
    assert_eq!(stack.count(&RegistryCall::Start(id("db"))), 2);
}

#[rstest]
fn start_failure_stops_what_was_started(stack: Arc<InMemoryRegistry>) {
    stack.fail_on(RegistryCall::Start(id("api")), "bind failed");
    let reporter = Arc::new(RecordingReporter::default());
    let conductor = Conductor::new(Arc::clone(&stack)).with_reporter(reporter.clone());

    let err = conductor.start_all(&ids(&["web"])).expect_err("api fails");
    match err {
        ConductorError::Lifecycle(LifecycleError::CannotStart { component, .. }) => {
            assert_eq!(component, id("api"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(stack.running().is_empty(), "everything is rolled back");
    assert_eq!(stack.count(&RegistryCall::Start(id("web"))), 0);
    assert_eq!(reporter.run_states().last(), Some(&RunState::Aborted));
}

#[rstest]
fn stop_all_stops_dependents_first(stack: Arc<InMemoryRegistry>) {
    let conductor = Conductor::new(Arc::clone(&stack));
    conductor.start_all(&ids(&["web", "metrics"])).expect("start");

    let report = conductor.stop_all(&ids(&["db"])).expect("stop db");
    assert_eq!(names(report.succeeded()), vec!["web", "api", "db"]);
    assert!(stack.is_running("log"));
    assert!(stack.is_running("static"));
    assert!(stack.is_running("metrics"));
}

#[rstest]
fn stop_failure_restarts_what_was_stopped(stack: Arc<InMemoryRegistry>) {
    let conductor = Conductor::new(Arc::clone(&stack));
    conductor.start_all(&ids(&["web"])).expect("start");
    stack.fail_on(RegistryCall::Stop(id("db")), "busy");

    let err = conductor.stop_all(&ids(&["db"])).expect_err("db refuses");
    assert!(matches!(
        err,
        ConductorError::Lifecycle(LifecycleError::CannotStop { .. })
    ));
    assert!(stack.is_running("web"));
    assert!(stack.is_running("api"));
}

#[rstest]
fn stop_isolated_leaves_shared_dependencies_running(stack: Arc<InMemoryRegistry>) {
    let conductor = Conductor::new(Arc::clone(&stack));
    conductor.start_all(&ids(&["web", "metrics"])).expect("start");

    let owned = conductor.isolated_closure(&id("web"));
    assert_eq!(
        owned.iter().map(ComponentId::as_str).collect::<Vec<_>>(),
        vec!["api", "db", "static"]
    );

    let report = conductor.stop_isolated(&id("web")).expect("stop web");
    assert_eq!(report.succeeded().first(), Some(&id("web")));
    assert!(stack.is_running("log"));
    assert!(stack.is_running("metrics"));
    assert!(!stack.is_running("db"));
}

#[rstest]
fn isolation_excludes_shared_dependencies(stack: Arc<InMemoryRegistry>) {
    let conductor = Conductor::new(Arc::clone(&stack));
    conductor.load_all(&ids(&["web", "metrics"])).expect("load");

    let direct = conductor.isolated_dependencies(&id("api"));
    assert_eq!(direct.into_iter().collect::<Vec<_>>(), ids(&["db"]));
}

#[test]
fn isolation_queries_tolerate_cyclic_declarations() {
    let registry = InMemoryRegistry::new();
    registry
        .declare("root", &["a"])
        .declare("a", &[])
        .declare("x", &["y"])
        .declare("y", &["x"]);
    let conductor = Conductor::new(registry);
    conductor.load_all(&ids(&["root", "x"])).expect("load");

    assert!(conductor.order(&[], false).is_err(), "ordering rejects the cycle");
    assert_eq!(
        conductor.isolated_dependencies(&id("root")).into_iter().collect::<Vec<_>>(),
        ids(&["a"])
    );
    assert_eq!(
        conductor.isolated_closure(&id("root")).into_iter().collect::<Vec<_>>(),
        ids(&["a"])
    );
}

#[rstest]
fn order_covers_every_loaded_component(stack: Arc<InMemoryRegistry>) {
    let conductor = Conductor::new(Arc::clone(&stack));
    conductor.load_all(&ids(&["web", "metrics"])).expect("load");

    let all = conductor.order(&ids(&["web"]), false).expect("order");
    assert_eq!(all.len(), 6);
    let reachable = conductor.order(&ids(&["log"]), true).expect("order");
    assert_eq!(reachable.first(), Some(&id("log")));
    assert_eq!(reachable.len(), 5, "static does not depend on log");
    let leaf = conductor.order(&ids(&["web"]), true).expect("order");
    assert_eq!(leaf, ids(&["web"]));
}

#[test]
fn cyclic_declarations_fail_ordering() {
    let registry = InMemoryRegistry::new();
    registry.declare("a", &["b"]).declare("b", &["a"]);
    let conductor = Conductor::new(registry);

    conductor.load_all(&ids(&["a"])).expect("loading ignores cycles");
    let err = conductor.start_all(&ids(&["a"])).expect_err("cycle");
    let mut vertices = match err {
        ConductorError::Graph(graph) => graph.vertices().to_vec(),
        other => panic!("unexpected error {other:?}"),
    };
    vertices.sort();
    assert_eq!(vertices, ids(&["a", "b"]));
}

#[rstest]
fn memoisation_can_be_disabled(stack: Arc<InMemoryRegistry>) {
    let config = ConductorConfig {
        memoize_dependencies: false,
        ..ConductorConfig::default()
    };
    let conductor = Conductor::with_config(Arc::clone(&stack), config).expect("valid config");
    assert!(!conductor.config().memoize_dependencies());
    conductor.start_all(&ids(&["api"])).expect("start api");
    assert!(stack.is_running("api"));
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = ConductorConfig {
        poll_interval_ms: 0,
        ..ConductorConfig::default()
    };
    let err = Conductor::with_config(InMemoryRegistry::new(), config).expect_err("zero interval");
    assert!(matches!(err, ConductorError::Config(_)));
}

#[test]
fn facade_waits_with_configured_timeout() {
    let config = ConductorConfig {
        poll_interval_ms: 5,
        wait_timeout_ms: Some(20),
        ..ConductorConfig::default()
    };
    let conductor = Conductor::with_config(InMemoryRegistry::new(), config).expect("valid config");
    let err = conductor.wait_for(&id("db")).expect_err("never starts");
    assert!(matches!(err, WaitError::Timeout { .. }));

    let cancel = AtomicBool::new(true);
    let cancelled = conductor
        .wait_for_cancellable(&id("db"), &cancel)
        .expect_err("cancelled");
    assert!(matches!(cancelled, WaitError::Cancelled { .. }));
}

#[test]
fn facade_passes_registry_queries_through() {
    let mut registry = MockRegistry::new();
    registry
        .expect_running()
        .returning(|| HashSet::from([ComponentId::from("db")]));
    registry
        .expect_loaded()
        .returning(|| vec![(ComponentId::from("db"), ComponentMetadata::new("db", "1.0"))]);
    registry
        .expect_declared_dependencies()
        .returning(|_| vec![ComponentId::from("log")]);

    let conductor = Conductor::new(registry);
    assert!(conductor.running().contains(&id("db")));
    assert_eq!(conductor.loaded().len(), 1);
    assert_eq!(conductor.dependencies(&id("db")), ids(&["log"]));
}
