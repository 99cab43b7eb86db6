//! Structured reporting of lifecycle transitions.

use std::sync::Arc;

use conductor_graph::ComponentId;

use crate::error::RegistryError;
use crate::orchestrator::{ComponentState, RunState};

/// Observer trait used to surface orchestration transitions to telemetry
/// sinks.
pub trait LifecycleReporter: Send + Sync {
    /// Invoked whenever a component moves to a new state.
    fn component_state_changed(&self, component: &ComponentId, state: ComponentState);

    /// Invoked whenever the orchestration call moves to a new state.
    fn run_state_changed(&self, state: RunState);

    /// Invoked after a component's action was undone during rollback.
    fn component_compensated(&self, component: &ComponentId);

    /// Invoked when undoing a component's action failed during rollback.
    fn compensation_failed(&self, component: &ComponentId, error: &RegistryError);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter + ?Sized,
{
    fn component_state_changed(&self, component: &ComponentId, state: ComponentState) {
        (**self).component_state_changed(component, state);
    }

    fn run_state_changed(&self, state: RunState) {
        (**self).run_state_changed(state);
    }

    fn component_compensated(&self, component: &ComponentId) {
        (**self).component_compensated(component);
    }

    fn compensation_failed(&self, component: &ComponentId, error: &RegistryError) {
        (**self).compensation_failed(component, error);
    }
}

/// Default reporter that records lifecycle transitions using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn component_state_changed(&self, component: &ComponentId, state: ComponentState) {
        match state {
            ComponentState::Pending | ComponentState::Acting => tracing::trace!(
                target: "conductor::lifecycle",
                event = "component_state_changed",
                component = %component,
                state = %state,
                "component state changed"
            ),
            ComponentState::Succeeded | ComponentState::SkippedIdempotent => tracing::debug!(
                target: "conductor::lifecycle",
                event = "component_state_changed",
                component = %component,
                state = %state,
                "component state changed"
            ),
            ComponentState::Failed => tracing::warn!(
                target: "conductor::lifecycle",
                event = "component_failed",
                component = %component,
                "component action failed"
            ),
        }
    }

    fn run_state_changed(&self, state: RunState) {
        match state {
            RunState::Aborted => tracing::error!(
                target: "conductor::lifecycle",
                event = "run_aborted",
                state = %state,
                "orchestration aborted"
            ),
            RunState::RollingBack => tracing::warn!(
                target: "conductor::lifecycle",
                event = "run_rolling_back",
                state = %state,
                "rolling back orchestration progress"
            ),
            RunState::Orchestrating | RunState::Completed => tracing::debug!(
                target: "conductor::lifecycle",
                event = "run_state_changed",
                state = %state,
                "orchestration state changed"
            ),
        }
    }

    fn component_compensated(&self, component: &ComponentId) {
        tracing::info!(
            target: "conductor::lifecycle",
            event = "component_compensated",
            component = %component,
            "component rolled back"
        );
    }

    fn compensation_failed(&self, component: &ComponentId, error: &RegistryError) {
        tracing::error!(
            target: "conductor::lifecycle",
            event = "compensation_failed",
            component = %component,
            error = %error,
            "failed to roll back component"
        );
    }
}
