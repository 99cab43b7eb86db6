//! Ordered start and stop sequences with rollback.
//!
//! [`Orchestrator::manage`] applies one lifecycle action to an ordered list of
//! components. Failures of the operation's skippable kind are treated as
//! idempotent no-ops. Any other failure undoes every component processed so
//! far in the current call, most recent first, and then hands the failure to
//! the fatal handler.

use conductor_graph::ComponentId;
use strum::Display;

use crate::error::{LifecycleError, RegistryError, RegistryErrorKind};
use crate::reporter::LifecycleReporter;

/// Direction in which an ordered component list is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IterationOrder {
    /// First to last.
    Forward,
    /// Last to first.
    Reverse,
}

/// Per-component progress within one orchestration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ComponentState {
    /// Not yet processed.
    Pending,
    /// The action is being applied.
    Acting,
    /// The action succeeded.
    Succeeded,
    /// The action reported the component already in the target state.
    SkippedIdempotent,
    /// The action failed fatally.
    Failed,
}

/// State of an orchestration call as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    /// Components are being processed.
    Orchestrating,
    /// A fatal failure is being compensated.
    RollingBack,
    /// Every component was processed.
    Completed,
    /// The fatal handler ended the call.
    Aborted,
}

/// Outcome of an orchestration call that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestrationReport {
    succeeded: Vec<ComponentId>,
    skipped: Vec<ComponentId>,
    rolled_back: Vec<ComponentId>,
    failed: Vec<ComponentId>,
}

impl OrchestrationReport {
    /// Components whose action succeeded, in processing order.
    ///
    /// Includes components that were later rolled back.
    #[must_use]
    pub fn succeeded(&self) -> &[ComponentId] {
        &self.succeeded
    }

    /// Components that were already in the target state.
    #[must_use]
    pub fn skipped(&self) -> &[ComponentId] {
        &self.skipped
    }

    /// Components whose action was undone, in compensation order.
    #[must_use]
    pub fn rolled_back(&self) -> &[ComponentId] {
        &self.rolled_back
    }

    /// Components whose failure a fatal handler chose to tolerate.
    #[must_use]
    pub fn failed(&self) -> &[ComponentId] {
        &self.failed
    }

    /// Components that are in the target state because of this call.
    #[must_use]
    pub fn effective(&self) -> Vec<ComponentId> {
        self.succeeded
            .iter()
            .filter(|c| !self.rolled_back.contains(c))
            .cloned()
            .collect()
    }
}

/// Drives a lifecycle action over an ordered component list.
#[derive(Clone, Copy)]
pub struct Orchestrator<'a> {
    reporter: &'a dyn LifecycleReporter,
}

impl std::fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator that surfaces transitions to `reporter`.
    #[must_use]
    pub const fn new(reporter: &'a dyn LifecycleReporter) -> Self {
        Self { reporter }
    }

    /// Applies `action` to every component of `apps` in `order`.
    ///
    /// Successful components are pushed on a progress stack. A failure whose
    /// kind equals `skip` leaves the component untouched and off the stack.
    /// Any other failure runs `compensate` over the stack in reverse,
    /// clears it, and passes the failure to `on_fatal`. Compensation failures
    /// are reported and do not stop the rollback. When `on_fatal` returns
    /// `Ok(())` processing continues with the next component.
    ///
    /// # Errors
    ///
    /// Returns whatever error `on_fatal` returns, after the rollback.
    pub fn manage<A, C, F>(
        &self,
        apps: &[ComponentId],
        order: IterationOrder,
        mut action: A,
        mut compensate: C,
        skip: RegistryErrorKind,
        mut on_fatal: F,
    ) -> Result<OrchestrationReport, LifecycleError>
    where
        A: FnMut(&ComponentId) -> Result<(), RegistryError>,
        C: FnMut(&ComponentId) -> Result<(), RegistryError>,
        F: FnMut(&ComponentId, RegistryError) -> Result<(), LifecycleError>,
    {
        let sequence: Vec<&ComponentId> = match order {
            IterationOrder::Forward => apps.iter().collect(),
            IterationOrder::Reverse => apps.iter().rev().collect(),
        };

        let mut report = OrchestrationReport::default();
        let mut progress: Vec<ComponentId> = Vec::new();
        self.reporter.run_state_changed(RunState::Orchestrating);
        for component in &sequence {
            self.reporter
                .component_state_changed(component, ComponentState::Pending);
        }

        for component in sequence {
            self.reporter
                .component_state_changed(component, ComponentState::Acting);
            let failure = match action(component) {
                Ok(()) => {
                    self.reporter
                        .component_state_changed(component, ComponentState::Succeeded);
                    progress.push(component.clone());
                    report.succeeded.push(component.clone());
                    continue;
                }
                Err(error) if error.kind() == skip => {
                    self.reporter
                        .component_state_changed(component, ComponentState::SkippedIdempotent);
                    report.skipped.push(component.clone());
                    continue;
                }
                Err(error) => error,
            };

            self.reporter
                .component_state_changed(component, ComponentState::Failed);
            self.reporter.run_state_changed(RunState::RollingBack);
            self.roll_back(&mut progress, &mut compensate, &mut report);

            if let Err(fatal) = on_fatal(component, failure) {
                self.reporter.run_state_changed(RunState::Aborted);
                return Err(fatal);
            }
            report.failed.push(component.clone());
            self.reporter.run_state_changed(RunState::Orchestrating);
        }

        self.reporter.run_state_changed(RunState::Completed);
        Ok(report)
    }

    fn roll_back<C>(
        &self,
        progress: &mut Vec<ComponentId>,
        compensate: &mut C,
        report: &mut OrchestrationReport,
    ) where
        C: FnMut(&ComponentId) -> Result<(), RegistryError>,
    {
        for component in progress.drain(..).rev() {
            match compensate(&component) {
                Ok(()) => {
                    self.reporter.component_compensated(&component);
                    report.rolled_back.push(component);
                }
                Err(error) => self.reporter.compensation_failed(&component, &error),
            }
        }
    }
}

/// Default fatal handler for start sequences.
///
/// # Errors
///
/// Always returns [`LifecycleError::CannotStart`].
pub fn fail_start(component: &ComponentId, source: RegistryError) -> Result<(), LifecycleError> {
    Err(LifecycleError::CannotStart {
        component: component.clone(),
        source,
    })
}

/// Default fatal handler for stop sequences.
///
/// # Errors
///
/// Always returns [`LifecycleError::CannotStop`].
pub fn fail_stop(component: &ComponentId, source: RegistryError) -> Result<(), LifecycleError> {
    Err(LifecycleError::CannotStop {
        component: component.clone(),
        source,
    })
}
