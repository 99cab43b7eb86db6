//! Domain errors raised by orchestration operations.
//!
//! All errors use `thiserror`-derived types with structured context so
//! callers can inspect the failure programmatically. Registry failures are
//! kept as the `#[source]` of the orchestration error they caused.

use std::time::Duration;

use conductor_config::ConfigError;
use conductor_graph::{ComponentId, GraphError};
use thiserror::Error;

/// Coarse classification of a [`RegistryError`].
///
/// The orchestrator compares this against the skippable kind of the
/// operation in progress to decide whether a failure is an idempotent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryErrorKind {
    /// The component was loaded before the request.
    AlreadyLoaded,
    /// The component was running before a start request.
    AlreadyStarted,
    /// The component was not running when asked to stop.
    NotStarted,
    /// Any other failure.
    Other,
}

/// Errors reported by a [`ComponentRegistry`](crate::ComponentRegistry).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The component is already loaded.
    #[error("component '{component}' is already loaded")]
    AlreadyLoaded {
        /// Component named in the request.
        component: ComponentId,
    },

    /// The component is already running.
    #[error("component '{component}' is already started")]
    AlreadyStarted {
        /// Component named in the request.
        component: ComponentId,
    },

    /// The component is not running.
    #[error("component '{component}' is not started")]
    NotStarted {
        /// Component named in the request.
        component: ComponentId,
    },

    /// The registry could not carry out the request.
    #[error("component '{component}' failed: {message}")]
    Failed {
        /// Component named in the request.
        component: ComponentId,
        /// Human-readable failure description.
        message: String,
        /// Optional underlying error reported by the registry.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RegistryError {
    /// Builds a failure without an underlying source.
    #[must_use]
    pub fn failed(component: ComponentId, message: impl Into<String>) -> Self {
        Self::Failed {
            component,
            message: message.into(),
            source: None,
        }
    }

    /// Builds a failure that wraps an underlying source.
    #[must_use]
    pub fn failed_with_source(
        component: ComponentId,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Failed {
            component,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the classification used for skip decisions.
    #[must_use]
    pub const fn kind(&self) -> RegistryErrorKind {
        match self {
            Self::AlreadyLoaded { .. } => RegistryErrorKind::AlreadyLoaded,
            Self::AlreadyStarted { .. } => RegistryErrorKind::AlreadyStarted,
            Self::NotStarted { .. } => RegistryErrorKind::NotStarted,
            Self::Failed { .. } => RegistryErrorKind::Other,
        }
    }

    /// Returns the component named in the failed request.
    #[must_use]
    pub const fn component(&self) -> &ComponentId {
        match self {
            Self::AlreadyLoaded { component }
            | Self::AlreadyStarted { component }
            | Self::NotStarted { component }
            | Self::Failed { component, .. } => component,
        }
    }
}

/// Loading a component of a dependency closure failed.
///
/// Loading stops at the first failure. Components loaded before it stay
/// loaded.
#[derive(Debug, Error)]
#[error("failed to load component '{component}': {source}")]
pub struct LoadError {
    /// Component whose load failed.
    pub component: ComponentId,
    /// Failure reported by the registry.
    #[source]
    pub source: RegistryError,
}

/// A start or stop sequence was aborted after rolling back its progress.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A component could not be started.
    #[error("cannot start component '{component}': {source}")]
    CannotStart {
        /// Component whose start failed.
        component: ComponentId,
        /// Failure reported by the registry.
        #[source]
        source: RegistryError,
    },

    /// A component could not be stopped.
    #[error("cannot stop component '{component}': {source}")]
    CannotStop {
        /// Component whose stop failed.
        component: ComponentId,
        /// Failure reported by the registry.
        #[source]
        source: RegistryError,
    },
}

impl LifecycleError {
    /// Returns the component that triggered the abort.
    #[must_use]
    pub const fn component(&self) -> &ComponentId {
        match self {
            Self::CannotStart { component, .. } | Self::CannotStop { component, .. } => component,
        }
    }
}

/// Waiting for a component to report itself running did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The component was not running before the deadline.
    #[error("component '{component}' was not running after {timeout:?}")]
    Timeout {
        /// Component being waited for.
        component: ComponentId,
        /// Configured bound on the wait.
        timeout: Duration,
    },

    /// The wait was cancelled by the caller.
    #[error("wait for component '{component}' was cancelled")]
    Cancelled {
        /// Component being waited for.
        component: ComponentId,
    },
}

/// Top-level error for the [`Conductor`](crate::Conductor) operations.
#[derive(Debug, Error)]
pub enum ConductorError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Loading a dependency closure failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A start or stop sequence was aborted.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The dependency graph could not be ordered.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Waiting for readiness failed.
    #[error(transparent)]
    Wait(#[from] WaitError),
}
