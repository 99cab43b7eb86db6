//! Polling for component readiness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use conductor_config::{ConductorConfig, DEFAULT_POLL_INTERVAL_MS};
use conductor_graph::ComponentId;
use tracing::trace;

use crate::error::WaitError;
use crate::registry::ComponentRegistry;

/// How [`wait_for`] polls the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: None,
        }
    }
}

impl WaitPolicy {
    /// Creates a policy polling every `poll_interval` without a deadline.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            timeout: None,
        }
    }

    /// Derives the policy from the configured interval and timeout.
    #[must_use]
    pub const fn from_config(config: &ConductorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            timeout: config.wait_timeout(),
        }
    }

    /// Bounds the wait by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the delay between two polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the bound on the wait, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Blocks until `component` is reported running.
///
/// Polls [`ComponentRegistry::running`] every `policy.poll_interval()`. The
/// cancellation flag, when given, is checked before each poll. Without a
/// timeout the wait is unbounded.
///
/// # Errors
///
/// Returns [`WaitError::Cancelled`] once `cancel` is set, or
/// [`WaitError::Timeout`] when the component is still not running at the
/// deadline.
pub fn wait_for<R>(
    registry: &R,
    component: &ComponentId,
    policy: &WaitPolicy,
    cancel: Option<&AtomicBool>,
) -> Result<(), WaitError>
where
    R: ComponentRegistry + ?Sized,
{
    let deadline = policy.timeout.map(|timeout| Instant::now() + timeout);
    loop {
        if cancel.is_some_and(|flag| flag.load(Ordering::Acquire)) {
            return Err(WaitError::Cancelled {
                component: component.clone(),
            });
        }
        if registry.running().contains(component) {
            return Ok(());
        }
        trace!(
            target: "conductor::wait",
            component = %component,
            "component not running yet"
        );

        let pause = match (deadline, policy.timeout) {
            (Some(deadline), Some(timeout)) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(WaitError::Timeout {
                        component: component.clone(),
                        timeout,
                    });
                }
                remaining.min(policy.poll_interval)
            }
            _ => policy.poll_interval,
        };
        thread::sleep(pause);
    }
}
