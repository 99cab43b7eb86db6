//! Shared configuration for the Conductor orchestrator.
//!
//! [`ConductorConfig`] gathers the tunables that surround the orchestration
//! core: how lifecycle events are logged and how readiness waits poll the
//! component registry. Every field has a default, so an empty document
//! deserialises into a usable configuration. Loading the document from disk
//! or the environment is left to the embedding application.

mod defaults;
mod logging;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, default_log_filter, default_log_filter_string,
    default_log_format, default_memoize_dependencies, default_poll_interval_ms,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Configuration consumed by the orchestrator and its telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConductorConfig {
    /// Tracing filter expression, e.g. `info` or `conductor=debug`.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for emitted log lines.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Interval between readiness polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on a readiness wait, in milliseconds. Unbounded when unset.
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,
    /// Whether dependency lookups are cached for the length of an operation.
    #[serde(default = "default_memoize_dependencies")]
    pub memoize_dependencies: bool,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            poll_interval_ms: default_poll_interval_ms(),
            wait_timeout_ms: None,
            memoize_dependencies: default_memoize_dependencies(),
        }
    }
}

impl ConductorConfig {
    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the interval between readiness polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the readiness wait bound, if any.
    #[must_use]
    pub const fn wait_timeout(&self) -> Option<Duration> {
        match self.wait_timeout_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }

    /// Returns whether dependency lookups are memoised.
    #[must_use]
    pub const fn memoize_dependencies(&self) -> bool {
        self.memoize_dependencies
    }

    /// Checks that the configuration describes a usable orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the poll interval or the wait timeout is
    /// zero, or when the log filter is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::EmptyLogFilter);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "poll_interval_ms",
            });
        }
        if self.wait_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroDuration {
                field: "wait_timeout_ms",
            });
        }
        Ok(())
    }
}

/// Errors raised when validating a [`ConductorConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A duration that must be positive was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The log filter expression was empty.
    #[error("log_filter must not be empty")]
    EmptyLogFilter,
}
