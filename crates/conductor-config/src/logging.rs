//! Output formats for lifecycle log lines.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How the telemetry layer renders each event.
///
/// Parsing accepts any ASCII case, so `JSON` and `json` are equivalent.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened to the top level.
    #[default]
    Json,
    /// Terse single-line text for terminals.
    Compact,
}

impl LogFormat {
    /// Returns whether events are emitted as machine-readable records.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when text names no known [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
