// SPDX-License-Identifier: MIT OR Apache-2.0
use serde::Deserialize;

/// Severity of a record emitted through a [`LogSink`](crate::LogSink).
///
/// Rendered traces are emitted at [`Level::Info`]; engine diagnostics at
/// [`Level::DebugInternal`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Context lifecycle chatter, off unless explicitly requested
    DebugInternal,
    /// Rendered trace reports
    #[default]
    Info,
    /// Misuse of the engine that was tolerated, e.g. ending an unknown item
    Warning,
    /// Something went wrong while emitting a report
    Error,
}

impl Level {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Level::DebugInternal => 0,
            Level::Info => 1,
            Level::Warning => 2,
            Level::Error => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Level {
        match value {
            0 => Level::DebugInternal,
            1 => Level::Info,
            2 => Level::Warning,
            _ => Level::Error,
        }
    }
}
