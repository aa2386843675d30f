// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors surfaced synchronously to the caller.
//!
//! Invalid configuration and invalid arguments are never clamped or logged and
//! ignored; they come back as an [`Error`] from the call that received them.

use thiserror::Error;

/// Everything that can go wrong when configuring or querying the engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Percentile outside `[0, 100]`, or NaN.
    #[error("percentile must be between 0 and 100, got {0}")]
    InvalidPercentile(f64),

    /// Statistics buffer capacity below one sample.
    #[error("buffer capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    /// A tracked item was opened without a label.
    #[error("trace item label must not be empty")]
    EmptyLabel,

    /// A time unit other than seconds, millis or micros.
    #[error("time unit `{0}` is not supported (expected seconds, millis or micros)")]
    UnsupportedUnit(String),

    /// A report format other than text, json or html.
    #[error("report format `{0}` is not supported (expected text, json or html)")]
    UnsupportedReportFormat(String),

    /// `end` was given a handle that does not belong to the context.
    #[error("no trace item with index {0} in this context")]
    UnknownItem(usize),

    /// `end` was called twice for the same item.
    #[error("trace item {0} has already finished")]
    ItemAlreadyFinished(usize),

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A report could not be serialized.
    #[error("could not serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Shorthand used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
