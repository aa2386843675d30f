// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide and per-tracker configuration.

use crate::error::{Error, Result};
use crate::{Level, TimeUnit};
use serde::Deserialize;

/// Default number of samples kept per tracked operation.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Options a [`Tracer`](crate::Tracer) is built from.
///
/// Every field has a default, so a TOML document only needs the keys it
/// changes:
///
/// ```rust
/// use tracewise::TracerConfig;
///
/// let config = TracerConfig::from_toml_str(r#"
///     statistics_enabled = true
///     statistics_buffer_capacity = 250
/// "#).unwrap();
/// assert!(config.statistics_enabled);
/// assert_eq!(config.statistics_buffer_capacity, 250);
/// assert!(!config.mirror_to_console);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracerConfig {
    /// Whether finished items are fed into the statistics registry.
    pub statistics_enabled: bool,
    /// Capacity given to newly created statistics entries.
    pub statistics_buffer_capacity: usize,
    /// Whether rendered trace lines are also printed to stdout.
    pub mirror_to_console: bool,
    /// Minimum level forwarded to loggers.
    pub log_level: Level,
}

impl Default for TracerConfig {
    fn default() -> Self {
        TracerConfig {
            statistics_enabled: false,
            statistics_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            mirror_to_console: false,
            log_level: Level::Info,
        }
    }
}

impl TracerConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TracerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.statistics_buffer_capacity < 1 {
            return Err(Error::InvalidCapacity(self.statistics_buffer_capacity));
        }
        Ok(())
    }

    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.statistics_buffer_capacity = capacity;
        self
    }

    pub fn with_mirror_to_console(mut self, enabled: bool) -> Self {
        self.mirror_to_console = enabled;
        self
    }

    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }
}

/// How a single block or invocation is tracked.
///
/// ```rust
/// use tracewise::{TimeUnit, TrackOptions};
///
/// let options = TrackOptions::new()
///     .with_unit(TimeUnit::Seconds)
///     .with_threshold(5)
///     .with_tracker_id("nightly-export");
/// assert_eq!(options.threshold(), Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOptions {
    unit: TimeUnit,
    enabled: bool,
    threshold: u64,
    tracker_id: Option<String>,
}

impl Default for TrackOptions {
    fn default() -> Self {
        TrackOptions {
            unit: TimeUnit::Millis,
            enabled: true,
            threshold: 0,
            tracker_id: None,
        }
    }
}

impl TrackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// A disabled tracker leaves no item in the trace.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Threshold in the configured unit; `0` turns threshold handling off.
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Statistics identity; blocks otherwise use `Block:<name>`.
    pub fn with_tracker_id(mut self, tracker_id: impl Into<String>) -> Self {
        self.tracker_id = Some(tracker_id.into());
        self
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn threshold(&self) -> Option<u64> {
        (self.threshold > 0).then_some(self.threshold)
    }

    pub fn tracker_id(&self) -> Option<&str> {
        self.tracker_id.as_deref()
    }
}
