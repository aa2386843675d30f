// SPDX-License-Identifier: MIT OR Apache-2.0

//! The time units a tracked item can be measured in.

use crate::error::Error;
use crate::sys::Duration;
use std::fmt::Display;
use std::str::FromStr;

/// Unit of a recorded duration or threshold.
///
/// Only these three are supported; anything else is rejected when parsed.
/// Units order coarse to fine (`Seconds < Millis < Micros`), so `max` picks
/// the finest.
///
/// ```rust
/// use std::time::Duration;
/// use tracewise::TimeUnit;
///
/// let elapsed = Duration::from_micros(2_500);
/// assert_eq!(TimeUnit::Millis.convert(elapsed), 2);
/// assert_eq!(TimeUnit::Micros.convert(elapsed), 2_500);
/// assert!("nanos".parse::<TimeUnit>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeUnit {
    Seconds,
    #[default]
    Millis,
    Micros,
}

impl TimeUnit {
    /// Truncates `duration` to a whole number of this unit.
    pub fn convert(self, duration: Duration) -> u64 {
        let value = match self {
            TimeUnit::Seconds => u128::from(duration.as_secs()),
            TimeUnit::Millis => duration.as_millis(),
            TimeUnit::Micros => duration.as_micros(),
        };
        u64::try_from(value).unwrap_or(u64::MAX)
    }

    /// Re-expresses `value` (in this unit) in unit `to`, truncating.
    pub fn convert_value(self, value: u64, to: TimeUnit) -> u64 {
        let micros = u128::from(value) * self.micros_per_unit();
        u64::try_from(micros / to.micros_per_unit()).unwrap_or(u64::MAX)
    }

    /// Short presentation symbol used in rendered traces.
    pub fn symbol(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Millis => "ms",
            TimeUnit::Micros => "µs",
        }
    }

    fn micros_per_unit(self) -> u128 {
        match self {
            TimeUnit::Seconds => 1_000_000,
            TimeUnit::Millis => 1_000,
            TimeUnit::Micros => 1,
        }
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => Ok(TimeUnit::Seconds),
            "millis" | "milliseconds" | "ms" => Ok(TimeUnit::Millis),
            "micros" | "microseconds" | "us" | "µs" => Ok(TimeUnit::Micros),
            _ => Err(Error::UnsupportedUnit(s.to_string())),
        }
    }
}
