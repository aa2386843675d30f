// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime support for the `#[track]` attribute.
//!
//! The attribute expands into calls to [`track_fn`] and [`ArgsFormatter`];
//! neither is meant to be called by hand. Given
//!
//! ```rust
//! # use std::sync::LazyLock;
//! # use tracewise::{Tracer, TracerConfig};
//! # static TRACER: LazyLock<Tracer> = LazyLock::new(|| Tracer::new(TracerConfig::default()).unwrap());
//! #[tracewise::track(tracer = TRACER, args, threshold = 5)]
//! fn lookup(id: u32) -> u32 {
//!     id * 2
//! }
//! # TRACER.sink().set_loggers(vec![]);
//! # assert_eq!(lookup(4), 8);
//! ```
//!
//! the body runs with a guard in scope, created before any argument is moved.

use crate::guard::TrackGuard;
use crate::tracer::TrackSpec;
use crate::{Level, LogRecord, TimeUnit, TrackOptions, Tracer};
use std::fmt::{Debug, Write};

/// Opens the item for one invocation of an annotated function.
///
/// Failures are logged rather than returned so the annotated function keeps
/// its own signature.
pub fn track_fn(
    tracer: &Tracer,
    label: &str,
    tracker_id: &str,
    arguments: Option<String>,
    threshold: u64,
    unit: TimeUnit,
    enabled: bool,
) -> Option<TrackGuard> {
    let options = TrackOptions::new()
        .with_unit(unit)
        .with_enabled(enabled)
        .with_threshold(threshold)
        .with_tracker_id(tracker_id);
    let mut spec = TrackSpec::new(label, options);
    if let Some(arguments) = arguments {
        spec = spec.with_arguments(arguments);
    }
    match tracer.track(spec) {
        Ok(guard) => Some(guard),
        Err(err) => {
            tracer.sink().emit(LogRecord::line(
                Level::Warning,
                format!("tracewise: could not track {label}: {err}"),
            ));
            None
        }
    }
}

/// Renders captured arguments as `name=value` pairs joined by `", "`.
///
/// ```rust
/// # use tracewise::hidden::ArgsFormatter;
/// let mut formatter = ArgsFormatter::new();
/// formatter.write_arg("id", &7);
/// formatter.write_arg("name", "ada");
/// assert_eq!(formatter.finish(), r#"id=7, name="ada""#);
/// ```
#[derive(Debug, Default)]
pub struct ArgsFormatter {
    out: String,
}

impl ArgsFormatter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_arg<T: Debug + ?Sized>(&mut self, name: &str, value: &T) {
        if !self.out.is_empty() {
            self.out.push_str(", ");
        }
        // Writing into a String cannot fail.
        let _ = write!(self.out, "{name}={value:?}");
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryLogger, TracerConfig};
    use std::sync::Arc;

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn empty_formatter() {
        assert_eq!(ArgsFormatter::new().finish(), "");
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn track_fn_logs_instead_of_failing() {
        let tracer = Tracer::new(TracerConfig::default()).unwrap();
        let logger = Arc::new(InMemoryLogger::new());
        tracer.sink().set_loggers(vec![logger.clone()]);
        let guard = track_fn(&tracer, "", "id", None, 0, TimeUnit::Millis, true);
        assert!(guard.is_none());
        let lines = logger.drain_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("could not track"));
    }
}
