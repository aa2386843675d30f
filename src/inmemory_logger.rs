// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-Memory Logger
//!
//! Captures records in memory instead of writing them anywhere. This is what
//! the test suite uses to assert on rendered traces, and it is handy in
//! environments where stderr is not visible.

use crate::log_record::LogRecord;
use crate::logger::Logger;
use parking_lot::Mutex;

/// An in-memory logger that stores each record as one `String`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use tracewise::{InMemoryLogger, Tracer, TracerConfig};
///
/// let tracer = Tracer::new(TracerConfig::default()).unwrap();
/// let logger = Arc::new(InMemoryLogger::new());
/// tracer.sink().set_loggers(vec![logger.clone()]);
///
/// tracer.measure("warm cache", || ()).unwrap();
///
/// let lines = logger.drain_lines();
/// assert!(lines.iter().any(|l| l.starts_with("warm cache - ")));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryLogger {
    logs: Mutex<Vec<String>>,
}

impl InMemoryLogger {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(Vec::new()),
        }
    }

    /// Drains all logs into a single newline-separated string, clearing the buffer.
    pub fn drain_logs(&self) -> String {
        let mut logs = self.logs.lock();
        let result = logs.join("\n");
        logs.clear();
        result
    }

    /// Drains all logs, one entry per record, clearing the buffer.
    pub fn drain_lines(&self) -> Vec<String> {
        std::mem::take(&mut *self.logs.lock())
    }

    /// Flushes all logs to the console, clearing the internal buffer.
    pub fn drain_to_console(&self) {
        let mut logs = self.logs.lock();
        for log in logs.iter() {
            #[cfg(target_arch = "wasm32")]
            web_sys::console::log_1(&log.clone().into());
            #[cfg(not(target_arch = "wasm32"))]
            eprintln!("{}", log);
        }
        logs.clear();
    }
}

impl Logger for InMemoryLogger {
    fn finish_log_record(&self, record: LogRecord) {
        let log_string = record.to_string();
        self.logs.lock().push(log_string);
    }

    fn prepare_to_die(&self) {
        // No-op since we're storing in memory, no flushing needed
    }
}


/*
Boilerplate notes.

- Clone: no, two handles to the same buffer is what Arc is for.
- PartialEq/Hash: equality of loggers is meaningless.
- Send/Sync: automatic through the Mutex, and required by Logger.
 */
