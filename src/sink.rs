// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing of rendered traces and engine diagnostics to loggers.
//!
//! A [`LogSink`] is owned by a [`Tracer`](crate::Tracer) rather than living in a
//! process-wide static, so two tracers (or two tests) never see each other's
//! output. It is cheap to clone: every clone refers to the same logger list.
//!
//! # Default Behavior
//!
//! A fresh sink forwards to a single [`StdErrorLogger`], drops records below
//! [`Level::Info`], and does not mirror to the console.
//!
//! ```
//! use std::sync::Arc;
//! use tracewise::{InMemoryLogger, Level, LogRecord, LogSink};
//!
//! let sink = LogSink::new(Level::Info, false);
//! let logger = Arc::new(InMemoryLogger::new());
//! sink.set_loggers(vec![logger.clone()]);
//!
//! sink.emit(LogRecord::line(Level::DebugInternal, "filtered".to_string()));
//! sink.emit(LogRecord::line(Level::Warning, "kept".to_string()));
//! assert_eq!(logger.drain_lines(), vec!["kept".to_string()]);
//! ```

use crate::logger::Logger;
use crate::stderror_logger::StdErrorLogger;
use crate::{Level, LogRecord};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

#[derive(Debug)]
struct SinkInner {
    loggers: RwLock<Vec<Arc<dyn Logger>>>,
    min_level: AtomicU8,
    mirror_to_console: AtomicBool,
    // Held while a rendered trace is emitted, so reports never interleave.
    report: Mutex<()>,
}

/// Shared handle to a set of loggers plus the console mirror switch.
#[derive(Debug, Clone)]
pub struct LogSink {
    inner: Arc<SinkInner>,
}

impl LogSink {
    /// Creates a sink that forwards to a [`StdErrorLogger`].
    pub fn new(min_level: Level, mirror_to_console: bool) -> Self {
        Self::with_loggers(
            vec![Arc::new(StdErrorLogger::new())],
            min_level,
            mirror_to_console,
        )
    }

    pub fn with_loggers(
        loggers: Vec<Arc<dyn Logger>>,
        min_level: Level,
        mirror_to_console: bool,
    ) -> Self {
        LogSink {
            inner: Arc::new(SinkInner {
                loggers: RwLock::new(loggers),
                min_level: AtomicU8::new(min_level.as_u8()),
                mirror_to_console: AtomicBool::new(mirror_to_console),
                report: Mutex::new(()),
            }),
        }
    }

    /// Returns the current loggers.
    ///
    /// The `Arc`s are cloned so the lock is held only for the copy.
    pub fn loggers(&self) -> Vec<Arc<dyn Logger>> {
        self.inner.loggers.read().clone()
    }

    /// Appends a logger; it receives every record emitted from now on.
    pub fn add_logger(&self, logger: Arc<dyn Logger>) {
        self.inner.loggers.write().push(logger);
    }

    /// Replaces all loggers. An empty list silently drops records.
    pub fn set_loggers(&self, loggers: Vec<Arc<dyn Logger>>) {
        *self.inner.loggers.write() = loggers;
    }

    pub fn min_level(&self) -> Level {
        Level::from_u8(self.inner.min_level.load(Ordering::Relaxed))
    }

    pub fn set_min_level(&self, level: Level) {
        self.inner.min_level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn mirror_to_console(&self) -> bool {
        self.inner.mirror_to_console.load(Ordering::Relaxed)
    }

    /// Toggles duplicating rendered trace lines to stdout.
    pub fn set_mirror_to_console(&self, enabled: bool) {
        self.inner
            .mirror_to_console
            .store(enabled, Ordering::Relaxed);
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level()
    }

    /// Forwards a record to every logger if its level passes the filter.
    pub fn emit(&self, record: LogRecord) {
        if !self.enabled(record.level()) {
            return;
        }
        for logger in self.loggers() {
            logger.finish_log_record(record.clone());
        }
    }

    /// Emits the lines of a rendered trace, mirroring them when requested.
    ///
    /// Reports emitted from different threads at once come out one after the other.
    pub fn emit_report(&self, lines: &[String]) {
        let _report = self.inner.report.lock();
        let mirror = self.mirror_to_console();
        for line in lines {
            if mirror {
                print_to_console(line);
            }
            self.emit(LogRecord::line(Level::Info, line.clone()));
        }
    }

    /// Asks every logger to flush.
    pub fn prepare_to_die(&self) {
        for logger in self.loggers() {
            logger.prepare_to_die();
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(Level::default(), false)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn print_to_console(line: &str) {
    println!("{line}");
}

#[cfg(target_arch = "wasm32")]
fn print_to_console(line: &str) {
    web_sys::console::log_1(&line.into());
}
