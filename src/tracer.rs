// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine handle that ties contexts, rendering, statistics and output together.

use crate::context::{ContextRegistry, ItemHandle, ThreadTraceContext};
use crate::error::{Error, Result};
use crate::guard::TrackGuard;
use crate::statistics::{ReportFormat, StatisticsRegistry, generate_report};
use crate::sys::Duration;
use crate::{Level, LogRecord, LogSink, TimeUnit, TraceFormatter, TracerConfig, TrackOptions};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One operation about to be tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSpec {
    label: String,
    tracker_id: String,
    arguments: Option<String>,
    options: TrackOptions,
}

impl TrackSpec {
    /// The statistics identity is the options' tracker id, or the label.
    pub fn new(label: impl Into<String>, options: TrackOptions) -> Self {
        let label = label.into();
        let tracker_id = options
            .tracker_id()
            .map(str::to_string)
            .unwrap_or_else(|| label.clone());
        TrackSpec {
            label,
            tracker_id,
            arguments: None,
            options,
        }
    }

    /// A block: the identity defaults to `Block:<name>`.
    pub fn block(name: impl Into<String>, options: TrackOptions) -> Self {
        let name = name.into();
        let tracker_id = options
            .tracker_id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Block:{name}"));
        TrackSpec {
            label: name,
            tracker_id,
            arguments: None,
            options,
        }
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tracker_id(&self) -> &str {
        &self.tracker_id
    }

    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }

    pub fn options(&self) -> &TrackOptions {
        &self.options
    }
}

/// Label and rendered arguments of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Description {
    pub label: String,
    pub arguments: Option<String>,
}

impl Description {
    pub fn new(label: impl Into<String>) -> Self {
        Description {
            label: label.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }
}

/// Something that can say what it is when it gets tracked.
///
/// ```rust
/// use tracewise::{Describe, Description, TrackOptions, Tracer, TracerConfig};
///
/// struct Export { batch: u32 }
///
/// impl Describe for Export {
///     fn describe(&self) -> Description {
///         Description::new("Export::run").with_arguments(format!("batch={}", self.batch))
///     }
/// }
///
/// let tracer = Tracer::new(TracerConfig::default()).unwrap();
/// tracer.sink().set_loggers(vec![]);
/// let job = Export { batch: 4 };
/// let _guard = tracer.track_described(&job, &TrackOptions::new()).unwrap();
/// ```
pub trait Describe {
    fn describe(&self) -> Description;
}

impl Describe for Description {
    fn describe(&self) -> Description {
        self.clone()
    }
}

#[derive(Debug)]
struct TracerInner {
    contexts: ContextRegistry,
    statistics: Arc<StatisticsRegistry>,
    sink: LogSink,
    formatter: TraceFormatter,
    statistics_enabled: AtomicBool,
}

/**
Entry point for tracking work.

A `Tracer` is built once and passed to whatever needs it; clones share
everything. Each thread gets its own trace, which is rendered and sent to the
[`LogSink`] as soon as its outermost tracked operation finishes.

```rust
use std::sync::Arc;
use tracewise::{InMemoryLogger, TrackOptions, Tracer, TracerConfig};

let tracer = Tracer::new(TracerConfig::default()).unwrap();
let logger = Arc::new(InMemoryLogger::new());
tracer.sink().set_loggers(vec![logger.clone()]);

tracer.measure("outer", || {
    tracer.measure_with("inner", &TrackOptions::new().with_threshold(60_000), || ()).unwrap();
}).unwrap();

let lines = logger.drain_lines();
assert!(lines[2].starts_with("outer - "));
// "inner" was faster than its threshold, so it is hidden
assert_eq!(lines.len(), 4);
```
*/
#[derive(Debug, Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

impl Tracer {
    /// Validates `config` and builds a tracer with its own statistics registry.
    pub fn new(config: TracerConfig) -> Result<Self> {
        config.validate()?;
        let statistics = Arc::new(StatisticsRegistry::with_capacity(
            config.statistics_buffer_capacity,
        )?);
        let sink = LogSink::new(config.log_level, config.mirror_to_console);
        Ok(Self::with_parts(config.statistics_enabled, sink, statistics))
    }

    /// Builds a tracer around an existing sink and statistics registry.
    pub fn with_parts(
        statistics_enabled: bool,
        sink: LogSink,
        statistics: Arc<StatisticsRegistry>,
    ) -> Self {
        Tracer {
            inner: Arc::new(TracerInner {
                contexts: ContextRegistry::new(sink.clone()),
                statistics,
                sink,
                formatter: TraceFormatter::new(),
                statistics_enabled: AtomicBool::new(statistics_enabled),
            }),
        }
    }

    pub fn sink(&self) -> &LogSink {
        &self.inner.sink
    }

    pub fn contexts(&self) -> &ContextRegistry {
        &self.inner.contexts
    }

    pub fn statistics(&self) -> &Arc<StatisticsRegistry> {
        &self.inner.statistics
    }

    pub fn statistics_enabled(&self) -> bool {
        self.inner.statistics_enabled.load(Ordering::Relaxed)
    }

    pub fn set_statistics_enabled(&self, enabled: bool) {
        self.inner
            .statistics_enabled
            .store(enabled, Ordering::Relaxed);
    }

    /// Opens an item for `spec` and returns the guard that closes it.
    ///
    /// A disabled spec records nothing, but still opens this thread's trace
    /// if none is running.
    pub fn track(&self, spec: TrackSpec) -> Result<TrackGuard> {
        let options = spec.options();
        if !options.is_enabled() {
            self.inner.contexts.get_or_create(|_| ());
            return Ok(TrackGuard::new(self.clone(), None, options.unit()));
        }
        let threshold = options.threshold();
        let unit = options.unit();
        let handle = self.inner.contexts.get_or_create(|ctx| {
            ctx.begin_tracked(
                &spec.tracker_id,
                &spec.label,
                spec.arguments.clone(),
                threshold,
            )
        });
        match handle {
            Ok(handle) => Ok(TrackGuard::new(self.clone(), Some(handle), unit)),
            Err(err) => {
                // Don't leave an empty context behind for a rejected label.
                if self.inner.contexts.with_active(|ctx| ctx.is_empty()) == Some(true) {
                    self.inner.contexts.discard();
                }
                Err(err)
            }
        }
    }

    /// Tracks `f` as a block and returns its value.
    pub fn measure<R>(&self, name: &str, f: impl FnOnce() -> R) -> Result<R> {
        self.measure_with(name, &TrackOptions::default(), f)
    }

    pub fn measure_with<R>(
        &self,
        name: &str,
        options: &TrackOptions,
        f: impl FnOnce() -> R,
    ) -> Result<R> {
        let _guard = self.track(TrackSpec::block(name, options.clone()))?;
        Ok(f())
    }

    /// Tracks an invocation that describes itself.
    pub fn track_described<D: Describe + ?Sized>(
        &self,
        invocation: &D,
        options: &TrackOptions,
    ) -> Result<TrackGuard> {
        let Description { label, arguments } = invocation.describe();
        let mut spec = TrackSpec::new(label, options.clone());
        spec.arguments = arguments;
        self.track(spec)
    }

    /// Renders every recorded statistic.
    pub fn statistics_report(&self, format: ReportFormat) -> Result<String> {
        generate_report(&self.inner.statistics.snapshot(), format)
    }

    /// Closes an item. Called from [`TrackGuard`]'s destructor, so it logs
    /// instead of failing.
    pub(crate) fn finish(&self, handle: ItemHandle, elapsed: Duration, unit: TimeUnit) {
        let outcome = self
            .inner
            .contexts
            .with_active(|ctx| self.end_item(ctx, handle, elapsed, unit));

        match outcome {
            None => self.inner.sink.emit(LogRecord::line(
                Level::Warning,
                format!(
                    "tracewise: item {} finished with no active trace context on this thread",
                    handle.index()
                ),
            )),
            Some(Err(err)) => self.inner.sink.emit(LogRecord::line(
                Level::Warning,
                format!("tracewise: could not finish item: {err}"),
            )),
            Some(Ok((done, sample, note))) => {
                self.inner.sink.emit(note);
                if let Some(sample) = sample {
                    self.inner.statistics.record(
                        &sample.identity,
                        &sample.display_name,
                        sample.millis,
                        sample.threshold,
                        sample.parent.as_deref(),
                    );
                }
                if done {
                    self.complete();
                }
            }
        }
    }

    /// Logs that `handle`'s work is unwinding; the item is still closed afterwards.
    pub(crate) fn warn_unwinding(&self, handle: ItemHandle) {
        let label = self
            .inner
            .contexts
            .with_active(|ctx| ctx.item(handle).map(|item| item.label().to_string()))
            .flatten();
        if let Some(label) = label {
            self.inner.sink.emit(LogRecord::line(
                Level::Warning,
                format!("tracewise: panic while running {label}"),
            ));
        }
    }

    fn end_item(
        &self,
        ctx: &mut ThreadTraceContext,
        handle: ItemHandle,
        elapsed: Duration,
        unit: TimeUnit,
    ) -> Result<(bool, Option<Sample>, LogRecord)> {
        let duration = unit.convert(elapsed);
        let done = ctx.end(handle, duration, unit)?;
        let item = ctx
            .item(handle)
            .ok_or(Error::UnknownItem(handle.index()))?;
        let sample = self.statistics_enabled().then(|| Sample {
            identity: item.tracker_id().to_string(),
            display_name: item.label().to_string(),
            millis: TimeUnit::Millis.convert(elapsed),
            threshold: item
                .threshold()
                .map(|t| unit.convert_value(t, TimeUnit::Millis)),
            parent: ctx
                .parent_of(handle)
                .and_then(|parent| ctx.item(parent))
                .map(|parent| parent.tracker_id().to_string()),
        });
        // Runs while this thread's contexts are borrowed; the caller emits it.
        let note = LogRecord::line(
            Level::DebugInternal,
            format!("tracewise: finished {} in {duration} {unit}", item.label()),
        );
        Ok((done, sample, note))
    }

    /// Closes a disabled tracker: completes the trace if nothing else is open.
    pub(crate) fn finish_disabled(&self) {
        if self.inner.contexts.with_active(|ctx| ctx.current_depth()) == Some(0) {
            self.complete();
        }
    }

    fn complete(&self) {
        if let Some(ctx) = self.inner.contexts.discard() {
            let lines = self.inner.formatter.render(&ctx);
            self.inner.sink.emit_report(&lines);
        }
    }
}

struct Sample {
    identity: String,
    display_name: String,
    millis: u64,
    threshold: Option<u64>,
    parent: Option<String>,
}
