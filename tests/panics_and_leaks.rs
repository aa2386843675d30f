// SPDX-License-Identifier: MIT OR Apache-2.0

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracewise::{InMemoryLogger, Level, TrackOptions, TrackSpec, Tracer, TracerConfig};

fn capture() -> (Tracer, Arc<InMemoryLogger>) {
    let tracer = Tracer::new(TracerConfig::default()).unwrap();
    let logger = Arc::new(InMemoryLogger::new());
    tracer.sink().set_loggers(vec![logger.clone()]);
    (tracer, logger)
}

#[test]
fn panic_still_closes_every_item() {
    let (tracer, logger) = capture();
    let result = catch_unwind(AssertUnwindSafe(|| {
        tracer
            .measure("outer", || {
                tracer
                    .measure("explodes", || panic!("boom"))
                    .unwrap();
            })
            .unwrap();
    }));
    assert!(result.is_err());
    assert!(!tracer.contexts().is_active());

    // Each block the panic passes through warns before its item closes.
    let lines = logger.drain_lines();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "tracewise: panic while running explodes");
    assert_eq!(lines[1], "tracewise: panic while running outer");
    assert!(lines[4].starts_with("outer - "));
    assert!(lines[5].starts_with("  |-- explodes - "));

    // The next trace on this thread starts clean.
    tracer.measure("after", || ()).unwrap();
    let lines = logger.drain_lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[2].starts_with("after - "));
}

#[test]
fn unwinding_warning_passes_a_warning_filter() {
    let (tracer, logger) = capture();
    tracer.sink().set_min_level(Level::Warning);
    let result = catch_unwind(AssertUnwindSafe(|| {
        let _guard = tracer.track(TrackSpec::new("parse(input)", TrackOptions::new())).unwrap();
        panic!("bad input");
    }));
    assert!(result.is_err());
    assert!(!tracer.contexts().is_active());
    assert_eq!(
        logger.drain_lines(),
        vec!["tracewise: panic while running parse(input)".to_string()]
    );
}

#[test]
fn disabled_guard_unwinds_quietly() {
    let (tracer, logger) = capture();
    tracer.sink().set_min_level(Level::Warning);
    let options = TrackOptions::new().with_enabled(false);
    let result = catch_unwind(AssertUnwindSafe(|| {
        tracer.measure_with("off", &options, || panic!("boom")).unwrap();
    }));
    assert!(result.is_err());
    assert!(!tracer.contexts().is_active());
    assert!(logger.drain_lines().is_empty());
}

#[test]
fn forgotten_guard_leaks_until_discarded() {
    let (tracer, logger) = capture();
    let guard = tracer.track(TrackSpec::new("leaky", TrackOptions::new())).unwrap();
    std::mem::forget(guard);
    assert!(tracer.contexts().is_active());

    // Later work on this thread lands in the leaked trace and never completes it.
    tracer.measure("stuck", || ()).unwrap();
    assert!(logger.drain_lines().is_empty());
    assert_eq!(tracer.contexts().with_active(|ctx| ctx.current_depth()), Some(1));

    let leaked = tracer.contexts().discard().unwrap();
    assert_eq!(leaked.items().len(), 2);
    assert!(!leaked.items()[0].is_finished());
    assert!(leaked.items()[1].is_finished());
    assert!(!tracer.contexts().is_active());

    tracer.measure("fresh", || ()).unwrap();
    assert_eq!(logger.drain_lines().len(), 4);
}

#[test]
fn guard_outliving_its_context_warns() {
    let (tracer, logger) = capture();
    tracer.sink().set_min_level(Level::Warning);
    let guard = tracer.track(TrackSpec::new("orphan", TrackOptions::new())).unwrap();
    tracer.contexts().discard();
    drop(guard);
    let lines = logger.drain_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("no active trace context"));
}

#[test]
fn diagnostics_follow_the_lifecycle() {
    let tracer = Tracer::new(TracerConfig::default().with_log_level(Level::DebugInternal)).unwrap();
    let logger = Arc::new(InMemoryLogger::new());
    tracer.sink().set_loggers(vec![logger.clone()]);
    tracer.measure("observed", || ()).unwrap();
    let lines = logger.drain_lines();
    assert!(lines[0].contains("created trace context"));
    assert!(lines[1].contains("finished observed"));
    assert!(lines[2].contains("discarded trace context"));
    assert!(lines[3].starts_with("Trace context id: "));
}
