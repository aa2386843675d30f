// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracewise::statistics::ReportFormat;
use tracewise::{InMemoryLogger, TimeUnit, TrackOptions, TrackSpec, Tracer, TracerConfig};

fn capture(config: TracerConfig) -> (Tracer, Arc<InMemoryLogger>) {
    let tracer = Tracer::new(config).unwrap();
    let logger = Arc::new(InMemoryLogger::new());
    tracer.sink().set_loggers(vec![logger.clone()]);
    (tracer, logger)
}

fn duration_of(line: &str) -> u64 {
    // "<label> - <value> <unit>[ ¤ ...]"
    let tail = line.rsplit(" - ").next().unwrap();
    tail.split(' ').next().unwrap().parse().unwrap()
}

#[test]
fn slow_block_is_annotated() {
    let (tracer, logger) = capture(TracerConfig::default());
    let options = TrackOptions::new().with_threshold(10);
    tracer
        .measure_with("slow", &options, || thread::sleep(Duration::from_millis(30)))
        .unwrap();
    let lines = logger.drain_lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[2].starts_with("slow - "));
    assert!(lines[2].ends_with(" ms ¤ [Threshold Exceed !!: 10 ms]"), "{}", lines[2]);
}

#[test]
fn durations_use_the_requested_unit() {
    let (tracer, logger) = capture(TracerConfig::default());
    let options = TrackOptions::new().with_unit(TimeUnit::Micros);
    tracer
        .measure_with("sleepy", &options, || thread::sleep(Duration::from_millis(5)))
        .unwrap();
    let lines = logger.drain_lines();
    assert!(lines[2].ends_with(" µs"));
    assert!(duration_of(&lines[2]) >= 5_000);
}

#[test]
fn fast_subtree_hidden_but_sibling_shown() {
    let (tracer, logger) = capture(TracerConfig::default());
    let fast = TrackOptions::new().with_threshold(60_000);
    tracer
        .measure("root", || {
            tracer
                .measure_with("fast", &fast, || {
                    tracer.measure("inside-fast", || ()).unwrap();
                })
                .unwrap();
            tracer.measure("sibling", || ()).unwrap();
        })
        .unwrap();
    let lines = logger.drain_lines();
    assert_eq!(lines.len(), 5);
    assert!(lines[2].starts_with("root - "));
    assert!(lines[3].starts_with("  |-- sibling - "));
}

#[test]
fn guard_reports_on_scope_exit() {
    let (tracer, logger) = capture(TracerConfig::default());
    {
        let _outer = tracer.track(TrackSpec::new("outer", TrackOptions::new())).unwrap();
        let inner = tracer
            .track(TrackSpec::new("inner", TrackOptions::new()).with_arguments("n=1"))
            .unwrap();
        assert!(inner.handle().is_some());
        drop(inner);
        assert!(logger.drain_lines().is_empty());
        assert_eq!(tracer.contexts().with_active(|ctx| ctx.current_depth()), Some(1));
    }
    let lines = logger.drain_lines();
    assert_eq!(lines.len(), 5);
    assert!(lines[3].starts_with("  |-- inner - Args: [n=1] - "));
}

#[test]
fn each_root_gets_its_own_trace() {
    let (tracer, logger) = capture(TracerConfig::default());
    tracer.measure("first", || ()).unwrap();
    tracer.measure("second", || ()).unwrap();
    let lines = logger.drain_lines();
    assert_eq!(lines.len(), 8);
    let first_id = lines[0].split(' ').nth(3).unwrap().to_string();
    let second_id = lines[4].split(' ').nth(3).unwrap().to_string();
    assert_ne!(first_id, second_id);
    assert!(lines[1].contains(&first_id));
    assert!(lines[3].contains(&first_id));
}

#[test]
fn console_mirroring_keeps_logger_output() {
    let (tracer, logger) = capture(TracerConfig::default().with_mirror_to_console(true));
    assert!(tracer.sink().mirror_to_console());
    tracer.measure("mirrored", || ()).unwrap();
    assert_eq!(logger.drain_lines().len(), 4);
}

#[test]
fn statistics_report_round_trip() {
    let (tracer, _logger) = capture(TracerConfig::default().with_statistics(true));
    let options = TrackOptions::new().with_threshold(1_000).with_tracker_id("job");
    for _ in 0..4 {
        tracer.measure_with("job", &options, || ()).unwrap();
    }
    let stats = tracer.statistics().get("job").unwrap();
    assert_eq!(stats.sample_count(), 4);
    assert_eq!(stats.within_count(), 4);
    assert_eq!(stats.threshold_value(), Some(1_000));

    let text = tracer.statistics_report(ReportFormat::Text).unwrap();
    assert!(text.contains("Total tracked operations: 1"));
    let json: serde_json::Value =
        serde_json::from_str(&tracer.statistics_report(ReportFormat::Json).unwrap()).unwrap();
    assert_eq!(json["trackers"][0]["identity"], "job");
    assert_eq!(json["trackers"][0]["sample_count"], 4);
}

#[test]
fn seconds_threshold_is_recorded_in_millis() {
    let (tracer, _logger) = capture(TracerConfig::default().with_statistics(true));
    let options = TrackOptions::new()
        .with_unit(TimeUnit::Seconds)
        .with_threshold(2);
    tracer.measure_with("slow-job", &options, || ()).unwrap();
    let stats = tracer.statistics().get("Block:slow-job").unwrap();
    assert_eq!(stats.threshold_value(), Some(2_000));
}
