// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::{Error, Result};
use indexmap::IndexSet;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct Samples {
    buffer: VecDeque<u64>,
    threshold: Option<u64>,
    exceeded: u64,
    within: u64,
    parent: Option<String>,
    children: IndexSet<String>,
}

impl Samples {
    fn sorted(&self) -> Vec<u64> {
        let mut sorted: Vec<u64> = self.buffer.iter().copied().collect();
        sorted.sort_unstable();
        sorted
    }

    fn average(&self) -> u64 {
        if self.buffer.is_empty() {
            return 0;
        }
        let sum: u128 = self.buffer.iter().map(|v| u128::from(*v)).sum();
        (sum / self.buffer.len() as u128) as u64
    }
}

fn check_percentile(p: f64) -> Result<()> {
    if p.is_nan() || !(0.0..=100.0).contains(&p) {
        return Err(Error::InvalidPercentile(p));
    }
    Ok(())
}

/// Nearest-rank lookup into an ascending slice. `p` must already be checked.
fn nearest_rank(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let n = sorted.len();
    let rank = (p * n as f64 / 100.0).ceil() as i64 - 1;
    sorted[rank.clamp(0, n as i64 - 1) as usize]
}

/**
Rolling sample history for one tracked operation.

Samples go into a bounded FIFO buffer; nothing is aggregated on the recording
path. Averages and percentiles are computed from the buffer when asked for.

Each instance has its own lock, so recording into two different operations
never contends.

```rust
use tracewise::statistics::MethodStatistics;

let stats = MethodStatistics::new("jobs::export", "export()", 3).unwrap();
for ms in [10, 20, 30, 40] {
    stats.record(ms, None);
}
assert_eq!(stats.samples(), vec![20, 30, 40]);
assert_eq!(stats.average(), 30);
assert_eq!(stats.percentile(100.0).unwrap(), 40);
```
*/
#[derive(Debug)]
pub struct MethodStatistics {
    identity: String,
    display_name: String,
    capacity: usize,
    samples: Mutex<Samples>,
}

impl MethodStatistics {
    /// Fails with [`Error::InvalidCapacity`] when `capacity` is zero.
    pub fn new(
        identity: impl Into<String>,
        display_name: impl Into<String>,
        capacity: usize,
    ) -> Result<Self> {
        if capacity < 1 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(MethodStatistics {
            identity: identity.into(),
            display_name: display_name.into(),
            capacity,
            samples: Mutex::new(Samples::default()),
        })
    }

    /// For callers that already validated `capacity`.
    pub(crate) fn with_checked_capacity(identity: &str, display_name: &str, capacity: usize) -> Self {
        MethodStatistics {
            identity: identity.to_string(),
            display_name: display_name.to_string(),
            capacity: capacity.max(1),
            samples: Mutex::new(Samples::default()),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a sample, evicting the oldest one when the buffer is full.
    ///
    /// A positive `threshold` becomes the current threshold value and the
    /// sample is counted as exceeded if it is strictly greater, within
    /// otherwise. A missing or zero threshold leaves the counters alone.
    pub fn record(&self, duration: u64, threshold: Option<u64>) {
        let mut samples = self.samples.lock();
        if samples.buffer.len() >= self.capacity {
            samples.buffer.pop_front();
        }
        samples.buffer.push_back(duration);
        if let Some(threshold) = threshold.filter(|t| *t > 0) {
            samples.threshold = Some(threshold);
            if duration > threshold {
                samples.exceeded += 1;
            } else {
                samples.within += 1;
            }
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.lock().buffer.len()
    }

    /// Invocations seen: the counters when a threshold is known, the buffer otherwise.
    pub fn invocation_count(&self) -> u64 {
        let samples = self.samples.lock();
        match samples.threshold {
            Some(_) => samples.exceeded + samples.within,
            None => samples.buffer.len() as u64,
        }
    }

    /// Copy of the buffer, oldest first.
    pub fn samples(&self) -> Vec<u64> {
        self.samples.lock().buffer.iter().copied().collect()
    }

    /// Truncating mean of the buffer; 0 when empty.
    pub fn average(&self) -> u64 {
        self.samples.lock().average()
    }

    /// Nearest-rank percentile of the buffer.
    ///
    /// `p` is checked before anything else, so an out-of-range value fails
    /// even on an empty buffer. With no samples the result is 0.
    pub fn percentile(&self, p: f64) -> Result<u64> {
        check_percentile(p)?;
        Ok(nearest_rank(&self.samples.lock().sorted(), p))
    }

    pub fn min(&self) -> u64 {
        self.samples.lock().buffer.iter().copied().min().unwrap_or(0)
    }

    pub fn max(&self) -> u64 {
        self.samples.lock().buffer.iter().copied().max().unwrap_or(0)
    }

    pub fn threshold_value(&self) -> Option<u64> {
        self.samples.lock().threshold
    }

    pub fn exceeded_count(&self) -> u64 {
        self.samples.lock().exceeded
    }

    pub fn within_count(&self) -> u64 {
        self.samples.lock().within
    }

    pub fn parent_identity(&self) -> Option<String> {
        self.samples.lock().parent.clone()
    }

    /// Child identities in the order they were first linked.
    pub fn child_identities(&self) -> Vec<String> {
        self.samples.lock().children.iter().cloned().collect()
    }

    /// Clears samples, counters and child links.
    ///
    /// The parent link and the last threshold value survive.
    pub fn reset(&self) {
        let mut samples = self.samples.lock();
        samples.buffer.clear();
        samples.exceeded = 0;
        samples.within = 0;
        samples.children.clear();
    }

    pub(crate) fn set_parent(&self, parent: &str) {
        self.samples.lock().parent = Some(parent.to_string());
    }

    /// Returns `false` if the child was already linked.
    pub(crate) fn add_child(&self, child: &str) -> bool {
        self.samples.lock().children.insert(child.to_string())
    }

    /// Every aggregate, computed under a single lock.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let samples = self.samples.lock();
        let sorted = samples.sorted();
        StatisticsSnapshot {
            identity: self.identity.clone(),
            display_name: self.display_name.clone(),
            sample_count: sorted.len(),
            average: samples.average(),
            p50: nearest_rank(&sorted, 50.0),
            p90: nearest_rank(&sorted, 90.0),
            p95: nearest_rank(&sorted, 95.0),
            min: sorted.first().copied().unwrap_or(0),
            max: sorted.last().copied().unwrap_or(0),
            threshold: samples.threshold,
            exceeded_count: samples.exceeded,
            within_count: samples.within,
            parent_identity: samples.parent.clone(),
            child_identities: samples.children.iter().cloned().collect(),
        }
    }
}

/// Point-in-time view of one [`MethodStatistics`], as consumed by reports.
///
/// Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub identity: String,
    pub display_name: String,
    pub sample_count: usize,
    pub average: u64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub min: u64,
    pub max: u64,
    pub threshold: Option<u64>,
    pub exceeded_count: u64,
    pub within_count: u64,
    pub parent_identity: Option<String>,
    pub child_identities: Vec<String>,
}

impl StatisticsSnapshot {
    /// The "no data" view of an identity nothing was recorded for.
    pub fn empty(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        StatisticsSnapshot {
            display_name: identity.clone(),
            identity,
            sample_count: 0,
            average: 0,
            p50: 0,
            p90: 0,
            p95: 0,
            min: 0,
            max: 0,
            threshold: None,
            exceeded_count: 0,
            within_count: 0,
            parent_identity: None,
            child_identities: Vec::new(),
        }
    }
}
