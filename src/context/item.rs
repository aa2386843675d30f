// SPDX-License-Identifier: MIT OR Apache-2.0

//! One measured operation inside a trace.

use crate::TimeUnit;

/// Index of an item inside its [`ThreadTraceContext`](super::ThreadTraceContext).
///
/// Returned by `begin` and consumed by `end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemHandle(pub(crate) usize);

impl ItemHandle {
    /// Position of the item in execution order.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A finished measurement: the value and the unit it was taken in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Measurement {
    pub value: u64,
    pub unit: TimeUnit,
}

/// The recorded outcome of one tracked operation.
///
/// Items carry their own depth and no parent pointer; the tree is recovered
/// from execution order (see [`ThreadTraceContext::parent_of`](super::ThreadTraceContext::parent_of)).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceItem {
    pub(crate) depth: usize,
    pub(crate) label: String,
    pub(crate) tracker_id: String,
    pub(crate) arguments: Option<String>,
    pub(crate) threshold: Option<u64>,
    pub(crate) measurement: Option<Measurement>,
}

impl TraceItem {
    pub(crate) fn new(
        depth: usize,
        label: String,
        tracker_id: String,
        arguments: Option<String>,
        threshold: Option<u64>,
    ) -> Self {
        TraceItem {
            depth,
            label,
            tracker_id,
            arguments,
            threshold,
            measurement: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Statistics identity of the operation.
    pub fn tracker_id(&self) -> &str {
        &self.tracker_id
    }

    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }

    pub fn threshold(&self) -> Option<u64> {
        self.threshold
    }

    /// `None` until the operation completes.
    pub fn duration(&self) -> Option<u64> {
        self.measurement.map(|m| m.value)
    }

    pub fn unit(&self) -> Option<TimeUnit> {
        self.measurement.map(|m| m.unit)
    }

    pub fn measurement(&self) -> Option<Measurement> {
        self.measurement
    }

    pub fn is_finished(&self) -> bool {
        self.measurement.is_some()
    }

    /// Finished with a threshold and strictly faster than it.
    pub fn is_within_threshold(&self) -> bool {
        match (self.threshold, self.measurement) {
            (Some(threshold), Some(m)) => m.value < threshold,
            _ => false,
        }
    }

    /// Finished with a threshold and at least as slow as it.
    pub fn exceeds_threshold(&self) -> bool {
        match (self.threshold, self.measurement) {
            (Some(threshold), Some(m)) => m.value >= threshold,
            _ => false,
        }
    }
}
