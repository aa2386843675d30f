// SPDX-License-Identifier: MIT OR Apache-2.0

//! The in-flight trace of one thread.

use super::item::{ItemHandle, Measurement, TraceItem};
use crate::TimeUnit;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::fmt::Display;
use uuid::Uuid;

/// Ordered record of every tracked operation of one root invocation.
///
/// Items are stored in the order their `begin` ran. Each one carries the depth
/// it was opened at, which is enough to rebuild the call tree: the parent of an
/// item at depth `D` is the closest earlier item at depth `D - 1`.
///
/// ```rust
/// use tracewise::TimeUnit;
/// use tracewise::context::ThreadTraceContext;
///
/// let mut ctx = ThreadTraceContext::new();
/// let a = ctx.begin("a", None, None).unwrap();
/// let b = ctx.begin("b", None, None).unwrap();
/// assert!(!ctx.end(b, 50, TimeUnit::Millis).unwrap());
/// // depth is back to zero: the root has completed
/// assert!(ctx.end(a, 120, TimeUnit::Millis).unwrap());
/// assert_eq!(ctx.parent_of(b), Some(a));
/// ```
#[derive(Debug, Clone)]
pub struct ThreadTraceContext {
    trace_id: Uuid,
    created_at: DateTime<Utc>,
    items: Vec<TraceItem>,
    current_depth: usize,
}

impl ThreadTraceContext {
    /// Creates an empty context with a fresh trace id, stamped now.
    pub fn new() -> Self {
        ThreadTraceContext {
            trace_id: Uuid::new_v4(),
            created_at: Utc::now(),
            items: Vec::new(),
            current_depth: 0,
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Items in execution order.
    pub fn items(&self) -> &[TraceItem] {
        &self.items
    }

    pub fn item(&self, handle: ItemHandle) -> Option<&TraceItem> {
        self.items.get(handle.0)
    }

    pub fn current_depth(&self) -> usize {
        self.current_depth
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Opens an item at the current depth and descends one level.
    ///
    /// The label doubles as the statistics identity; use
    /// [`begin_tracked`](Self::begin_tracked) to give one explicitly.
    pub fn begin(
        &mut self,
        label: &str,
        arguments: Option<String>,
        threshold: Option<u64>,
    ) -> Result<ItemHandle> {
        self.begin_tracked(label, label, arguments, threshold)
    }

    pub fn begin_tracked(
        &mut self,
        tracker_id: &str,
        label: &str,
        arguments: Option<String>,
        threshold: Option<u64>,
    ) -> Result<ItemHandle> {
        if label.trim().is_empty() {
            return Err(Error::EmptyLabel);
        }
        let handle = ItemHandle(self.items.len());
        self.items.push(TraceItem::new(
            self.current_depth,
            label.to_string(),
            tracker_id.to_string(),
            arguments,
            threshold,
        ));
        self.current_depth += 1;
        Ok(handle)
    }

    /// Records the duration of an open item and climbs one level.
    ///
    /// Returns `true` when this brought the depth back to zero, which is the
    /// one and only signal that the root invocation has completed.
    pub fn end(&mut self, handle: ItemHandle, duration: u64, unit: TimeUnit) -> Result<bool> {
        let item = self
            .items
            .get_mut(handle.0)
            .ok_or(Error::UnknownItem(handle.0))?;
        if item.measurement.is_some() {
            return Err(Error::ItemAlreadyFinished(handle.0));
        }
        item.measurement = Some(Measurement {
            value: duration,
            unit,
        });
        self.current_depth = self.current_depth.saturating_sub(1);
        Ok(self.current_depth == 0)
    }

    /// The nearest earlier item one level up, if any.
    pub fn parent_of(&self, handle: ItemHandle) -> Option<ItemHandle> {
        let depth = self.items.get(handle.0)?.depth;
        if depth == 0 {
            return None;
        }
        self.items[..handle.0]
            .iter()
            .rposition(|item| item.depth == depth - 1)
            .map(ItemHandle)
    }

    /// Direct children of an item, in execution order.
    pub fn children_of(&self, handle: ItemHandle) -> Vec<ItemHandle> {
        let Some(parent) = self.items.get(handle.0) else {
            return Vec::new();
        };
        self.items[handle.0 + 1..]
            .iter()
            .enumerate()
            .take_while(|(_, item)| item.depth > parent.depth)
            .filter(|(_, item)| item.depth == parent.depth + 1)
            .map(|(offset, _)| ItemHandle(handle.0 + 1 + offset))
            .collect()
    }
}

impl Default for ThreadTraceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ThreadTraceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} items, depth {})",
            self.trace_id,
            self.items.len(),
            self.current_depth
        )
    }
}
