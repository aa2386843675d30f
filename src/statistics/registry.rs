// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{MethodStatistics, StatisticsSnapshot};
use crate::config::DEFAULT_BUFFER_CAPACITY;
use crate::error::{Error, Result};
use dashmap::DashMap;
use indexmap::IndexSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/**
Shared map from operation identity to its [`MethodStatistics`].

One registry is meant to be shared by every thread of a process (wrap it in an
[`Arc`], or let a [`Tracer`](crate::Tracer) do it). Concurrent first records
for the same identity create exactly one entry; after that, updates only lock
the entry they touch.

Children usually finish, and are therefore recorded, before their parent has
an entry. Such links are parked and attached as soon as the parent's first
sample arrives.

```rust
use tracewise::statistics::StatisticsRegistry;

let registry = StatisticsRegistry::new();
registry.record("app::load", "load()", 12, None, Some("app::main"));
registry.record("app::main", "main()", 40, Some(100), None);

let parent = registry.get("app::main").unwrap();
assert_eq!(parent.child_identities(), vec!["app::load"]);
assert_eq!(parent.within_count(), 1);
```
*/
#[derive(Debug)]
pub struct StatisticsRegistry {
    entries: DashMap<String, Arc<MethodStatistics>>,
    pending_children: DashMap<String, IndexSet<String>>,
    capacity: AtomicUsize,
}

impl StatisticsRegistry {
    pub fn new() -> Self {
        StatisticsRegistry {
            entries: DashMap::new(),
            pending_children: DashMap::new(),
            capacity: AtomicUsize::new(DEFAULT_BUFFER_CAPACITY),
        }
    }

    /// A registry whose new entries get `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let registry = Self::new();
        registry.set_capacity(capacity)?;
        Ok(registry)
    }

    /// Capacity handed to entries created from now on.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Existing entries keep the capacity they were created with.
    pub fn set_capacity(&self, capacity: usize) -> Result<()> {
        if capacity < 1 {
            return Err(Error::InvalidCapacity(capacity));
        }
        self.capacity.store(capacity, Ordering::Relaxed);
        Ok(())
    }

    /// Records one sample and links it under `parent_identity`.
    pub fn record(
        &self,
        identity: &str,
        display_name: &str,
        duration: u64,
        threshold: Option<u64>,
        parent_identity: Option<&str>,
    ) {
        let (stats, created) = self.get_or_create(identity, display_name);
        stats.record(duration, threshold);

        if created {
            if let Some((_, children)) = self.pending_children.remove(identity) {
                for child in &children {
                    stats.add_child(child);
                }
            }
        }

        let Some(parent) = parent_identity.filter(|p| !p.is_empty()) else {
            return;
        };
        stats.set_parent(parent);
        match self.get(parent) {
            Some(parent_stats) => {
                parent_stats.add_child(identity);
            }
            None => {
                self.pending_children
                    .entry(parent.to_string())
                    .or_default()
                    .insert(identity.to_string());
                // The parent may have been created while we were parking the link.
                if let Some(parent_stats) = self.get(parent) {
                    if let Some((_, children)) = self.pending_children.remove(parent) {
                        for child in &children {
                            parent_stats.add_child(child);
                        }
                    }
                }
            }
        }
    }

    fn get_or_create(&self, identity: &str, display_name: &str) -> (Arc<MethodStatistics>, bool) {
        if let Some(existing) = self.get(identity) {
            return (existing, false);
        }
        let mut created = false;
        let entry = self.entries.entry(identity.to_string()).or_insert_with(|| {
            created = true;
            Arc::new(MethodStatistics::with_checked_capacity(
                identity,
                display_name,
                self.capacity(),
            ))
        });
        (Arc::clone(entry.value()), created)
    }

    pub fn get(&self, identity: &str) -> Option<Arc<MethodStatistics>> {
        self.entries
            .get(identity)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of one identity; the zero-valued "no data" view if unseen.
    pub fn snapshot_of(&self, identity: &str) -> StatisticsSnapshot {
        self.get(identity)
            .map(|stats| stats.snapshot())
            .unwrap_or_else(|| StatisticsSnapshot::empty(identity))
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshots of every entry, sorted by identity.
    pub fn snapshot(&self) -> Vec<StatisticsSnapshot> {
        let mut all: Vec<StatisticsSnapshot> = self
            .entries
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        all.sort_by(|a, b| a.identity.cmp(&b.identity));
        all
    }

    /// Drops every entry and parked link.
    pub fn reset(&self) {
        self.entries.clear();
        self.pending_children.clear();
    }
}

impl Default for StatisticsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
