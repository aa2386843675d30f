// SPDX-License-Identifier: MIT OR Apache-2.0

use super::ThreadTraceContext;
use crate::{Level, LogRecord, LogSink};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // One slot per registry, so independent tracers on the same thread never
    // see each other's traces.
    static CONTEXTS: RefCell<HashMap<u64, ThreadTraceContext>> = RefCell::new(HashMap::new());
}

/**
Hands out the calling thread's active [`ThreadTraceContext`].

Storage is thread-local: a thread only ever reads and writes its own slot, so
there is no locking on this path. The registry itself is just a key into that
storage plus the sink its lifecycle diagnostics go to.

A context must be [`discard`](Self::discard)ed exactly once, when its depth
returns to zero. A context that is never discarded stays alive until its
thread exits.

```rust
use tracewise::LogSink;
use tracewise::context::ContextRegistry;

let registry = ContextRegistry::new(LogSink::default());
assert!(!registry.is_active());
let trace_id = registry.get_or_create(|ctx| ctx.trace_id());
assert!(registry.is_active());
assert_eq!(registry.discard().map(|ctx| ctx.trace_id()), Some(trace_id));
assert!(!registry.is_active());
```
*/
#[derive(Debug)]
pub struct ContextRegistry {
    id: u64,
    sink: LogSink,
}

impl ContextRegistry {
    pub fn new(sink: LogSink) -> Self {
        ContextRegistry {
            id: REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            sink,
        }
    }

    /// Runs `f` on this thread's context, creating one first if needed.
    ///
    /// `f` must not call back into any registry on this thread. Diagnostics are
    /// emitted after the thread's slots are released, so loggers may trace.
    pub fn get_or_create<R>(&self, f: impl FnOnce(&mut ThreadTraceContext) -> R) -> R {
        let (result, created) = CONTEXTS.with_borrow_mut(|contexts| {
            let mut created = None;
            let ctx = contexts.entry(self.id).or_insert_with(|| {
                let ctx = ThreadTraceContext::new();
                created = Some(ctx.trace_id());
                ctx
            });
            (f(ctx), created)
        });
        if let Some(trace_id) = created {
            self.sink.emit(LogRecord::line(
                Level::DebugInternal,
                format!("tracewise: created trace context {trace_id}"),
            ));
        }
        result
    }

    /// Runs `f` on this thread's context, if there is one.
    ///
    /// Like [`get_or_create`](Self::get_or_create), `f` must not log or trace.
    pub fn with_active<R>(&self, f: impl FnOnce(&mut ThreadTraceContext) -> R) -> Option<R> {
        CONTEXTS.with_borrow_mut(|contexts| contexts.get_mut(&self.id).map(f))
    }

    /// Whether the calling thread has a context in this registry.
    pub fn is_active(&self) -> bool {
        CONTEXTS.with_borrow(|contexts| contexts.contains_key(&self.id))
    }

    /// Removes and returns the calling thread's context.
    pub fn discard(&self) -> Option<ThreadTraceContext> {
        let ctx = CONTEXTS.with_borrow_mut(|contexts| contexts.remove(&self.id))?;
        self.sink.emit(LogRecord::line(
            Level::DebugInternal,
            format!(
                "tracewise: discarded trace context {} ({} items)",
                ctx.trace_id(),
                ctx.items().len()
            ),
        ));
        Some(ctx)
    }
}

impl Drop for ContextRegistry {
    fn drop(&mut self) {
        // Only this thread's slot is reachable; other threads drop theirs on exit.
        let _ = CONTEXTS.try_with(|contexts| {
            if let Ok(mut contexts) = contexts.try_borrow_mut() {
                contexts.remove(&self.id);
            }
        });
    }
}
