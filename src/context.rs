// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-thread call-tree recording.
//!
//! Each thread that runs a tracked operation gets one [`ThreadTraceContext`],
//! handed out by a [`ContextRegistry`]. Every tracked operation appends a
//! [`TraceItem`] carrying the depth it ran at, so the call tree is encoded
//! without any parent pointers:
//!
//! ```text
//! index  depth  label
//! 0      0      handle_request
//! 1      1      load_user          parent: 0
//! 2      2      query              parent: 1
//! 3      1      render             parent: 0
//! ```
//!
//! # Lifecycle
//!
//! 1. The first `begin` on a thread with no active context creates one, with a
//!    fresh trace id and the current timestamp.
//! 2. Every nested `begin` appends to the same context and descends one level.
//! 3. Every `end` climbs one level. The `end` that brings the depth back to
//!    zero completes the trace: the context is discarded and rendered.
//!
//! `begin` and `end` must be strictly paired, even when the tracked work
//! panics. [`Tracer::track`](crate::Tracer::track) takes care of this with a
//! drop guard; code driving a context by hand has to do it itself.
//!
//! ```rust
//! use tracewise::{LogSink, TimeUnit};
//! use tracewise::context::ContextRegistry;
//!
//! let registry = ContextRegistry::new(LogSink::default());
//! let root = registry.get_or_create(|ctx| ctx.begin("root", None, None)).unwrap();
//! let done = registry
//!     .get_or_create(|ctx| ctx.end(root, 3, TimeUnit::Millis))
//!     .unwrap();
//! assert!(done);
//! let finished = registry.discard().unwrap();
//! assert_eq!(finished.items()[0].duration(), Some(3));
//! ```

mod item;
mod registry;
mod thread_context;


pub use item::{ItemHandle, Measurement, TraceItem};
pub use registry::ContextRegistry;
pub use thread_context::ThreadTraceContext;
