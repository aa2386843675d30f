// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-trace timing statistics.
//!
//! Where a rendered trace shows one invocation, the statistics registry keeps
//! a rolling window of samples per tracked operation across all of them. It is
//! fed by a [`Tracer`](crate::Tracer) when statistics are enabled, one sample
//! (in milliseconds) per finished item:
//!
//! ```rust
//! use tracewise::{Tracer, TracerConfig};
//!
//! let tracer = Tracer::new(TracerConfig::default().with_statistics(true)).unwrap();
//! tracer.sink().set_loggers(vec![]);
//! for _ in 0..3 {
//!     tracer.measure("rebuild index", || ()).unwrap();
//! }
//! let stats = tracer.statistics().get("Block:rebuild index").unwrap();
//! assert_eq!(stats.sample_count(), 3);
//! ```
//!
//! Aggregates are only computed when read, through
//! [`MethodStatistics`] accessors, a [`StatisticsSnapshot`], or one of the
//! [`report`] formats.

mod method_statistics;
mod registry;
pub mod report;

pub use method_statistics::{MethodStatistics, StatisticsSnapshot};
pub use registry::StatisticsRegistry;
pub use report::{ReportFormat, StatisticsReport, generate_report, generate_report_at};
