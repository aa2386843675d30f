//SPDX-License-Identifier: MIT OR Apache-2.0

//! # tracewise procedural macros
//!
//! This crate provides the `#[track]` attribute for the tracewise tracer. It
//! is re-exported as `tracewise::track` and should be used from there.
//!
//! Token handling is hand-rolled on top of `proc_macro`, without `syn`.
//!
//! ## Expansion
//!
//! ```rust
//! # use std::sync::LazyLock;
//! # use tracewise::{Tracer, TracerConfig};
//! # static TRACER: LazyLock<Tracer> = LazyLock::new(|| Tracer::new(TracerConfig::default()).unwrap());
//! #[tracewise::track(tracer = TRACER, threshold = 10, args)]
//! fn area(width: u32, height: u32) -> u32 {
//!     width * height
//! }
//! # TRACER.sink().set_loggers(vec![]);
//! # assert_eq!(area(2, 3), 6);
//! ```
//!
//! expands to approximately:
//!
//! ```ignore
//! fn area(width: u32, height: u32) -> u32 {
//!     let __tracewise_guard = ::tracewise::hidden::track_fn(
//!         &(TRACER),
//!         "area(width: u32, height: u32)",
//!         concat!(module_path!(), "::", "area"),
//!         { /* ArgsFormatter: "width=2, height=3" */ },
//!         10u64,
//!         ::tracewise::TimeUnit::Millis,
//!         true,
//!     );
//!     { width * height }
//! }
//! ```

mod parser;
mod track;

use proc_macro::TokenStream;

/// Tracks every call of the annotated function with a tracewise `Tracer`.
///
/// See `tracewise::track` for the options.
#[proc_macro_attribute]
pub fn track(attr: TokenStream, item: TokenStream) -> TokenStream {
    track::track_impl(attr, item)
}
