// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-specific time types for cross-platform compatibility.
//!
//! On native platforms these come from `std::time`, while on WASM they come
//! from `web_time`. Tracked durations are always measured with this
//! [`Instant`], so a trace recorded in the browser reads the same as one
//! recorded natively.

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};
