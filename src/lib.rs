//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# tracewise

tracewise is a per-thread call-tree tracer. It measures how long annotated
functions and blocks take, keeps track of which ones ran inside which, and
writes one report per outermost call.

# Development status

tracewise is experimental and the API may change.

# The problem

A flat list of timings says that something was slow, but not what it was
slow *inside of*. A profiler answers that, but it is heavy, and usually not
something you leave on in production.

tracewise sits in between. You mark the operations you care about and get a
tree for every request, job or frame:

```text
Trace context id: 8c3f6a0e-... | Trace timestamp: 2024-05-01T09:30:12.041Z
{===== Start of trace context id: 8c3f6a0e-... =====}
handle_request(req: &Request) - 412 ms ¤ [Threshold Exceed !!: 200 ms]
  |-- load_user(id: u64) - Args: [id=7] - 380 ms
    |-- query(sql: &str) - 377 ms
{====== End of trace context id: 8c3f6a0e-... ======}
```

# Thresholds

Most of the time, most calls are fast, and a report full of fast calls is
noise. Give an operation a threshold and it is only shown when it ran at
least that long. A fast operation is hidden along with everything it called,
while its siblings are still judged on their own. When everything in a
trace was fast, the whole report collapses to a single summary line.

# The API

Everything goes through a [`Tracer`]. There is no global instance: build one,
and hand it to whatever needs it.

```rust
use tracewise::{TrackOptions, Tracer, TracerConfig};

let tracer = Tracer::new(TracerConfig::default()).unwrap();

let total = tracer.measure("sum", || {
    tracer.measure_with("fetch", &TrackOptions::new().with_threshold(50), || ()).unwrap();
    (1..=10).sum::<u32>()
}).unwrap();
assert_eq!(total, 55);
```

For functions, the [`track`] attribute wraps the body:

```rust
use std::sync::LazyLock;
use tracewise::{Tracer, TracerConfig};

static TRACER: LazyLock<Tracer> =
    LazyLock::new(|| Tracer::new(TracerConfig::default()).unwrap());

#[tracewise::track(tracer = TRACER, args)]
fn scale(value: u32, factor: u32) -> u32 {
    value * factor
}

assert_eq!(scale(3, 4), 12);
```

# Statistics

With statistics enabled, every finished operation also feeds a rolling
window of samples, which can be queried ([`statistics::MethodStatistics`]) or
rendered as text, JSON or HTML ([`statistics::generate_report`]).

# Multithreading

Each thread records its own trace. A tracer can be shared freely between
threads, and the statistics registry behind it is safe to update from all of
them at once.
*/

extern crate self as tracewise;

mod config;
pub mod context;
mod error;
mod formatter;
mod guard;
mod inmemory_logger;
mod level;
mod log_record;
mod logger;
mod macros;
mod sink;
pub mod statistics;
mod stderror_logger;
mod sys;
mod tracer;
mod unit;

pub use config::{DEFAULT_BUFFER_CAPACITY, TracerConfig, TrackOptions};
pub use error::{Error, Result};
pub use formatter::{NO_TRACKER_MESSAGE, TraceFormatter, suppressed_mask};
pub use guard::TrackGuard;
pub use inmemory_logger::InMemoryLogger;
pub use level::Level;
pub use log_record::LogRecord;
pub use logger::Logger;
pub use sink::LogSink;
pub use stderror_logger::StdErrorLogger;
pub use tracer::{Describe, Description, TrackSpec, Tracer};
pub use unit::TimeUnit;

/**
Tracks every call of a function.

```text
#[tracewise::track(tracer = EXPR, threshold = N, unit = millis, args, enabled = BOOL, id = "...")]
```

* `tracer` (required): an expression evaluating to a [`Tracer`] or a
  reference to one, evaluated on each call.
* `threshold`: hide calls faster than this. Defaults to none.
* `unit`: `seconds`, `millis` (default) or `micros`.
* `args`: also render each named argument with `Debug`.
* `enabled`: `false` leaves the function untracked.
* `id`: statistics identity. Defaults to `module_path::function_name`.

The label is the function's signature, such as `scale(value: u32, factor: u32)`.
`async fn` is not supported.
*/
pub use tracewise_proc::track;

#[doc(hidden)]
pub mod hidden {
    pub use crate::macros::{ArgsFormatter, track_fn};
}
