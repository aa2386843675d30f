// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::context::ItemHandle;
use crate::sys::{Duration, Instant};
use crate::{TimeUnit, Tracer};
use std::marker::PhantomData;

/**
Closes a tracked item when dropped.

Returned by [`Tracer::track`]. The item's duration is the time between the
call to `track` and the drop, in whatever unit was requested. Dropping happens
on every exit path, including early returns, `?` and panics, so the item is
always closed and the thread's trace always completes. A guard dropped by a
panic logs a warning naming its item first.

The guard is tied to the thread that created it: it cannot be sent elsewhere,
because the item it closes lives in that thread's trace.

```rust
use tracewise::{TrackOptions, TrackSpec, Tracer, TracerConfig};

fn checksum(tracer: &Tracer, data: &[u8]) -> Result<u32, tracewise::Error> {
    let _guard = tracer.track(TrackSpec::new("checksum", TrackOptions::new()))?;
    Ok(data.iter().map(|b| u32::from(*b)).sum())
}

let tracer = Tracer::new(TracerConfig::default()).unwrap();
tracer.sink().set_loggers(vec![]);
assert_eq!(checksum(&tracer, &[1, 2, 3]).unwrap(), 6);
assert!(!tracer.contexts().is_active());
```
*/
#[derive(Debug)]
#[must_use = "the item is closed as soon as the guard is dropped"]
pub struct TrackGuard {
    tracer: Tracer,
    handle: Option<ItemHandle>,
    unit: TimeUnit,
    start: Instant,
    _not_send: PhantomData<*const ()>,
}

impl TrackGuard {
    pub(crate) fn new(tracer: Tracer, handle: Option<ItemHandle>, unit: TimeUnit) -> Self {
        TrackGuard {
            tracer,
            handle,
            unit,
            start: Instant::now(),
            _not_send: PhantomData,
        }
    }

    /// The item this guard closes, or `None` for a disabled tracker.
    pub fn handle(&self) -> Option<ItemHandle> {
        self.handle
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TrackGuard {
    fn drop(&mut self) {
        let elapsed = Instant::now().duration_since(self.start);
        match self.handle {
            Some(handle) => {
                if std::thread::panicking() {
                    self.tracer.warn_unwinding(handle);
                }
                self.tracer.finish(handle, elapsed, self.unit)
            }
            None => self.tracer.finish_disabled(),
        }
    }
}
