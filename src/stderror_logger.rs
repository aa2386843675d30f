// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use crate::logger::Logger;

/**
A reference logger that logs to stderr.

This is the primary sink a [crate::Tracer] starts with.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StdErrorLogger {}

impl StdErrorLogger {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Logger for StdErrorLogger {
    fn finish_log_record(&self, record: LogRecord) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::Write;
            let mut lock = std::io::stderr().lock();
            for part in record.parts {
                let _ = lock.write_all(part.as_bytes());
            }
            let _ = lock.write_all(b"\n");
        }
        #[cfg(target_arch = "wasm32")]
        {
            use crate::Level;
            let msg = record.parts.join("");
            match record.level() {
                Level::DebugInternal => {
                    web_sys::console::debug_1(&msg.into());
                }
                Level::Info => {
                    web_sys::console::info_1(&msg.into());
                }
                Level::Warning => {
                    web_sys::console::warn_1(&msg.into());
                }
                Level::Error => {
                    web_sys::console::error_1(&msg.into());
                }
            }
        }
    }

    fn prepare_to_die(&self) {
        //nothing to do since we are unbuffered
    }
}
