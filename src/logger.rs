// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use std::fmt::Debug;

/// A destination for trace reports and diagnostics.
///
/// Where lines end up (terminal, file, a structured logging system) is entirely
/// up to the implementation; the engine only promises to hand over complete
/// records in emission order for any one thread.
pub trait Logger: Debug + Send + Sync {
    /**
        Submits the log record for logging.
    */
    fn finish_log_record(&self, record: LogRecord);

    /**
    The application may imminently exit.  Ensure all buffers are flushed and up to date.
    */
    fn prepare_to_die(&self);
}
