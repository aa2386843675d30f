// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log record type.
//!
//! A [`LogRecord`] accumulates message parts and is then handed, by value, to
//! every [`Logger`](crate::Logger) of a [`LogSink`](crate::LogSink). Parts are
//! only joined when a logger needs the final text.
//!
//! ```rust
//! use tracewise::{LogRecord, Level};
//!
//! let mut record = LogRecord::new(Level::Info);
//! record.log("checkout");
//! record.log_owned(format!(" - {} ms", 42));
//! assert_eq!(record.to_string(), "checkout - 42 ms");
//! ```

use crate::Level;
use std::fmt::{Debug, Display};

/**
A log record.

1.  Create a new [LogRecord].
2.  Progressively write to the [LogRecord].
3.  Submit it to a [crate::LogSink], which forwards it to each [crate::Logger].
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogRecord {
    pub(crate) parts: Vec<String>,
    level: Level,
}

impl LogRecord {
    pub fn new(level: Level) -> Self {
        Self {
            parts: Vec::new(),
            level,
        }
    }

    /// Creates a record holding a single, already rendered line.
    pub fn line(level: Level, line: String) -> Self {
        Self {
            parts: vec![line],
            level,
        }
    }

    /**
    Append the message to the record.
    */
    pub fn log(&mut self, message: &str) {
        self.parts.push(message.to_string());
    }

    /**
    Append the message to the record, taking ownership of the message.
    */
    pub fn log_owned(&mut self, message: String) {
        self.parts.push(message);
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for LogRecord {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for part in &self.parts {
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}
/*
Boilerplate notes for LogRecord:

- Clone: records are fanned out to every logger of a sink
- PartialEq/Eq/Hash: lets tests compare captured records
- Default: Info level, empty parts
- Copy/Ord: no
*/
