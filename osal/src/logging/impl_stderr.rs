//! Logging to standard error
//!
//! This module implements a log handler (for the [`log`] crate) that writes messages to the host's
//! standard error.  Filtering is global, at [`CONFIG_LOG_LEVEL`].
//!
//! [`CONFIG_LOG_LEVEL`]: crate::kconfig::CONFIG_LOG_LEVEL

use std::eprintln;

use log::{Log, Metadata, Record, SetLoggerError};

/// A simple log handler, built around `eprintln`.
struct StderrLogger;

impl Log for StderrLogger {
    // The max level set by `set_logger` does the filtering.
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    // Each message is a single `eprintln`, so lines from different threads do not interleave.
    fn log(&self, record: &Record<'_>) {
        eprintln!("{}:{}: {}", record.level(), record.target(), record.args());
    }

    // Standard error is not buffered.
    fn flush(&self) {}
}

static STDERR_LOGGER: StderrLogger = StderrLogger;

/// Set the log handler to log messages to standard error.
///
/// # Safety
///
/// This is unsafe due to racy issues in the log framework on targets that do not support atomic
/// pointers.  As long as this is called ever by a single thread, it is safe to use.
pub unsafe fn set_logger() -> Result<(), SetLoggerError> {
    super::set_logger_internal(&STDERR_LOGGER)
}
