//! Rust logging in osal
//!
//! The core logs through the `log` crate: lifecycle events of mutexes and threads at `trace` and
//! `debug`, failures reported by the port at `warn`.  Nothing is printed unless the application
//! installs a logger, either its own or the one provided here by [`set_logger`].
//!
//! The provided logger depends on what the target offers.  With `std`, messages go to standard
//! error.  Without it there is nowhere to send them, and [`set_logger`] does nothing.

use log::{Log, SetLoggerError};

use crate::kconfig::CONFIG_LOG_LEVEL;

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        mod impl_stderr;
        pub use impl_stderr::set_logger;
    } else {
        /// No logging is possible, provide an empty handler that does nothing.
        ///
        /// # Safety
        ///
        /// Always safe; kept unsafe to match the other logging backends.
        pub unsafe fn set_logger() -> Result<(), SetLoggerError> {
            Ok(())
        }
    }
}

// The Rust logging system has different entry points based on whether or not we are on a target
// with atomic pointers.  We will provide a single function for this, which will be safe or unsafe
// depending on this.  The safety has to do with initialization order, and as long as this is called
// before any other threads run, it should be safe.
cfg_if::cfg_if! {
    if #[cfg(target_has_atomic = "ptr")] {
        #[allow(dead_code)]
        unsafe fn set_logger_internal(logger: &'static dyn Log) -> Result<(), SetLoggerError> {
            log::set_logger(logger)?;
            log::set_max_level(CONFIG_LOG_LEVEL);
            Ok(())
        }
    } else {
        #[allow(dead_code)]
        unsafe fn set_logger_internal(logger: &'static dyn Log) -> Result<(), SetLoggerError> {
            log::set_logger_racy(logger)?;
            log::set_max_level_racy(CONFIG_LOG_LEVEL);
            Ok(())
        }
    }
}
