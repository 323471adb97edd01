// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Build-time configuration.
//!
//! These play the role of a kernel's Kconfig values: fixed when the crate is built, and used to
//! size resources and tune the defaults of the core.

#![allow(missing_docs)]

use log::LevelFilter;

/// Capacity of the lock table of the hosted port installed by [`System::hosted`].
///
/// [`System::hosted`]: crate::System::hosted
pub const CONFIG_MAX_LOCKS: usize = 256;

/// Maximum number of unjoined threads of the hosted port installed by [`System::hosted`].
///
/// [`System::hosted`]: crate::System::hosted
pub const CONFIG_MAX_THREADS: usize = 64;

/// Stack size requested for new threads when neither the task nor the thread asks for one.  Zero
/// leaves the choice to the port.
pub const CONFIG_THREAD_STACK_SIZE: usize = 0;

/// Iteration budget for cooperative polling loops.
pub const CONFIG_WAIT_CYCLES: u32 = 1_000_000;

/// Maximum log level enabled by [`set_logger`].
///
/// [`set_logger`]: crate::set_logger
pub const CONFIG_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Ticks per second of the system clock.
pub const CONFIG_SYS_FREQUENCY: u32 = 1000;
