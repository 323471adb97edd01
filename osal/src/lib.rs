// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Mutual exclusion and thread tasks for embedded applications
//!
//! This crate provides a small synchronization core, written against a porting layer rather than
//! a particular kernel.  It is meant for environments where heap and unwinding support may be
//! restricted: every constructible object can fail to initialize, reports that through
//! `is_constructed()`, and every further operation reports failure with a plain `bool` instead of
//! panicking.
//!
//! The platform is reached through the [`Port`](osal_sys::Port) trait from `osal-sys`.  A
//! [`System`] instance installs the port, and must exist before any [`sys::sync::Mutex`] or
//! [`sys::thread::Thread`] is created.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod kconfig;
pub mod logging;
pub mod object;
pub mod sync;
pub mod sys;
pub mod system;
pub mod time;

pub use error::{Error, ErrorKind, Result};
pub use object::Object;
pub use system::System;

pub use logging::set_logger;

/// Re-export of osal-sys as `osal::raw`.
pub mod raw {
    pub use osal_sys::*;
}
