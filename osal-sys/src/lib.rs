// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Porting layer for osal
//!
//! This crate holds the boundary between the osal synchronization core and the platform that
//! actually creates threads and implements low-level locks.  Everything the core does is built
//! on the small capability set of the [`Port`] trait.  A board support package implements
//! [`Port`] for its kernel; the `hosted` port implements it on top of the host operating system
//! so that the core can be run and tested on a development machine.
//!
//! Failures at this level are reported with errno style codes, in the same spirit as a C kernel
//! API returning negative values.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use alloc::boxed::Box;
use core::fmt;

#[cfg(feature = "std")]
pub mod hosted;
pub mod null;

/// Operation not permitted.
pub const EPERM: u32 = 1;
/// No such thread.
pub const ESRCH: u32 = 3;
/// Try again.
pub const EAGAIN: u32 = 11;
/// Out of memory.
pub const ENOMEM: u32 = 12;
/// Device or resource busy.
pub const EBUSY: u32 = 16;
/// No such device.
pub const ENODEV: u32 = 19;
/// Invalid argument.
pub const EINVAL: u32 = 22;
/// Operation canceled.
pub const ECANCELED: u32 = 125;

/// An error reported by a port.
///
/// Wraps the (positive) errno value for the failure.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Error(pub u32);

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port error errno:{}", self.0)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port error errno:{}", self.0)
    }
}

/// Wraps a value with a possible port error.
pub type Result<T> = core::result::Result<T, Error>;

/// Opaque reference to a lock resource owned by a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LockHandle(pub usize);

/// Opaque reference to a thread of control owned by a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThreadHandle(pub usize);

/// The code a new thread runs.
pub type Entry = Box<dyn FnOnce() + Send + 'static>;

/// Options given to thread creation.
#[derive(Clone, Copy, Debug)]
pub struct ThreadAttrs {
    /// Scheduling priority, in the range understood by the port.
    pub priority: i32,
    /// Requested stack size in bytes.  Zero selects the port's default.
    pub stack_size: usize,
    /// Optional thread name, for debugging.
    pub name: Option<&'static str>,
}

/// The capabilities a platform supplies to the synchronization core.
///
/// All operations must be callable from any thread.  Locks handed out by `lock_init` are plain
/// binary locks: they do not record an owner, so `lock_release` may be called from a thread other
/// than the one that acquired.
pub trait Port: Send + Sync {
    /// Bring up the platform.  Called once when the port is installed.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Tear down the platform.  Called when the last user uninstalls the port.
    fn deinitialize(&self) {}

    /// Create and schedule a new thread running `entry`.
    fn create_thread(&self, entry: Entry, attrs: &ThreadAttrs) -> Result<ThreadHandle>;

    /// Wait for a thread to finish, retiring its handle.
    ///
    /// Returns an error if the handle is unknown, or the thread terminated abnormally.  The handle
    /// is retired in both cases.
    fn join_thread(&self, thread: ThreadHandle) -> Result<()>;

    /// Give up the processor to another ready thread.
    fn yield_now(&self);

    /// Suspend the calling thread for at least the given number of milliseconds.
    fn sleep_ms(&self, ms: u64);

    /// Milliseconds since the port was brought up.
    fn uptime_ms(&self) -> u64;

    /// Allocate a new lock resource, in the unlocked state.
    fn lock_init(&self) -> Result<LockHandle>;

    /// Return a lock resource to the port.
    fn lock_destroy(&self, lock: LockHandle);

    /// Acquire the lock, blocking the calling thread as long as necessary.
    fn lock_acquire(&self, lock: LockHandle) -> Result<()>;

    /// Acquire the lock only if that is possible without waiting.
    fn lock_try_acquire(&self, lock: LockHandle) -> bool;

    /// Release a held lock.
    fn lock_release(&self, lock: LockHandle) -> Result<()>;
}
