// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! A port for platforms without threading support.
//!
//! Every resource request fails with `ENODEV`.  Objects constructed on this port are therefore
//! never valid, which makes it useful for checking that the core degrades to failure results
//! instead of blocking.

use crate::{Entry, Error, LockHandle, Port, Result, ThreadAttrs, ThreadHandle, ENODEV};

/// The port that has nothing to offer.
#[derive(Debug, Default)]
pub struct NullPort;

impl Port for NullPort {
    fn initialize(&self) -> Result<()> {
        Err(Error(ENODEV))
    }

    fn create_thread(&self, _entry: Entry, _attrs: &ThreadAttrs) -> Result<ThreadHandle> {
        Err(Error(ENODEV))
    }

    fn join_thread(&self, _thread: ThreadHandle) -> Result<()> {
        Err(Error(ENODEV))
    }

    fn yield_now(&self) {}

    fn sleep_ms(&self, _ms: u64) {}

    fn uptime_ms(&self) -> u64 {
        0
    }

    fn lock_init(&self) -> Result<LockHandle> {
        Err(Error(ENODEV))
    }

    fn lock_destroy(&self, _lock: LockHandle) {}

    fn lock_acquire(&self, _lock: LockHandle) -> Result<()> {
        Err(Error(ENODEV))
    }

    fn lock_try_acquire(&self, _lock: LockHandle) -> bool {
        false
    }

    fn lock_release(&self, _lock: LockHandle) -> Result<()> {
        Err(Error(ENODEV))
    }
}
