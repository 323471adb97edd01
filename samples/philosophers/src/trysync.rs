// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! # Polling implementation of ForkSync
//!
//! Forks are the same `sys::Mutex` as in [`crate::sysmutex`], but a philosopher never blocks on
//! one.  It polls with `try_lock`, yielding between attempts.

use osal::sync::atomic::{AtomicU64, Ordering};
use osal::sys::sync::{Lockable, Mutex};
use osal::sys::thread::yield_now;
use osal::Object;

use crate::{ForkSync, NUM_PHIL};

#[derive(Debug)]
pub struct TryLockSync {
    locks: [Mutex; NUM_PHIL],
    /// Failed attempts, over all forks.
    misses: AtomicU64,
}

impl TryLockSync {
    pub fn new() -> TryLockSync {
        TryLockSync {
            locks: core::array::from_fn(|_| Mutex::new()),
            misses: AtomicU64::new(0),
        }
    }
}

impl ForkSync for TryLockSync {
    fn take(&self, index: usize) {
        // An unconstructed fork can never be taken, don't spin on it.
        if !self.locks[index].is_constructed() {
            return;
        }
        while !self.locks[index].try_lock() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            yield_now();
        }
    }

    fn release(&self, index: usize) {
        self.locks[index].unlock();
    }
}

impl Drop for TryLockSync {
    fn drop(&mut self) {
        log::info!("Forks were busy {} times", self.misses.load(Ordering::Relaxed));
    }
}
