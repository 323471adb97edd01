// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! # sys::Mutex implementation of ForkSync
//!
//! This is a simple implementation of the Fork synchronizer that uses the port's locks wrapped in
//! `sys::Mutex`.  The ForkSync semantics map simply to these.

use log::warn;
use osal::sys::sync::{Lockable, Mutex};

use crate::{ForkSync, NUM_PHIL};

/// A simple implementation of ForkSync based on sys::Mutex, which uses explicit lock and release
/// semantics.
#[derive(Debug)]
pub struct SysMutexSync {
    locks: [Mutex; NUM_PHIL],
}

impl SysMutexSync {
    pub fn new() -> SysMutexSync {
        let locks = core::array::from_fn(|_| Mutex::new());
        SysMutexSync { locks }
    }
}

impl ForkSync for SysMutexSync {
    fn take(&self, index: usize) {
        if !self.locks[index].lock() {
            warn!("Fork {} could not be taken", index);
        }
    }

    fn release(&self, index: usize) {
        if !self.locks[index].unlock() {
            warn!("Fork {} could not be released", index);
        }
    }
}
