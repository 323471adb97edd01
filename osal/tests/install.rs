// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

// Installation of a port whose bring-up runs other threads.  This lives in its own test binary, as
// it installs a port other than the hosted one.

use std::thread;

use osal::raw::hosted::HostedPort;
use osal::raw::{Entry, LockHandle, Port, Result, ThreadAttrs, ThreadHandle};
use osal::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use osal::sys::sync::{Lockable, Mutex};
use osal::{Object, System};

static HOSTED: HostedPort = HostedPort::new();

/// A hosted port whose `initialize` asks, from a helper thread, whether a port is installed.
struct WatchedInit {
    initialized: AtomicUsize,
    saw_port: AtomicBool,
}

impl Port for WatchedInit {
    fn initialize(&self) -> Result<()> {
        let saw_port = thread::spawn(|| osal::sys::port().is_some())
            .join()
            .unwrap_or(true);
        self.saw_port.store(saw_port, Ordering::Release);
        self.initialized.fetch_add(1, Ordering::AcqRel);
        HOSTED.initialize()
    }

    fn create_thread(&self, entry: Entry, attrs: &ThreadAttrs) -> Result<ThreadHandle> {
        HOSTED.create_thread(entry, attrs)
    }

    fn join_thread(&self, thread: ThreadHandle) -> Result<()> {
        HOSTED.join_thread(thread)
    }

    fn yield_now(&self) {
        HOSTED.yield_now()
    }

    fn sleep_ms(&self, ms: u64) {
        HOSTED.sleep_ms(ms)
    }

    fn uptime_ms(&self) -> u64 {
        HOSTED.uptime_ms()
    }

    fn lock_init(&self) -> Result<LockHandle> {
        HOSTED.lock_init()
    }

    fn lock_destroy(&self, lock: LockHandle) {
        HOSTED.lock_destroy(lock)
    }

    fn lock_acquire(&self, lock: LockHandle) -> Result<()> {
        HOSTED.lock_acquire(lock)
    }

    fn lock_try_acquire(&self, lock: LockHandle) -> bool {
        HOSTED.lock_try_acquire(lock)
    }

    fn lock_release(&self, lock: LockHandle) -> Result<()> {
        HOSTED.lock_release(lock)
    }
}

static PORT: WatchedInit = WatchedInit {
    initialized: AtomicUsize::new(0),
    saw_port: AtomicBool::new(true),
};

#[test]
fn initialize_runs_outside_the_install_lock() {
    let system = System::new(&PORT);
    assert!(system.is_initialized());
    assert_eq!(PORT.initialized.load(Ordering::Acquire), 1);
    // The port is only published once its bring-up has finished.
    assert!(!PORT.saw_port.load(Ordering::Acquire));
    assert!(osal::sys::port().is_some());

    // A second fixture joins without initializing again.
    let again = System::new(&PORT);
    assert!(again.is_initialized());
    assert_eq!(PORT.initialized.load(Ordering::Acquire), 1);
    drop(again);

    let mutex = Mutex::new();
    assert!(mutex.is_constructed());
    assert!(mutex.lock());
    assert!(mutex.unlock());

    // A port that is merely different, and would initialize fine, is refused while this one is
    // installed.
    static OTHER: HostedPort = HostedPort::new();
    assert!(!System::new(&OTHER).is_initialized());

    drop(mutex);
    drop(system);
    assert!(osal::sys::port().is_none());
}
