// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Hosted port.
//!
//! Implements [`Port`] on top of the host operating system, using `std` threads and blocking
//! primitives.  This is what the core runs on during development and testing.
//!
//! Resources are kept in fixed capacity tables, mirroring the statically sized object pools of a
//! small kernel.  When a table is full, construction fails with `ENOMEM` (locks) or `EAGAIN`
//! (threads), which allows exhaustion to be exercised on the host.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use std::vec::Vec;

use crate::{
    Entry, Error, LockHandle, Port, Result, ThreadAttrs, ThreadHandle, EAGAIN, ECANCELED, EINVAL,
    ENOMEM, EPERM, ESRCH,
};

/// Capacities of the hosted resource tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of live locks.
    pub locks: usize,
    /// Maximum number of threads that have been created and not yet joined.
    pub threads: usize,
}

impl Limits {
    /// Default capacities.
    pub const DEFAULT: Limits = Limits { locks: 256, threads: 64 };
}

impl Default for Limits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A binary lock without ownership.
///
/// The flag records whether the lock is held, and the condition variable wakes a waiter when it
/// is released.  Since no owner is recorded, any thread may release.
struct HostedLock {
    locked: Mutex<bool>,
    released: Condvar,
}

impl HostedLock {
    fn new() -> Self {
        Self {
            locked: Mutex::new(false),
            released: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, bool> {
        // Nothing foreign runs while the flag is held, so poisoning cannot leave it inconsistent.
        self.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) {
        let mut locked = self.state();
        while *locked {
            locked = self
                .released
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    fn try_acquire(&self) -> bool {
        let mut locked = self.state();
        if *locked {
            false
        } else {
            *locked = true;
            true
        }
    }

    fn release(&self) -> Result<()> {
        let mut locked = self.state();
        if !*locked {
            return Err(Error(EPERM));
        }
        *locked = false;
        drop(locked);
        self.released.notify_one();
        Ok(())
    }
}

/// A fixed capacity table of resources, addressed by slot index plus one.
struct Table<T> {
    slots: Vec<Option<T>>,
}

impl<T> Table<T> {
    const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn insert(&mut self, capacity: usize, item: T) -> Option<usize> {
        if let Some(index) = self.slots.iter().position(Option::is_none) {
            self.slots[index] = Some(item);
            return Some(index + 1);
        }
        if self.slots.len() < capacity {
            self.slots.push(Some(item));
            return Some(self.slots.len());
        }
        None
    }

    fn get(&self, handle: usize) -> Option<&T> {
        handle
            .checked_sub(1)
            .and_then(|index| self.slots.get(index))
            .and_then(Option::as_ref)
    }

    fn take(&mut self, handle: usize) -> Option<T> {
        handle
            .checked_sub(1)
            .and_then(|index| self.slots.get_mut(index))
            .and_then(Option::take)
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// The port running on the host operating system.
pub struct HostedPort {
    limits: Limits,
    locks: Mutex<Table<Arc<HostedLock>>>,
    threads: Mutex<Table<JoinHandle<()>>>,
    epoch: OnceLock<Instant>,
}

impl HostedPort {
    /// Construct a hosted port with the default capacities.
    pub const fn new() -> Self {
        Self::with_limits(Limits::DEFAULT)
    }

    /// Construct a hosted port with the given capacities.
    pub const fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            locks: Mutex::new(Table::new()),
            threads: Mutex::new(Table::new()),
            epoch: OnceLock::new(),
        }
    }

    /// The capacities of this port.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Number of live lock resources.
    pub fn lock_count(&self) -> usize {
        lock_table(&self.locks).len()
    }

    /// Number of created threads that have not been joined.
    pub fn thread_count(&self) -> usize {
        lock_table(&self.threads).len()
    }

    fn lock(&self, lock: LockHandle) -> Result<Arc<HostedLock>> {
        lock_table(&self.locks)
            .get(lock.0)
            .cloned()
            .ok_or(Error(EINVAL))
    }
}

impl Default for HostedPort {
    fn default() -> Self {
        Self::new()
    }
}

// The tables only hold plain data, so a panic while they are locked leaves nothing half updated.
fn lock_table<T>(table: &Mutex<Table<T>>) -> MutexGuard<'_, Table<T>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Port for HostedPort {
    fn initialize(&self) -> Result<()> {
        self.epoch.get_or_init(Instant::now);
        Ok(())
    }

    fn create_thread(&self, entry: Entry, attrs: &ThreadAttrs) -> Result<ThreadHandle> {
        let mut threads = lock_table(&self.threads);
        if threads.len() >= self.limits.threads {
            return Err(Error(EAGAIN));
        }

        // The host scheduler has no notion of our priorities, so they are not applied.
        let mut builder = thread::Builder::new();
        if attrs.stack_size > 0 {
            builder = builder.stack_size(attrs.stack_size);
        }
        if let Some(name) = attrs.name {
            builder = builder.name(name.into());
        }
        let join = builder.spawn(entry).map_err(|_| Error(EAGAIN))?;

        threads
            .insert(self.limits.threads, join)
            .map(ThreadHandle)
            .ok_or(Error(EAGAIN))
    }

    fn join_thread(&self, thread: ThreadHandle) -> Result<()> {
        // Take the handle out first, so other threads are not held off while this one waits.
        let join = lock_table(&self.threads)
            .take(thread.0)
            .ok_or(Error(ESRCH))?;
        join.join().map_err(|_| Error(ECANCELED))
    }

    fn yield_now(&self) {
        thread::yield_now();
    }

    fn sleep_ms(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }

    fn uptime_ms(&self) -> u64 {
        let epoch = self.epoch.get_or_init(Instant::now);
        u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn lock_init(&self) -> Result<LockHandle> {
        lock_table(&self.locks)
            .insert(self.limits.locks, Arc::new(HostedLock::new()))
            .map(LockHandle)
            .ok_or(Error(ENOMEM))
    }

    fn lock_destroy(&self, lock: LockHandle) {
        lock_table(&self.locks).take(lock.0);
    }

    fn lock_acquire(&self, lock: LockHandle) -> Result<()> {
        // Clone the lock out of the table before blocking on it.
        self.lock(lock)?.acquire();
        Ok(())
    }

    fn lock_try_acquire(&self, lock: LockHandle) -> bool {
        self.lock(lock).map(|lock| lock.try_acquire()).unwrap_or(false)
    }

    fn lock_release(&self, lock: LockHandle) -> Result<()> {
        self.lock(lock)?.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn attrs() -> ThreadAttrs {
        ThreadAttrs { priority: 5, stack_size: 0, name: Some("hosted-test") }
    }

    #[test]
    fn lock_is_binary() {
        let port = HostedPort::new();
        let lock = port.lock_init().unwrap();
        assert!(port.lock_try_acquire(lock));
        assert!(!port.lock_try_acquire(lock));
        port.lock_release(lock).unwrap();
        assert!(port.lock_try_acquire(lock));
        port.lock_release(lock).unwrap();
        port.lock_destroy(lock);
        assert_eq!(port.lock_count(), 0);
    }

    #[test]
    fn release_of_free_lock_is_refused() {
        let port = HostedPort::new();
        let lock = port.lock_init().unwrap();
        assert_eq!(port.lock_release(lock), Err(Error(EPERM)));
    }

    #[test]
    fn unknown_lock_is_invalid() {
        let port = HostedPort::new();
        assert_eq!(port.lock_acquire(LockHandle(7)), Err(Error(EINVAL)));
        assert!(!port.lock_try_acquire(LockHandle(0)));
    }

    #[test]
    fn lock_table_exhaustion() {
        let port = HostedPort::with_limits(Limits { locks: 2, threads: 1 });
        let a = port.lock_init().unwrap();
        let _b = port.lock_init().unwrap();
        assert_eq!(port.lock_init(), Err(Error(ENOMEM)));
        port.lock_destroy(a);
        assert!(port.lock_init().is_ok());
    }

    #[test]
    fn release_from_another_thread() {
        let port = Arc::new(HostedPort::new());
        let lock = port.lock_init().unwrap();
        port.lock_acquire(lock).unwrap();

        let other = port.clone();
        thread::spawn(move || other.lock_release(lock))
            .join()
            .unwrap()
            .unwrap();
        assert!(port.lock_try_acquire(lock));
    }

    #[test]
    fn thread_runs_and_joins() {
        static RAN: AtomicBool = AtomicBool::new(false);
        let port = HostedPort::new();
        let handle = port
            .create_thread(Box::new(|| RAN.store(true, Ordering::Release)), &attrs())
            .unwrap();
        port.join_thread(handle).unwrap();
        assert!(RAN.load(Ordering::Acquire));
        assert_eq!(port.thread_count(), 0);
        assert_eq!(port.join_thread(handle), Err(Error(ESRCH)));
    }

    #[test]
    fn thread_table_exhaustion() {
        let port = HostedPort::with_limits(Limits { locks: 1, threads: 1 });
        let first = port.create_thread(Box::new(|| ()), &attrs()).unwrap();
        let second = port.create_thread(Box::new(|| ()), &attrs());
        assert_eq!(second.err(), Some(Error(EAGAIN)));
        port.join_thread(first).unwrap();
    }

    #[test]
    fn panicking_thread_reports_canceled() {
        let port = HostedPort::new();
        let handle = port
            .create_thread(Box::new(|| panic!("entry failed")), &attrs())
            .unwrap();
        assert_eq!(port.join_thread(handle), Err(Error(ECANCELED)));
    }
}
