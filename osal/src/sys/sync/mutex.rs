// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Port lock wrapper.
//!
//! This module implements a thin wrapper around a lock resource of the installed [`Port`].  The
//! lock is a plain binary lock: it is either held or not, and it does not remember who holds it.

use core::fmt;

use log::{trace, warn};
use osal_sys::{LockHandle, Port};

use crate::error::{Context, ErrorKind, Result};
use crate::object::Object;

/// The lock, unlock, try-lock capability.
///
/// Consumers that only need to serialize access can take a `&dyn Lockable`, and work with any
/// lock type.
pub trait Lockable: Object {
    /// Acquire the lock, blocking the calling thread until it is available.
    ///
    /// Returns `true` once the lock is held, `false` if the lock is not constructed or the port
    /// reported an error.
    fn lock(&self) -> bool;

    /// Acquire the lock if that is possible without waiting.
    ///
    /// Returns `true` if the lock is now held by the caller.  Never blocks.
    fn try_lock(&self) -> bool;

    /// Release the lock.
    ///
    /// Returns `false` if the lock is not constructed or the port could not release it.
    fn unlock(&self) -> bool;
}

/// A port lock usable from safe Rust code.
///
/// A `Mutex` starts unlocked.  At most one thread holds it at any time; any number of threads may
/// share it by reference (`&Mutex` or an [`Arc`]).  No order is guaranteed among threads waiting
/// in [`lock`].
///
/// Ownership is not tracked.  Calling [`unlock`] without holding the lock is a caller error that
/// this type does not detect, and neither is dropping a locked mutex.  Attempts to lock a mutex
/// recursively from the same thread will deadlock.
///
/// [`lock`]: Lockable::lock
/// [`unlock`]: Lockable::unlock
/// [`Arc`]: crate::sync::Arc
pub struct Mutex {
    /// The port owning the lock resource.  `None` if no port was available.
    port: Option<&'static dyn Port>,
    /// The raw lock.  `None` if construction failed.
    item: Option<LockHandle>,
}

impl Mutex {
    /// Construct a mutex on the installed port.
    ///
    /// Check [`is_constructed`](Object::is_constructed) before relying on it.  If no [`System`]
    /// has installed a port, the mutex is not constructed.
    ///
    /// [`System`]: crate::System
    pub fn new() -> Mutex {
        match crate::sys::port() {
            Some(port) => Mutex::new_on(port),
            None => {
                warn!("Mutex constructed without an installed port");
                Mutex { port: None, item: None }
            }
        }
    }

    /// Construct a mutex with a lock from the given port.
    pub fn new_on(port: &'static dyn Port) -> Mutex {
        match port.lock_init().context(ErrorKind::Construction) {
            Ok(item) => {
                trace!("Mutex {:?} constructed", item);
                Mutex { port: Some(port), item: Some(item) }
            }
            Err(err) => {
                warn!("Mutex construction failed: {}", err);
                Mutex { port: Some(port), item: None }
            }
        }
    }

    /// Construct a mutex on the installed port, reporting failure as an error.
    pub fn create() -> Result<Mutex> {
        let port = crate::sys::port()
            .ok_or(osal_sys::Error(osal_sys::ENODEV))
            .context(ErrorKind::Construction)?;
        Mutex::create_on(port)
    }

    /// Construct a mutex with a lock from the given port, reporting failure as an error.
    pub fn create_on(port: &'static dyn Port) -> Result<Mutex> {
        let item = port.lock_init().context(ErrorKind::Construction)?;
        Ok(Mutex { port: Some(port), item: Some(item) })
    }

    fn raw(&self) -> Option<(&'static dyn Port, LockHandle)> {
        self.port.zip(self.item)
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Mutex::new()
    }
}

impl Object for Mutex {
    fn is_constructed(&self) -> bool {
        self.item.is_some()
    }
}

impl Lockable for Mutex {
    /// Lock the mutex.
    ///
    /// Waits for the lock as long as necessary.  Must only be called from a thread, and not from
    /// an interrupt handler; this is not checked.
    fn lock(&self) -> bool {
        let Some((port, item)) = self.raw() else {
            return false;
        };
        match port.lock_acquire(item).context(ErrorKind::LockOperation) {
            Ok(()) => true,
            Err(err) => {
                warn!("Mutex {:?} lock failed: {}", item, err);
                false
            }
        }
    }

    fn try_lock(&self) -> bool {
        match self.raw() {
            Some((port, item)) => port.lock_try_acquire(item),
            None => false,
        }
    }

    /// Unlock the mutex.
    ///
    /// The mutex is expected to be held by the caller.  May wake a thread waiting in
    /// [`lock`](Lockable::lock).
    fn unlock(&self) -> bool {
        let Some((port, item)) = self.raw() else {
            return false;
        };
        match port.lock_release(item).context(ErrorKind::LockOperation) {
            Ok(()) => true,
            Err(err) => {
                warn!("Mutex {:?} unlock failed: {}", item, err);
                false
            }
        }
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        if let Some((port, item)) = self.raw() {
            port.lock_destroy(item);
            trace!("Mutex {:?} destroyed", item);
        }
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item {
            Some(item) => write!(f, "sys::Mutex {:?}", item),
            None => write!(f, "sys::Mutex (not constructed)"),
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use osal_sys::hosted::{HostedPort, Limits};
    use osal_sys::null::NullPort;
    use osal_sys::{Entry, ThreadAttrs, ThreadHandle};

    static HOSTED: HostedPort = HostedPort::new();
    static NULL: NullPort = NullPort;

    /// Hosted locks, except that a blocking acquire always fails.
    struct FailingAcquire;

    impl Port for FailingAcquire {
        fn create_thread(
            &self,
            entry: Entry,
            attrs: &ThreadAttrs,
        ) -> osal_sys::Result<ThreadHandle> {
            HOSTED.create_thread(entry, attrs)
        }

        fn join_thread(&self, thread: ThreadHandle) -> osal_sys::Result<()> {
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

        fn lock_init(&self) -> osal_sys::Result<LockHandle> {
            HOSTED.lock_init()
        }

        fn lock_destroy(&self, lock: LockHandle) {
            HOSTED.lock_destroy(lock)
        }

        fn lock_acquire(&self, _lock: LockHandle) -> osal_sys::Result<()> {
            Err(osal_sys::Error(osal_sys::EINVAL))
        }

        fn lock_try_acquire(&self, lock: LockHandle) -> bool {
            HOSTED.lock_try_acquire(lock)
        }

        fn lock_release(&self, lock: LockHandle) -> osal_sys::Result<()> {
            HOSTED.lock_release(lock)
        }
    }

    #[test]
    fn new_mutex_is_unlocked() {
        let mutex = Mutex::new_on(&HOSTED);
        assert!(mutex.is_constructed());
        assert!(mutex.try_lock());
        assert!(mutex.unlock());
    }

    #[test]
    fn try_lock_does_not_nest() {
        let mutex = Mutex::new_on(&HOSTED);
        assert!(mutex.try_lock());
        assert!(!mutex.try_lock());
        assert!(mutex.unlock());
        assert!(mutex.lock());
        assert!(!mutex.try_lock());
        assert!(mutex.unlock());
    }

    #[test]
    fn invalid_mutex_fails_without_blocking() {
        let mutex = Mutex::new_on(&NULL);
        assert!(!mutex.is_constructed());
        assert!(!mutex.lock());
        assert!(!mutex.try_lock());
        assert!(!mutex.unlock());
    }

    #[test]
    fn exhausted_port_gives_invalid_mutex() {
        static SMALL: HostedPort = HostedPort::with_limits(Limits { locks: 1, threads: 1 });
        let first = Mutex::new_on(&SMALL);
        let second = Mutex::new_on(&SMALL);
        assert!(first.is_constructed());
        assert!(!second.is_constructed());
        assert!(!second.lock());

        let err = Mutex::create_on(&SMALL).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(err.errno(), osal_sys::ENOMEM);

        // Dropping the valid mutex returns its lock to the port.
        drop(first);
        assert!(Mutex::new_on(&SMALL).is_constructed());
    }

    #[test]
    fn usable_through_the_capability() {
        let mutex = Mutex::new_on(&HOSTED);
        let lock: &dyn Lockable = &mutex;
        assert!(lock.is_constructed());
        assert!(lock.try_lock());
        assert!(!mutex.try_lock());
        assert!(lock.unlock());
    }

    #[test]
    fn unlock_of_free_mutex_fails() {
        let mutex = Mutex::new_on(&HOSTED);
        assert!(mutex.is_constructed());
        // The hosted port refuses to release a lock nobody holds.
        assert!(!mutex.unlock());

        assert!(mutex.is_constructed());
        assert!(mutex.lock());
        assert!(mutex.unlock());
        assert!(!mutex.unlock());
        assert!(mutex.try_lock());
        assert!(mutex.unlock());
    }

    #[test]
    fn failed_acquire_reports_false() {
        static FAILING: FailingAcquire = FailingAcquire;
        let mutex = Mutex::new_on(&FAILING);
        assert!(mutex.is_constructed());
        assert!(!mutex.lock());

        // The lock itself is untouched, and still usable without blocking.
        assert!(mutex.try_lock());
        assert!(!mutex.lock());
        assert!(mutex.unlock());
    }
}
