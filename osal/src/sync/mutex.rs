//! Higher level Mutex type and friends.
//!
//! [`Guard`] is the scoped form of any [`Lockable`]: it locks on construction and unlocks when it
//! goes out of scope.  [`Mutex`] is modeled after
//! [`std::sync::Mutex`](https://doc.rust-lang.org/stable/std/sync/index.html), and hands out
//! access to the data it protects only through its guard.

use core::{
    cell::UnsafeCell,
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use crate::object::Object;
use crate::sys::sync::{self as sys, Lockable};

/// An enumeration of possible errors from [`Mutex::lock`] and [`Mutex::try_lock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TryLockError {
    /// The lock could not be acquired at this time because the operation would otherwise block.
    WouldBlock,
    /// The underlying lock is not constructed, or the port failed to operate it.
    Invalid,
}

/// The return type from [`Mutex::lock`].
///
/// There is no poisoning.  The only failure is [`TryLockError::Invalid`].
pub type LockResult<Guard> = Result<Guard, TryLockError>;

/// The return type from [`Mutex::try_lock`].
pub type TryLockResult<Guard> = Result<Guard, TryLockError>;

/// Holds a lock for the lifetime of a scope.
///
/// The guard is constructed if the lock was acquired.  If it was not (the lock is invalid, or the
/// port reported an error), the guard is not constructed and will not release anything when
/// dropped.
pub struct Guard<'a, L: Lockable + ?Sized> {
    lock: &'a L,
    locked: bool,
}

impl<'a, L: Lockable + ?Sized> Guard<'a, L> {
    /// Lock `lock`, blocking until it is available.
    pub fn new(lock: &'a L) -> Guard<'a, L> {
        let locked = lock.lock();
        Guard { lock, locked }
    }
}

impl<L: Lockable + ?Sized> Object for Guard<'_, L> {
    fn is_constructed(&self) -> bool {
        self.locked
    }
}

impl<L: Lockable + ?Sized> Drop for Guard<'_, L> {
    fn drop(&mut self) {
        if self.locked {
            self.lock.unlock();
        }
    }
}

/// A mutual exclusion primitive useful for protecting shared data.
///
/// This mutex will block threads waiting for the lock to become available.  It differs from
/// `std::sync::Mutex` in the following ways:
/// - Poisoning: not implemented.  A task that panics while holding the guard still releases it.
/// - Construction: the underlying [`sys::Mutex`] can fail to construct.  Check
///   [`is_constructed`](Object::is_constructed); locking an unconstructed mutex fails with
///   [`TryLockError::Invalid`].
pub struct Mutex<T: ?Sized> {
    inner: sys::Mutex,
    data: UnsafeCell<T>,
}

// At least if correctly done, the Mutex provides for Send and Sync as long as the inner data
// supports Send.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T: ?Sized> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutex {:?}", self.inner)
    }
}

/// An RAII implementation of a "scoped lock" of a mutex.  When this structure is dropped (falls
/// out of scope), the lock will be unlocked.
///
/// The data protected by the mutex can be accessed through this guard via its [`Deref`] and
/// [`DerefMut`] implementations.
///
/// This structure is created by the [`lock`] and [`try_lock`] methods on [`Mutex`].
///
/// The guard stays on the thread that locked the mutex:
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<osal::sync::MutexGuard<'static, u32>>();
/// ```
///
/// [`lock`]: Mutex::lock
/// [`try_lock`]: Mutex::try_lock
pub struct MutexGuard<'a, T: ?Sized + 'a> {
    lock: &'a Mutex<T>,
    // Negative impls (<https://github.com/rust-lang/rust/issues/68318>) are not stable, so the
    // guard is made `!Send` by holding a raw pointer marker.  `Sync` is given back below.
    _nosend: PhantomData<*const ()>,
}

unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<T> Mutex<T> {
    /// Construct a new wrapped Mutex, using the given underlying sys mutex.
    pub const fn new_from(t: T, raw_mutex: sys::Mutex) -> Mutex<T> {
        Mutex {
            inner: raw_mutex,
            data: UnsafeCell::new(t),
        }
    }

    /// Construct a new Mutex, with a lock from the installed port.
    pub fn new(t: T) -> Mutex<T> {
        Mutex::new_from(t, sys::Mutex::new())
    }

    /// Consume the mutex, returning the data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Acquires a mutex, blocking the current thread until it is able to do so.
    ///
    /// Upon returning, the thread is the only thread with the lock held.  An RAII guard is
    /// returned to allow scoped unlock of the lock.
    pub fn lock(&self) -> LockResult<MutexGuard<'_, T>> {
        if self.inner.lock() {
            Ok(MutexGuard::new(self))
        } else {
            Err(TryLockError::Invalid)
        }
    }

    /// Attempts to acquire this lock.
    ///
    /// If the lock could not be acquired at this time, then [`Err`] is returned.  Otherwise, an
    /// RAII guard is returned.  The lock will be unlocked when the guard is dropped.
    ///
    /// This function does not block.
    pub fn try_lock(&self) -> TryLockResult<MutexGuard<'_, T>> {
        if !self.inner.is_constructed() {
            return Err(TryLockError::Invalid);
        }
        if self.inner.try_lock() {
            Ok(MutexGuard::new(self))
        } else {
            Err(TryLockError::WouldBlock)
        }
    }

    /// Returns a mutable reference to the underlying data.
    ///
    /// The mutable borrow statically guarantees no locks exist.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<T: ?Sized> Object for Mutex<T> {
    fn is_constructed(&self) -> bool {
        self.inner.is_constructed()
    }
}

impl<'mutex, T: ?Sized> MutexGuard<'mutex, T> {
    fn new(lock: &'mutex Mutex<T>) -> MutexGuard<'mutex, T> {
        MutexGuard {
            lock,
            _nosend: PhantomData,
        }
    }
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard exists only while the lock is held.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above, and the guard is borrowed mutably.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.inner.unlock();
    }
}
