//! Higher level synchronization primitives.
//!
//! These tie the low-level [`sys::sync::Mutex`] to Rust scopes: a [`Guard`] holds any
//! [`Lockable`] for the duration of a scope, and [`Mutex`] is modeled after
//! [`std::sync::Mutex`](https://doc.rust-lang.org/stable/std/sync/struct.Mutex.html), owning the
//! data it protects.
//!
//! [`sys::sync::Mutex`]: crate::sys::sync::Mutex
//! [`Lockable`]: crate::sys::sync::Lockable

pub mod atomic {
    //! Re-export portable atomic.
    //!
    //! Although `core` contains a
    //! [`sync::atomic`](https://doc.rust-lang.org/stable/core/sync/atomic/index.html) module,
    //! these are dependent on the target having atomic instructions, and the types are missing
    //! when the platform cannot support them.  In the Rust-embedded world, this is handled by the
    //! [`portable-atomic`](https://crates.io/crates/portable-atomic) crate, which will either just
    //! re-export the types from core, or provide an implementation based on critical sections.
    //!
    //! State shared between a task and its creator (flags, status registers) should be kept in
    //! these types, and accessed with `Acquire`/`Release` ordering.

    pub use portable_atomic::*;
}

pub use portable_atomic_util::Arc;
pub use portable_atomic_util::Weak;

mod mutex;

pub use mutex::{Guard, LockResult, Mutex, MutexGuard, TryLockError, TryLockResult};
