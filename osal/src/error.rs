// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! # osal errors
//!
//! The port reports failures as errno values (see [`raw::Error`]).  Within the core, these are
//! tagged with the kind of operation that failed, so that a failure can be logged and classified
//! without keeping track of which call produced it.
//!
//! Note that the public operations on mutexes and threads do not return these errors: they
//! report a plain `bool`, and the error is only logged.  The fallible factories
//! ([`Mutex::create`] and friends) do return them.
//!
//! [`raw::Error`]: crate::raw::Error
//! [`Mutex::create`]: crate::sys::sync::Mutex::create

use core::fmt;

pub use osal_sys::{EAGAIN, EBUSY, ECANCELED, EINVAL, ENODEV, ENOMEM, EPERM, ESRCH};

/// The class of operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An underlying resource could not be allocated when an object was constructed.
    Construction,
    /// The port reported an error while acquiring or releasing a lock.
    LockOperation,
    /// The port could not create, or could not join, a thread.
    ThreadCreation,
}

/// An osal error.
///
/// Carries the kind of failed operation, and the errno reported by the port.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    errno: u32,
}

impl Error {
    /// Tag a port error with the kind of operation that produced it.
    pub const fn new(kind: ErrorKind, raw: osal_sys::Error) -> Error {
        Error { kind, errno: raw.0 }
    }

    /// The class of operation that failed.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The errno reported by the port.
    pub fn errno(&self) -> u32 {
        self.errno
    }
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} failed errno:{}", self.kind, self.errno)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "osal error {:?} errno:{}", self.kind, self.errno)
    }
}

impl From<Error> for osal_sys::Error {
    fn from(err: Error) -> Self {
        osal_sys::Error(err.errno)
    }
}

/// Wraps a value with a possible osal error.
pub type Result<T> = core::result::Result<T, Error>;

/// Tag the error of a port result with an [`ErrorKind`].
pub(crate) trait Context<T> {
    fn context(self, kind: ErrorKind) -> Result<T>;
}

impl<T> Context<T> for osal_sys::Result<T> {
    #[inline(always)]
    fn context(self, kind: ErrorKind) -> Result<T> {
        self.map_err(|raw| Error::new(kind, raw))
    }
}
