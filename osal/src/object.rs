// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Constructed objects.
//!
//! Every resource in this crate is constructed infallibly, and then asked whether construction
//! worked.  An object that failed to construct (for instance because the port ran out of lock
//! resources) stays usable in the sense that calling into it is always safe: each operation
//! checks validity first, and reports failure without touching the port.
//!
//! Where a caller prefers a `Result`, the types also offer a fallible factory, such as
//! [`Mutex::create`](crate::sys::sync::Mutex::create).

/// An object with a construction outcome.
pub trait Object {
    /// Tests if the object has been constructed successfully.
    fn is_constructed(&self) -> bool;
}

impl<T: Object + ?Sized> Object for &T {
    fn is_constructed(&self) -> bool {
        (**self).is_constructed()
    }
}
