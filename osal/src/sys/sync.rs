// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! # osal low-level synchronization primitives.
//!
//! These are as direct an interface to the port's locks as possible, without the need for unsafe.
//! They follow the conventions of the rest of the crate: construction may fail, validity is
//! queried with [`Object::is_constructed`], and operations report success as a `bool`.
//!
//! The other module `crate::sync` provides higher level interfaces that tie locking to Rust
//! scopes and borrowing, and will generally be more pleasant to use.
//!
//! [`Object::is_constructed`]: crate::Object::is_constructed

pub mod mutex;

pub use mutex::{Lockable, Mutex};
