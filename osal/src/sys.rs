// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! osal 'sys' module.
//!
//! The `osal-sys` crate declares the [`Port`] capability set supplied by the platform.  This
//! module keeps track of the port currently installed by a [`System`], and contains the
//! primitives built directly on it: the binary [`sync::Mutex`] and the [`thread::Thread`] task
//! runner.
//!
//! [`System`]: crate::System

use core::cell::Cell;

use log::{debug, warn};
use osal_sys::Port;

use crate::error::{Context, ErrorKind, Result};

pub mod sync;
pub mod thread;

/// The installed port, and how many [`System`] instances are keeping it installed.
///
/// A port is claimed (`ready == false`) while it is being initialized, and published once that
/// succeeds.  Only a published port is visible through [`port`].
///
/// [`System`]: crate::System
#[derive(Clone, Copy)]
struct Installed {
    port: Option<&'static dyn Port>,
    users: usize,
    ready: bool,
}

static INSTALLED: critical_section::Mutex<Cell<Installed>> =
    critical_section::Mutex::new(Cell::new(Installed {
        port: None,
        users: 0,
        ready: false,
    }));

fn same_port(a: &'static dyn Port, b: &'static dyn Port) -> bool {
    core::ptr::addr_eq(a as *const dyn Port, b as *const dyn Port)
}

/// What an installer found in the slot.
enum Claim {
    /// Joined the published installation of the same port.
    Joined,
    /// Another port holds the slot.
    Busy,
    /// The same port is still being initialized by someone else.
    Pending,
    /// The slot was free, and is now claimed for this port.
    Claimed,
}

/// Install `port` as the process wide port, or join an existing installation of the same port.
///
/// The first installation initializes the port, outside of any critical section.  Installing a
/// different port while one is in use fails with `EBUSY`.
pub(crate) fn install(port: &'static dyn Port) -> Result<()> {
    loop {
        let claim = critical_section::with(|cs| {
            let slot = INSTALLED.borrow(cs);
            let mut installed = slot.get();
            let claim = match installed.port {
                Some(current) if same_port(current, port) && installed.ready => {
                    installed.users += 1;
                    Claim::Joined
                }
                Some(current) if same_port(current, port) => Claim::Pending,
                Some(_) => Claim::Busy,
                None => {
                    installed = Installed {
                        port: Some(port),
                        users: 0,
                        ready: false,
                    };
                    Claim::Claimed
                }
            };
            slot.set(installed);
            claim
        });
        match claim {
            Claim::Joined => return Ok(()),
            Claim::Busy => {
                warn!("A different port is already installed");
                return Err(osal_sys::Error(osal_sys::EBUSY)).context(ErrorKind::Construction);
            }
            Claim::Pending => core::hint::spin_loop(),
            Claim::Claimed => break,
        }
    }

    let res = port.initialize().context(ErrorKind::Construction);
    critical_section::with(|cs| {
        let installed = match res {
            Ok(()) => Installed {
                port: Some(port),
                users: 1,
                ready: true,
            },
            Err(_) => Installed {
                port: None,
                users: 0,
                ready: false,
            },
        };
        INSTALLED.borrow(cs).set(installed);
    });
    if res.is_ok() {
        debug!("Port installed");
    }
    res
}

/// Drop one user of the installed port, tearing it down after the last one.
pub(crate) fn uninstall() {
    let last = critical_section::with(|cs| {
        let slot = INSTALLED.borrow(cs);
        let mut installed = slot.get();
        if !installed.ready {
            return None;
        }
        installed.users = installed.users.saturating_sub(1);
        let last = if installed.users == 0 {
            installed.ready = false;
            installed.port.take()
        } else {
            None
        };
        slot.set(installed);
        last
    });
    if let Some(port) = last {
        port.deinitialize();
        debug!("Port uninstalled");
    }
}

/// The currently installed port, if any.
pub fn port() -> Option<&'static dyn Port> {
    critical_section::with(|cs| {
        let installed = INSTALLED.borrow(cs).get();
        installed.port.filter(|_| installed.ready)
    })
}

/// Return the current uptime of the system in ms.
///
/// Returns 0 when no port is installed.
#[inline]
pub fn uptime_get() -> i64 {
    port()
        .map(|port| i64::try_from(port.uptime_ms()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
