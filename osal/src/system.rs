// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! The runtime bootstrap.
//!
//! A [`System`] installs a port for the rest of the crate, and must be constructed (and
//! initialized) before any mutex or thread is created.  Dropping it uninstalls the port.
//!
//! Several instances over the same port share a single installation, and the port is torn down
//! when the last of them is dropped.  This lets independent fixtures, such as tests running in
//! parallel, each hold their own `System`.  An instance over a different port, while one is
//! installed, is not initialized.

use core::fmt;

use log::warn;
use osal_sys::Port;

use crate::object::Object;

/// The operating system abstraction, brought up for the lifetime of this value.
pub struct System {
    initialized: bool,
}

impl System {
    /// Install `port`, initializing it if it is not already installed.
    pub fn new(port: &'static dyn Port) -> System {
        match crate::sys::install(port) {
            Ok(()) => System { initialized: true },
            Err(err) => {
                warn!("System initialization failed: {}", err);
                System { initialized: false }
            }
        }
    }

    /// Install the hosted port, running on the host operating system.
    ///
    /// The hosted port is sized by [`CONFIG_MAX_LOCKS`] and [`CONFIG_MAX_THREADS`].
    ///
    /// [`CONFIG_MAX_LOCKS`]: crate::kconfig::CONFIG_MAX_LOCKS
    /// [`CONFIG_MAX_THREADS`]: crate::kconfig::CONFIG_MAX_THREADS
    #[cfg(feature = "std")]
    pub fn hosted() -> System {
        use crate::kconfig::{CONFIG_MAX_LOCKS, CONFIG_MAX_THREADS};
        use osal_sys::hosted::{HostedPort, Limits};

        static HOSTED: HostedPort = HostedPort::with_limits(Limits {
            locks: CONFIG_MAX_LOCKS,
            threads: CONFIG_MAX_THREADS,
        });
        System::new(&HOSTED)
    }

    /// Tests if the system has been initialized successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Object for System {
    fn is_constructed(&self) -> bool {
        self.initialized
    }
}

impl Drop for System {
    fn drop(&mut self) {
        if self.initialized {
            crate::sys::uninstall();
        }
    }
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "System initialized:{}", self.initialized)
    }
}
