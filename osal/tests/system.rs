// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

// Tests of the runtime bootstrap and of threads created on the installed port.

use osal::raw::hosted::HostedPort;
use osal::raw::null::NullPort;
use osal::raw::Port;
use osal::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use osal::sync::{Guard, Mutex as DataMutex};
use osal::sys::sync::Mutex;
use osal::sys::thread::{task_fn, Task, Thread, ThreadStatus};
use osal::time::{self, Duration};
use osal::{Object, System};

#[test]
fn hosted_system_installs_port() {
    let system = System::hosted();
    assert!(system.is_initialized());
    assert!(system.is_constructed());
    assert!(osal::sys::port().is_some());

    // A second fixture over the same port shares the installation.
    let again = System::hosted();
    assert!(again.is_initialized());
    drop(again);
    assert!(osal::sys::port().is_some());
}

#[test]
fn different_port_is_refused() {
    static OTHER: HostedPort = HostedPort::new();

    let _system = System::hosted();
    // OTHER would initialize fine, it is refused only because the hosted port is installed.
    assert!(OTHER.initialize().is_ok());
    assert!(!System::new(&OTHER).is_initialized());
    assert!(osal::sys::port().is_some());
    assert!(Mutex::new().is_constructed());
}

#[test]
fn failing_port_is_not_installed() {
    static NULL: NullPort = NullPort;

    // Whether or not another fixture has a port installed, a failing port never ends up in use.
    let system = System::new(&NULL);
    assert!(!system.is_initialized());
    assert!(!system.is_constructed());
}

#[test]
fn fallible_factory() {
    let _system = System::hosted();
    let mutex = Mutex::create().unwrap();
    assert!(mutex.is_constructed());
}

struct Started {
    started: AtomicBool,
    dead: AtomicBool,
}

impl Task for Started {
    fn start(&self) {
        self.started.store(true, Ordering::Release);
        osal::sys::thread::yield_now();
        self.dead.store(true, Ordering::Release);
    }
}

#[test]
fn thread_runs_only_after_execute() {
    let _system = System::hosted();

    let mut thread = Thread::new(Started {
        started: AtomicBool::new(false),
        dead: AtomicBool::new(false),
    });
    assert!(thread.is_constructed());
    time::sleep(Duration::millis(5));
    assert!(!thread.task().started.load(Ordering::Acquire));
    assert_eq!(thread.status(), ThreadStatus::Idle);

    assert!(thread.execute());
    assert!(thread.join());
    assert!(thread.task().started.load(Ordering::Acquire));
    assert!(thread.task().dead.load(Ordering::Acquire));
}

#[test]
fn guarded_counter() {
    let _system = System::hosted();

    static COUNT: AtomicU32 = AtomicU32::new(0);
    let lock = osal::sync::Arc::new(Mutex::new());
    let mut threads: Vec<_> = (0..3)
        .map(|_| {
            let lock = lock.clone();
            Thread::new(task_fn(move || {
                for _ in 0..100 {
                    let guard = Guard::new(&*lock);
                    assert!(guard.is_constructed());
                    let seen = COUNT.load(Ordering::Relaxed);
                    osal::sys::thread::yield_now();
                    COUNT.store(seen + 1, Ordering::Relaxed);
                }
            }))
        })
        .collect();
    for thread in threads.iter_mut() {
        thread.set_name("guarded");
        assert!(thread.execute());
    }
    for thread in threads.iter_mut() {
        assert!(thread.join());
    }
    assert_eq!(COUNT.load(Ordering::Relaxed), 300);
}

#[test]
fn data_mutex_on_installed_port() {
    let _system = System::hosted();

    let stats = DataMutex::new([0u64; 4]);
    assert!(stats.is_constructed());
    stats.lock().unwrap()[2] += 1;
    assert_eq!(stats.lock().unwrap()[2], 1);
}

#[test]
fn clock_advances() {
    let _system = System::hosted();

    let start = time::now();
    time::sleep(Duration::millis(10));
    let elapsed = time::now() - start;
    assert!(elapsed >= Duration::millis(10));
    assert!(osal::sys::uptime_get() >= 10);
}
