// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Dining philosophers.
//!
//! The dining philosophers problem is a simple example of cooperation between multiple threads.
//! Each philosopher is a thread task, and each fork an osal mutex.  The table is set twice: once
//! with forks that are taken with a blocking `lock`, and once with forks that are taken by polling
//! `try_lock`.

use std::fmt;
use std::process::ExitCode;

use log::{error, info};
use osal::sync::atomic::{AtomicBool, Ordering};
use osal::sync::{Arc, Mutex};
use osal::sys::thread::{Task, Thread};
use osal::sys::uptime_get;
use osal::time::{sleep, Duration, Tick};
use osal::{Object, System};

use crate::sysmutex::SysMutexSync;
use crate::trysync::TryLockSync;

mod sysmutex;
mod trysync;

/// How many philosophers.  There will be the same number of forks.
const NUM_PHIL: usize = 6;

/// How much stack should each philosopher thread get.
const PHIL_STACK_SIZE: usize = 64 * 1024;

/// How long each table runs.
const DINNER_TIME: Duration = Duration::secs(2);

/// The philosophers use a fork synchronization mechanism.  Essentially, this is 6 locks, and will
/// be implemented in a few different ways to demonstrate different mechanisms.
trait ForkSync: fmt::Debug + Sync + Send {
    /// Take the given fork.  The are indexed the same as the philosopher index number.  This will
    /// block until the fork is released.
    fn take(&self, index: usize);

    /// Release the given fork.  Index is the same as take.
    fn release(&self, index: usize);
}

fn main() -> ExitCode {
    // SAFETY: called before any other thread exists.
    if unsafe { osal::set_logger() }.is_err() {
        return ExitCode::FAILURE;
    }

    let system = System::hosted();
    if !system.is_initialized() {
        error!("Operating system abstraction failed to initialize");
        return ExitCode::FAILURE;
    }

    let tables: [(&str, Arc<dyn ForkSync>); 2] = [
        ("sys::Mutex", Arc::from(Box::new(SysMutexSync::new()) as Box<dyn ForkSync>)),
        ("try_lock", Arc::from(Box::new(TryLockSync::new()) as Box<dyn ForkSync>)),
    ];

    for (name, syncer) in tables {
        info!("Setting the table with {} forks", name);
        if !dinner(syncer) {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

/// Run one table until dinner time is over.  Returns false if the table could not be set.
fn dinner(syncer: Arc<dyn ForkSync>) -> bool {
    let stats = Arc::new(Mutex::new(Stats::default()));
    let stop = Arc::new(AtomicBool::new(false));
    if !stats.is_constructed() {
        error!("Stats mutex is not constructed");
        return false;
    }

    let mut phils: Vec<_> = (0..NUM_PHIL)
        .map(|index| {
            Thread::new(Philosopher {
                index,
                syncer: syncer.clone(),
                stats: stats.clone(),
                stop: stop.clone(),
            })
        })
        .collect();

    for phil in phils.iter_mut() {
        phil.set_name("philosopher");
        if !phil.execute() {
            error!("Philosopher {} failed to start", phil.task().index);
            stop.store(true, Ordering::Release);
            return false;
        }
    }

    sleep(DINNER_TIME);
    stop.store(true, Ordering::Release);

    let mut ok = true;
    for phil in phils.iter_mut() {
        ok &= phil.join();
    }

    match stats.lock() {
        Ok(stats) => stats.show(),
        Err(err) => error!("Stats unavailable: {:?}", err),
    }
    ok
}

struct Philosopher {
    index: usize,
    syncer: Arc<dyn ForkSync>,
    stats: Arc<Mutex<Stats>>,
    stop: Arc<AtomicBool>,
}

impl Task for Philosopher {
    fn start(&self) {
        let n = self.index;
        info!("Child {} started: {:?}", n, self.syncer);

        // Determine our two forks.
        let forks = if n == NUM_PHIL - 1 {
            // Per Dijkstra, the last phyilosopher needs to reverse forks, or we deadlock.
            (0, n)
        } else {
            (n, n + 1)
        };

        while !self.stop.load(Ordering::Acquire) {
            self.syncer.take(forks.0);
            self.syncer.take(forks.1);

            let delay = get_random_delay(n, 5);
            sleep(delay);
            if let Ok(mut stats) = self.stats.lock() {
                stats.record_eat(n, delay);
            }

            // Release the forks.
            self.syncer.release(forks.1);
            self.syncer.release(forks.0);

            let delay = get_random_delay(n, 5);
            sleep(delay);
            if let Ok(mut stats) = self.stats.lock() {
                stats.record_think(n, delay);
            }
        }
    }

    fn stack_size(&self) -> usize {
        PHIL_STACK_SIZE
    }
}

/// Get a random delay, based on the ID of this user, and the current uptime.
fn get_random_delay(id: usize, period: usize) -> Duration {
    let tick = (uptime_get() & (usize::MAX as i64)) as usize;
    let delay = (tick / 100 * (id + 1)) & 0x1f;

    // Use one greater to be sure to never get a delay of zero.
    Duration::millis(((delay + 1) * period) as Tick)
}

/// Instead of just printint out so much information that the data just scolls by, gather
/// statistics.
#[derive(Default)]
struct Stats {
    /// How many times each philosopher has gone through the loop.
    count: [u64; NUM_PHIL],
    /// How much time each philosopher has spent eating.
    eating: [u64; NUM_PHIL],
    /// How much time each philosopher has spent thinking.
    thinking: [u64; NUM_PHIL],
}

impl Stats {
    fn record_eat(&mut self, index: usize, time: Duration) {
        self.eating[index] += time.to_millis();
    }

    fn record_think(&mut self, index: usize, time: Duration) {
        self.thinking[index] += time.to_millis();
        self.count[index] += 1;
    }

    fn show(&self) {
        info!(
            "c:{:?}, e:{:?}, t:{:?}",
            self.count, self.eating, self.thinking
        );
    }
}
