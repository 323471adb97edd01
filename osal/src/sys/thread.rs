//! osal threads
//!
//! A [`Thread`] runs a [`Task`] on its own thread of control, created by the installed port.  The
//! task is the unit of work: it has a single entry point, [`Task::start`], which is called once on
//! the new thread.  The `Thread` keeps the port's handle for the running thread, so the creator
//! only deals with [`execute`] and [`join`].
//!
//! ## Usage
//!
//! ```
//! use osal::sys::thread::{Task, Thread};
//! use osal::sync::atomic::{AtomicBool, Ordering};
//!
//! struct Hello {
//!     done: AtomicBool,
//! }
//!
//! impl Task for Hello {
//!     fn start(&self) {
//!         self.done.store(true, Ordering::Release);
//!     }
//! }
//!
//! let system = osal::System::hosted();
//! assert!(system.is_initialized());
//!
//! let mut thread = Thread::new(Hello { done: AtomicBool::new(false) });
//! assert!(thread.execute());
//! assert!(thread.join());
//! assert!(thread.task().done.load(Ordering::Acquire));
//! ```
//!
//! The lifecycle is `Idle` → `Running` → `Finished`.  A thread runs its task at most once:
//! `execute` is refused once the thread has left `Idle`, including after it has been joined.
//!
//! [`execute`]: Thread::execute
//! [`join`]: Thread::join

use alloc::boxed::Box;
use core::fmt;

use log::{debug, trace, warn};
use osal_sys::{Entry, Port, ThreadAttrs, ThreadHandle};
use portable_atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use crate::error::{Context, ErrorKind};
use crate::kconfig::CONFIG_THREAD_STACK_SIZE;
use crate::object::Object;
use crate::sync::Arc;

/// Identifier reported by a thread that is not constructed.
pub const ID_WRONG: usize = 0;

/// Priority reported by a thread that is not constructed.
pub const PRIORITY_WRONG: i32 = -1;
/// Priority that keeps other threads from being scheduled, where the port supports it.
pub const PRIORITY_LOCK: i32 = 0;
/// Lowest normal priority.
pub const PRIORITY_MIN: i32 = 1;
/// Default priority of new threads.
pub const PRIORITY_NORM: i32 = 5;
/// Highest priority.
pub const PRIORITY_MAX: i32 = 10;

static NEXT_ID: AtomicUsize = AtomicUsize::new(ID_WRONG + 1);

/// A unit of work, run on a thread.
///
/// The entry point takes `&self`: state the task wants to share with its creator lives in the
/// task, behind atomics or locks, and the creator reads it through [`Thread::task`].
pub trait Task: Send + Sync + 'static {
    /// The entry point.  Runs on the new thread.
    fn start(&self);

    /// Tests if the task has been constructed successfully.  A thread refuses to run a task that
    /// has not.
    fn is_constructed(&self) -> bool {
        true
    }

    /// Stack size this task needs, in bytes.  Zero leaves the choice to the thread.
    fn stack_size(&self) -> usize {
        0
    }
}

/// A task made from a closure.
pub struct FnTask<F> {
    entry: F,
}

impl<F> Task for FnTask<F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn start(&self) {
        (self.entry)()
    }
}

/// Wrap a closure as a [`Task`].
pub fn task_fn<F>(entry: F) -> FnTask<F>
where
    F: Fn() + Send + Sync + 'static,
{
    FnTask { entry }
}

/// States a thread can be in.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadStatus {
    /// Constructed, and not yet executed.
    Idle = 0,
    /// Executed.  The task may or may not have started yet.
    Running = 1,
    /// The entry point has returned, or unwound.
    Finished = 2,
}

impl ThreadStatus {
    fn from_raw(raw: u8) -> ThreadStatus {
        match raw {
            0 => ThreadStatus::Idle,
            1 => ThreadStatus::Running,
            _ => ThreadStatus::Finished,
        }
    }
}

/// The state shared between the creator and the running thread.
struct Shared<T> {
    task: T,
    status: AtomicU8,
    /// Set before `status` becomes `Finished` if the task did not complete.
    failed: AtomicBool,
}

/// Moves the thread to `Finished` when the entry point exits, including by unwinding.
struct Exit<'a, T> {
    shared: &'a Shared<T>,
    completed: bool,
}

impl<T> Drop for Exit<'_, T> {
    fn drop(&mut self) {
        if !self.completed {
            self.shared.failed.store(true, Ordering::Release);
        }
        self.shared
            .status
            .store(ThreadStatus::Finished as u8, Ordering::Release);
    }
}

/// A task, and the thread that runs it.
pub struct Thread<T: Task> {
    shared: Arc<Shared<T>>,
    port: Option<&'static dyn Port>,
    /// The port's handle.  Present from a successful `execute` until `join`.
    handle: Option<ThreadHandle>,
    constructed: bool,
    id: usize,

    /// The priority the thread will be created at.
    priority: i32,
    /// Stack size given to thread creation.  Zero defers to the task.
    stack_size: usize,
    name: Option<&'static str>,
}

impl<T: Task> Thread<T> {
    /// Construct a thread for `task` on the installed port.
    ///
    /// The thread is not constructed if no port is installed, or if the task itself is not.
    pub fn new(task: T) -> Thread<T> {
        match crate::sys::port() {
            Some(port) => Thread::new_on(port, task),
            None => {
                warn!("Thread constructed without an installed port");
                Thread::build(None, task, false)
            }
        }
    }

    /// Construct a thread for `task` that will be created by the given port.
    pub fn new_on(port: &'static dyn Port, task: T) -> Thread<T> {
        let constructed = task.is_constructed();
        if !constructed {
            debug!("Thread given an unconstructed task");
        }
        Thread::build(Some(port), task, constructed)
    }

    fn build(port: Option<&'static dyn Port>, task: T, constructed: bool) -> Thread<T> {
        let id = if constructed {
            NEXT_ID.fetch_add(1, Ordering::Relaxed)
        } else {
            ID_WRONG
        };
        Thread {
            shared: Arc::new(Shared {
                task,
                status: AtomicU8::new(ThreadStatus::Idle as u8),
                failed: AtomicBool::new(false),
            }),
            port,
            handle: None,
            constructed,
            id,
            priority: PRIORITY_NORM,
            stack_size: 0,
            name: None,
        }
    }

    /// The task run by this thread.
    pub fn task(&self) -> &T {
        &self.shared.task
    }

    /// The current lifecycle state.
    pub fn status(&self) -> ThreadStatus {
        ThreadStatus::from_raw(self.shared.status.load(Ordering::Acquire))
    }

    fn failed(&self) -> bool {
        self.shared.failed.load(Ordering::Acquire)
    }

    /// The identifier of this thread, or [`ID_WRONG`] if it is not constructed.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The priority of this thread, or [`PRIORITY_WRONG`] if it is not constructed.
    pub fn priority(&self) -> i32 {
        if self.constructed {
            self.priority
        } else {
            PRIORITY_WRONG
        }
    }

    /// Set the priority the thread will be created at.
    ///
    /// Accepts [`PRIORITY_LOCK`] and the range [`PRIORITY_MIN`] to [`PRIORITY_MAX`].  The priority
    /// is handed to the port by [`execute`](Self::execute); changing it afterwards does not affect
    /// the running thread.
    pub fn set_priority(&mut self, priority: i32) -> bool {
        if !self.constructed {
            return false;
        }
        if priority != PRIORITY_LOCK && !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
            return false;
        }
        self.priority = priority;
        true
    }

    /// Set the stack size requested from the port, overriding the task's own request.
    pub fn set_stack_size(&mut self, stack_size: usize) {
        self.stack_size = stack_size;
    }

    /// Set the name of the thread, for debugging.
    pub fn set_name(&mut self, name: &'static str) {
        self.name = Some(name);
    }

    fn attrs(&self) -> ThreadAttrs {
        let stack_size = match (self.stack_size, self.shared.task.stack_size()) {
            (0, 0) => CONFIG_THREAD_STACK_SIZE,
            (0, task) => task,
            (thread, _) => thread,
        };
        ThreadAttrs {
            priority: self.priority,
            stack_size,
            name: self.name,
        }
    }

    /// Start running the task on a new thread.
    ///
    /// Returns `true` if the port created the thread.  The task starts some time after this
    /// returns.  Returns `false`, leaving the thread `Idle`, if it is not constructed, it has
    /// already been executed, or the port could not create a thread.
    pub fn execute(&mut self) -> bool {
        if !self.constructed {
            return false;
        }
        let Some(port) = self.port else {
            return false;
        };
        if self
            .shared
            .status
            .compare_exchange(
                ThreadStatus::Idle as u8,
                ThreadStatus::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!("Thread {} executed twice", self.id);
            return false;
        }

        let shared = self.shared.clone();
        let entry: Entry = Box::new(move || {
            let mut exit = Exit {
                shared: &*shared,
                completed: false,
            };
            exit.shared.task.start();
            exit.completed = true;
        });

        match port
            .create_thread(entry, &self.attrs())
            .context(ErrorKind::ThreadCreation)
        {
            Ok(handle) => {
                trace!("Thread {} running as {:?}", self.id, handle);
                self.handle = Some(handle);
                true
            }
            Err(err) => {
                warn!("Thread {} creation failed: {}", self.id, err);
                self.shared
                    .status
                    .store(ThreadStatus::Idle as u8, Ordering::Release);
                false
            }
        }
    }

    /// Wait for the task to finish.
    ///
    /// Returns `true` once the entry point has returned.  Returns `false` if the thread was never
    /// executed, or if it ended abnormally (for instance, the task panicked).  Once the thread has
    /// been joined, later calls return the same result without blocking.
    pub fn join(&mut self) -> bool {
        if !self.constructed {
            return false;
        }
        let (Some(port), Some(handle)) = (self.port, self.handle.take()) else {
            return self.status() == ThreadStatus::Finished && !self.failed();
        };
        let res = port.join_thread(handle).context(ErrorKind::ThreadCreation);
        // Whatever happened, the thread is gone.
        if res.is_err() {
            self.shared.failed.store(true, Ordering::Release);
        }
        self.shared
            .status
            .store(ThreadStatus::Finished as u8, Ordering::Release);
        match res {
            Ok(()) if !self.failed() => {
                trace!("Thread {} joined", self.id);
                true
            }
            Ok(()) => {
                warn!("Thread {} task did not complete", self.id);
                false
            }
            Err(err) => {
                warn!("Thread {} join failed: {}", self.id, err);
                false
            }
        }
    }
}

impl<T: Task> Object for Thread<T> {
    fn is_constructed(&self) -> bool {
        self.constructed
    }
}

impl<T: Task> Drop for Thread<T> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.join();
        }
    }
}

impl<T: Task> fmt::Debug for Thread<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sys::Thread {} {:?}", self.id, self.status())
    }
}

/// Give up the processor to another ready thread.
pub fn yield_now() {
    match crate::sys::port() {
        Some(port) => port.yield_now(),
        None => core::hint::spin_loop(),
    }
}
