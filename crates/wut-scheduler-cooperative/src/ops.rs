use std::panic::{self, AssertUnwindSafe};

use foundation::kfn::{self, OrDie};
use foundation::ExecutionContext;

use crate::config::SchedulerConfig;
use crate::context::Context;
use crate::error::Error;
use crate::scheduler::{Exit, Join, Scheduler};
use crate::thread::{ExitStatus, ThreadState, Tid};

/// Exit status of a thread whose entry closure panicked.
pub const PANIC_EXIT_CODE: i32 = 101;

/// First code every spawned thread runs, on its own stack.
extern "C" fn thread_entry() {
    let code = match Scheduler::with_mut(Scheduler::take_current_entry).flatten() {
        Some(entry) => match panic::catch_unwind(AssertUnwindSafe(entry)) {
            Ok(()) => 0,
            Err(_) => {
                debug::writeln!("[SCHED] thread {:?} panicked", current_id());
                PANIC_EXIT_CODE
            }
        },
        None => kfn::invariant("thread started without an entry"),
    };
    exit(code)
}

/// Drop the closures of reclaimed threads that never ran. Their captures may
/// call back into the scheduler, so this runs outside any borrow of it.
fn drop_unstarted() {
    while let Some(entries) =
        Scheduler::with_mut(Scheduler::take_unstarted).filter(|entries| !entries.is_empty())
    {
        drop(entries);
    }
}

/// Set up this OS thread's scheduler, configured from the environment.
pub fn init() -> Result<(), Error> {
    init_with(SchedulerConfig::from_env())
}

pub fn init_with(config: SchedulerConfig) -> Result<(), Error> {
    Scheduler::init(config)
}

/// Id of the running thread, `None` while no scheduler is installed.
#[inline]
pub fn current_id() -> Option<Tid> {
    Scheduler::with_mut(|s| s.current_tid()).flatten()
}

/// Create a thread that runs `f` and then exits with status 0. It does not
/// run until the creator yields, joins or exits.
pub fn create<F>(f: F) -> Result<Tid, Error>
where
    F: FnOnce() + 'static,
{
    let spawned = Scheduler::with_mut(|s| s.spawn(Box::new(f), thread_entry))
        .ok_or(Error::NotInitialized)?;
    Ok(spawned.or_die("create thread"))
}

pub fn yield_now() -> Result<(), Error> {
    let switch = Scheduler::with_mut(Scheduler::prepare_yield).ok_or(Error::NotInitialized)??;
    switch.run();
    Ok(())
}

/// Wait for `tid` to finish and reclaim it.
pub fn join(tid: Tid) -> Result<ExitStatus, Error> {
    let plan = Scheduler::with_mut(|s| s.begin_join(tid)).ok_or(Error::NotInitialized)??;
    let status = match plan {
        Join::Finished(status) => status,
        Join::Wait(switch) => {
            switch.run();
            Scheduler::with_mut(|s| s.finish_join(tid)).ok_or(Error::NotInitialized)?
        }
    };
    drop_unstarted();
    Ok(status)
}

pub fn cancel(tid: Tid) -> Result<(), Error> {
    Scheduler::with_mut(|s| s.cancel(tid)).ok_or(Error::NotInitialized)??;
    drop_unstarted();
    Ok(())
}

/// Terminate the running thread with `code & 0xFF`.
///
/// Values owned by frames of the exiting thread are not dropped. When the
/// last thread exits, the process exits with status 0.
pub fn exit(code: i32) -> ! {
    let status = (code & 0xFF) as u8;
    match Scheduler::with_mut(|s| s.prepare_exit(status)) {
        Some(Exit::Resume(next)) => unsafe { Context::resume(next) },
        Some(Exit::Last(tid)) => {
            debug::writeln!("[SCHED] last thread {} exited", tid);
            if let Some(mut scheduler) = Scheduler::uninstall() {
                scheduler.release_all(Some(tid));
            }
            kfn::kexit(0)
        }
        None => kfn::kexit(code),
    }
}

/// Live threads, the entry thread included. 0 without a scheduler.
pub fn thread_count() -> usize {
    Scheduler::with_mut(|s| s.thread_count()).unwrap_or(0)
}

pub fn capacity() -> usize {
    Scheduler::with_mut(|s| s.capacity()).unwrap_or(0)
}

pub fn thread_state(tid: Tid) -> Option<ThreadState> {
    Scheduler::with_mut(|s| s.state(tid)).flatten()
}

/// Release every thread and remove the scheduler. Only the thread running
/// on the OS stack it was initialized from may do this.
pub fn teardown() -> Result<(), Error> {
    let spawned = Scheduler::with_mut(|s| s.running_on_own_stack()).ok_or(Error::NotInitialized)?;
    if spawned {
        return Err(Error::TeardownFromSpawnedThread);
    }
    drop(Scheduler::uninstall());
    Ok(())
}
