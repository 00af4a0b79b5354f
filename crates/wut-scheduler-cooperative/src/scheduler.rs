use foundation::kfn::{self, OrDie};
use foundation::utils::LocalOption;
use foundation::{ExecutionContext, PlatformError};

use crate::config::SchedulerConfig;
use crate::context::{Context, ThreadContext};
use crate::error::Error;
use crate::queue::ReadyQueue;
use crate::registry::Registry;
use crate::thread::{Entry, ExitStatus, ThreadControlBlock, ThreadState, Tid};

thread_local! {
    static SCHEDULER: LocalOption<Scheduler> = const { LocalOption::none() };
}

/// Per-OS-thread scheduler state: the registry that owns every control
/// block and the ready queue that orders the runnable ones.
///
/// Methods only mutate state. The context switch they ask for is returned to
/// the caller, which performs it after the thread-local borrow is released.
pub struct Scheduler {
    pub(crate) registry: Registry,
    pub(crate) ready: ReadyQueue,
    pub(crate) config: SchedulerConfig,
    /// Entries of reclaimed threads that never started. Dropped by the
    /// caller once the thread-local borrow is released.
    pub(crate) unstarted: Vec<Entry>,
}

/// A switch from the running thread to the new queue head.
#[must_use]
pub(crate) struct Switch {
    from: *mut Context,
    to: *const Context,
}

impl Switch {
    /// Returns when some later switch targets the suspended thread again.
    pub(crate) fn run(self) {
        // Both contexts belong to live control blocks and nothing can
        // reclaim them between planning and switching.
        unsafe { Context::switch(self.from, self.to) }.or_die("switch context");
    }
}

pub(crate) enum Join {
    Finished(ExitStatus),
    Wait(Switch),
}

pub(crate) enum Exit {
    /// Continue in the next thread; the exiting one is never resumed.
    Resume(*const Context),
    /// The exiting thread was the last one.
    Last(Tid),
}

impl Scheduler {
    /// Build a scheduler whose thread 0 is the calling context.
    pub fn new(config: SchedulerConfig) -> Result<Self, PlatformError> {
        let mut registry = Registry::with_capacity(config.initial_capacity);
        let tid = registry.allocate()?;
        let mut main = ThreadControlBlock::new(tid, ThreadContext::capture_current()?, None);
        main.state = ThreadState::Running;
        registry.insert(main);

        let mut ready = ReadyQueue::new();
        ready.push_back(tid);

        debug::writeln!(
            "[SCHED] init tid={} stack_size={:#x} capacity={}",
            tid,
            config.stack_size,
            config.initial_capacity
        );
        Ok(Self {
            registry,
            ready,
            config,
            unstarted: Vec::new(),
        })
    }

    pub fn init(config: SchedulerConfig) -> Result<(), Error> {
        if Self::is_initialized() {
            return Err(Error::AlreadyInitialized);
        }
        let scheduler = Scheduler::new(config).or_die("init scheduler");
        SCHEDULER.with(|slot| slot.set(scheduler));
        Ok(())
    }

    pub fn is_initialized() -> bool {
        SCHEDULER.with(LocalOption::is_some)
    }

    #[inline(always)]
    pub fn with_mut<R>(f: impl FnOnce(&mut Scheduler) -> R) -> Option<R> {
        SCHEDULER.with(|slot| slot.with_some_mut(f))
    }

    /// Detach this OS thread's scheduler. Dropping it releases every thread.
    pub fn uninstall() -> Option<Scheduler> {
        SCHEDULER.with(LocalOption::take)
    }

    #[inline]
    pub fn current_tid(&self) -> Option<Tid> {
        self.ready.current()
    }

    #[inline]
    pub fn thread_count(&self) -> usize {
        self.registry.live()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn state(&self, tid: Tid) -> Option<ThreadState> {
        self.registry.get(tid).map(|tcb| tcb.state)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ready_queue(&self) -> &ReadyQueue {
        &self.ready
    }

    /// Whether the running thread executes on a stack this scheduler owns.
    pub fn running_on_own_stack(&self) -> bool {
        self.current_tid()
            .and_then(|tid| self.registry.live_tcb(tid))
            .and_then(ThreadControlBlock::context)
            .is_some_and(ThreadContext::owns_stack)
    }

    fn running(&self) -> Result<Tid, Error> {
        self.ready.current().ok_or(Error::NotInitialized)
    }

    fn tcb(&self, tid: Tid) -> &ThreadControlBlock {
        match self.registry.get(tid) {
            Some(tcb) => tcb,
            None => kfn::invariant("scheduled thread has no control block"),
        }
    }

    fn tcb_mut(&mut self, tid: Tid) -> &mut ThreadControlBlock {
        match self.registry.get_mut(tid) {
            Some(tcb) => tcb,
            None => kfn::invariant("scheduled thread has no control block"),
        }
    }

    fn context_ptr(&self, tid: Tid) -> *mut Context {
        match self.tcb(tid).context() {
            Some(ctx) => ctx.as_ptr(),
            None => kfn::invariant("switch into a reclaimed thread"),
        }
    }

    fn switch_to(&self, from: Tid, to: Tid) -> Switch {
        Switch {
            from: self.context_ptr(from),
            to: self.context_ptr(to),
        }
    }

    /// Range, self and existence checks shared by join and cancel.
    fn target(&self, caller: Tid, tid: Tid) -> Result<&ThreadControlBlock, Error> {
        if tid >= self.registry.capacity() {
            return Err(Error::InvalidId(tid));
        }
        if tid == caller {
            return Err(Error::SelfTarget(tid));
        }
        self.registry.get(tid).ok_or(Error::UnknownThread(tid))
    }

    /// Whether `from` waits, directly or through a join chain, on `to`.
    fn waits_on(&self, from: Tid, to: Tid) -> bool {
        let mut cursor = from;
        for _ in 0..self.registry.capacity() {
            match self.registry.get(cursor).and_then(|tcb| tcb.blocked_by) {
                Some(next) if next == to => return true,
                Some(next) => cursor = next,
                None => return false,
            }
        }
        false
    }

    /// Reclaim `tid` now and release its stack.
    fn reclaim(&mut self, tid: Tid) {
        if let Some(reclaimed) = self.registry.reclaim(tid) {
            debug::writeln!("[SCHED] reclaim tid={}", tid);
            reclaimed.context.release().or_die("release thread stack");
            self.unstarted.extend(reclaimed.entry);
        }
    }

    /// Hand over the entries of reclaimed, never-started threads.
    pub(crate) fn take_unstarted(&mut self) -> Vec<Entry> {
        core::mem::take(&mut self.unstarted)
    }

    /// Make `waiter` runnable again and hand it the reclamation of `target`.
    fn wake_joiner(&mut self, waiter: Tid, target: Tid) {
        let tcb = self.tcb_mut(waiter);
        tcb.state = ThreadState::Ready;
        tcb.blocked_by = None;
        self.ready.push_back(waiter);

        let tcb = self.tcb_mut(target);
        tcb.blocking = None;
        tcb.reaper = Some(waiter);
        debug::writeln!("[SCHED] wake tid={} (target {})", waiter, target);
    }

    pub(crate) fn spawn(
        &mut self,
        entry: Entry,
        trampoline: extern "C" fn(),
    ) -> Result<Tid, PlatformError> {
        let tid = self.registry.allocate()?;
        let context = ThreadContext::spawn(self.config.stack_size, trampoline)?;
        self.registry
            .insert(ThreadControlBlock::new(tid, context, Some(entry)));
        self.ready.push_back(tid);
        debug::writeln!("[SCHED] create tid={} live={}", tid, self.registry.live());
        Ok(tid)
    }

    pub(crate) fn take_current_entry(&mut self) -> Option<Entry> {
        let tid = self.ready.current()?;
        self.registry.get_mut(tid)?.entry.take()
    }

    pub(crate) fn prepare_yield(&mut self) -> Result<Switch, Error> {
        let current = self.running()?;
        if self.ready.len() < 2 {
            return Err(Error::NoPeer);
        }

        self.tcb_mut(current).state = ThreadState::Ready;
        let next = match self.ready.advance() {
            Some(next) => next,
            None => kfn::invariant("ready queue drained during yield"),
        };
        self.tcb_mut(next).state = ThreadState::Running;

        debug::writeln!("[SCHED] yield {} -> {}", current, next);
        Ok(self.switch_to(current, next))
    }

    pub(crate) fn begin_join(&mut self, tid: Tid) -> Result<Join, Error> {
        let caller = self.running()?;
        let target = self.target(caller, tid)?;

        if target.state == ThreadState::Cancelled {
            return Ok(Join::Finished(ExitStatus::Cancelled));
        }
        if target.is_reclaimed() {
            return Err(Error::AlreadyReclaimed(tid));
        }
        if target.blocking.is_some() || target.reaper.is_some() {
            return Err(Error::AlreadyJoined(tid));
        }
        if let ThreadState::Exited(code) = target.state {
            self.reclaim(tid);
            return Ok(Join::Finished(ExitStatus::Exited(code)));
        }
        if self.waits_on(tid, caller) {
            return Err(Error::Deadlock(tid));
        }

        let enqueue_target = target.state == ThreadState::Ready && !self.ready.contains(tid);
        if self.ready.len() < 2 && !enqueue_target {
            return Err(Error::Deadlock(tid));
        }

        self.tcb_mut(tid).blocking = Some(caller);
        let me = self.tcb_mut(caller);
        me.blocked_by = Some(tid);
        me.state = ThreadState::Blocked;
        self.ready.remove(caller);
        if enqueue_target {
            self.ready.push_back(tid);
        }

        let next = match self.ready.current() {
            Some(next) => next,
            None => kfn::invariant("ready queue drained during join"),
        };
        self.tcb_mut(next).state = ThreadState::Running;

        debug::writeln!("[SCHED] join {} on {} -> {}", caller, tid, next);
        Ok(Join::Wait(self.switch_to(caller, next)))
    }

    /// Runs in the joiner once it has been woken and scheduled again.
    pub(crate) fn finish_join(&mut self, tid: Tid) -> ExitStatus {
        let tcb = self.tcb(tid);
        let status = match tcb.state.exit_status() {
            Some(status) => status,
            None => kfn::invariant("joiner resumed before its target finished"),
        };
        debug_assert_eq!(tcb.reaper, self.ready.current());
        self.reclaim(tid);
        debug::writeln!("[SCHED] joined tid={} status={:?}", tid, status);
        status
    }

    pub(crate) fn cancel(&mut self, tid: Tid) -> Result<(), Error> {
        let caller = self.running()?;
        let target = self.target(caller, tid)?;

        if target.is_reclaimed() {
            return Err(Error::AlreadyReclaimed(tid));
        }
        if target.state.is_terminal() {
            return Err(Error::AlreadyFinished(tid));
        }
        let (blocked_by, blocking) = (target.blocked_by, target.blocking);

        // Abandon the victim's own pending join; the other side is not told.
        if let Some(other) = blocked_by {
            if let Some(tcb) = self.registry.get_mut(other) {
                tcb.blocking = None;
            }
            self.tcb_mut(tid).blocked_by = None;
        }
        // A woken joiner that never got to reclaim its target gives it up.
        // An exited target can still be joined; a cancelled one is reclaimed
        // here since no join will ever reclaim it.
        let orphan = self
            .registry
            .iter_mut()
            .find(|tcb| tcb.reaper == Some(tid))
            .map(|tcb| {
                tcb.reaper = None;
                (tcb.tid, tcb.state)
            });
        if let Some((orphan, ThreadState::Cancelled)) = orphan {
            self.reclaim(orphan);
        }

        self.ready.remove(tid);
        self.tcb_mut(tid).state = ThreadState::Cancelled;
        debug::writeln!("[SCHED] cancel tid={} by {}", tid, caller);

        match blocking {
            Some(waiter) => self.wake_joiner(waiter, tid),
            None => self.reclaim(tid),
        }
        Ok(())
    }

    pub(crate) fn prepare_exit(&mut self, code: u8) -> Exit {
        let current = match self.ready.current() {
            Some(tid) => tid,
            None => kfn::invariant("exit with an empty ready queue"),
        };

        let tcb = self.tcb_mut(current);
        if tcb.state == ThreadState::Running {
            tcb.state = ThreadState::Exited(code);
            if let Some(waiter) = tcb.blocking {
                self.wake_joiner(waiter, current);
            }
        }
        self.ready.remove(current);
        debug::writeln!("[SCHED] exit tid={} code={}", current, code);

        match self.ready.current() {
            Some(next) => {
                self.tcb_mut(next).state = ThreadState::Running;
                Exit::Resume(self.context_ptr(next))
            }
            None => Exit::Last(current),
        }
    }

    /// Release every thread. `running` is still executing on its stack, so
    /// that one stack stays mapped.
    pub(crate) fn release_all(&mut self, running: Option<Tid>) {
        let ids: Vec<Tid> = self.registry.iter().map(|tcb| tcb.tid).collect();
        for tid in ids {
            if let Some(reclaimed) = self.registry.reclaim(tid) {
                if Some(tid) == running {
                    reclaimed.context.abandon();
                } else {
                    reclaimed.context.release().or_die("release thread stack");
                }
            }
        }
        while let Some(tid) = self.ready.current() {
            self.ready.remove(tid);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let running = self.ready.current();
        debug::writeln!("[SCHED] teardown live={}", self.registry.live());
        self.release_all(running);
    }
}
