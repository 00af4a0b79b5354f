use foundation::PlatformError;

use crate::context::ThreadContext;
use crate::thread::{Entry, ThreadControlBlock, Tid};

pub const DEFAULT_CAPACITY: usize = 5;

/// What [`Registry::reclaim`] detaches from a control block.
pub struct Reclaimed {
    pub context: ThreadContext,
    /// Entry closure of a thread that never started. Its captures may call
    /// back into the scheduler when dropped.
    pub entry: Option<Entry>,
}

/// Slot store of control blocks indexed by [`Tid`].
///
/// A slot is free when it was never used or its block has been reclaimed.
/// Reclaimed blocks stay as tombstones so their terminal state can still be
/// read until the slot is reused.
#[derive(Debug)]
pub struct Registry {
    slots: Vec<Option<ThreadControlBlock>>,
    live: usize,
    growths: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Registry {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity.max(1), || None);
        Self {
            slots,
            live: 0,
            growths: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Blocks that still own a context.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    /// How many times the slot array has doubled.
    #[inline]
    pub fn growths(&self) -> usize {
        self.growths
    }

    /// Lowest free id, doubling the slot array when every slot is taken.
    pub fn allocate(&mut self) -> Result<Tid, PlatformError> {
        let free = self
            .slots
            .iter()
            .position(|slot| slot.as_ref().is_none_or(ThreadControlBlock::is_reclaimed));
        if let Some(tid) = free {
            return Ok(tid);
        }

        let tid = self.slots.len();
        self.grow()?;
        Ok(tid)
    }

    fn grow(&mut self) -> Result<(), PlatformError> {
        let old = self.slots.len();
        let new = old
            .checked_mul(2)
            .ok_or(PlatformError::RegistryGrowth(usize::MAX))?;
        self.slots
            .try_reserve_exact(new - old)
            .map_err(|_| PlatformError::RegistryGrowth(new))?;
        self.slots.resize_with(new, || None);
        self.growths += 1;
        debug::writeln!("[REGISTRY] grow {} -> {}", old, new);
        Ok(())
    }

    /// Store `tcb` at its id, replacing a vacant slot or a tombstone.
    pub fn insert(&mut self, tcb: ThreadControlBlock) {
        let tid = tcb.tid;
        debug_assert!(
            self.slots[tid]
                .as_ref()
                .is_none_or(ThreadControlBlock::is_reclaimed),
            "slot {tid} is still live"
        );
        if !tcb.is_reclaimed() {
            self.live += 1;
        }
        self.slots[tid] = Some(tcb);
    }

    /// The block at `tid`, tombstones included.
    #[inline]
    pub fn get(&self, tid: Tid) -> Option<&ThreadControlBlock> {
        self.slots.get(tid)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, tid: Tid) -> Option<&mut ThreadControlBlock> {
        self.slots.get_mut(tid)?.as_mut()
    }

    /// The block at `tid` unless it has been reclaimed.
    pub fn live_tcb(&self, tid: Tid) -> Option<&ThreadControlBlock> {
        self.get(tid).filter(|tcb| !tcb.is_reclaimed())
    }

    /// Detach the context (and stack) of `tid`, leaving a tombstone behind.
    /// The caller decides how to release the context and when to drop the entry.
    pub fn reclaim(&mut self, tid: Tid) -> Option<Reclaimed> {
        let tcb = self.get_mut(tid)?;
        let context = tcb.context.take()?;
        let entry = tcb.entry.take();
        tcb.blocking = None;
        tcb.blocked_by = None;
        tcb.reaper = None;
        self.live -= 1;
        Some(Reclaimed { context, entry })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreadControlBlock> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ThreadControlBlock> {
        self.slots.iter_mut().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::ThreadState;

    fn tcb(tid: Tid) -> ThreadControlBlock {
        ThreadControlBlock::new(tid, ThreadContext::capture_current().unwrap(), None)
    }

    fn fill(registry: &mut Registry) -> Tid {
        let tid = registry.allocate().unwrap();
        registry.insert(tcb(tid));
        tid
    }

    #[test]
    fn allocates_lowest_free_slot() {
        let mut registry = Registry::with_capacity(3);
        assert_eq!(fill(&mut registry), 0);
        assert_eq!(fill(&mut registry), 1);
        assert_eq!(fill(&mut registry), 2);
        assert_eq!(registry.live(), 3);
        assert_eq!(registry.growths(), 0);
    }

    #[test]
    fn grows_by_doubling_when_full() {
        let mut registry = Registry::with_capacity(2);
        fill(&mut registry);
        fill(&mut registry);
        assert_eq!(fill(&mut registry), 2);
        assert_eq!(registry.capacity(), 4);
        assert_eq!(registry.growths(), 1);
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn reclaimed_slot_is_reused_and_keeps_state_until_then() {
        let mut registry = Registry::with_capacity(4);
        fill(&mut registry);
        let victim = fill(&mut registry);
        fill(&mut registry);

        registry.get_mut(victim).unwrap().state = ThreadState::Cancelled;
        registry.reclaim(victim).unwrap().context.release().unwrap();
        assert_eq!(registry.live(), 2);
        assert!(registry.live_tcb(victim).is_none());
        assert_eq!(registry.get(victim).unwrap().state, ThreadState::Cancelled);
        assert!(registry.reclaim(victim).is_none());

        assert_eq!(fill(&mut registry), victim);
        assert_eq!(registry.get(victim).unwrap().state, ThreadState::Ready);
        assert_eq!(registry.live(), 3);
    }

    #[test]
    fn reclaim_clears_links() {
        let mut registry = Registry::with_capacity(2);
        let a = fill(&mut registry);
        let b = fill(&mut registry);
        {
            let tcb = registry.get_mut(b).unwrap();
            tcb.blocking = Some(a);
            tcb.reaper = Some(a);
        }
        let reclaimed = registry.reclaim(b).unwrap();
        assert!(reclaimed.entry.is_none());
        drop(reclaimed);
        let tcb = registry.get(b).unwrap();
        assert_eq!(tcb.blocking, None);
        assert_eq!(tcb.reaper, None);
        assert!(tcb.is_reclaimed());
    }

    #[test]
    fn reclaim_hands_back_unstarted_entry() {
        let mut registry = Registry::with_capacity(1);
        let tid = registry.allocate().unwrap();
        let context = ThreadContext::capture_current().unwrap();
        registry.insert(ThreadControlBlock::new(tid, context, Some(Box::new(|| {}))));

        let reclaimed = registry.reclaim(tid).unwrap();
        assert!(reclaimed.entry.is_some());
        assert!(registry.get(tid).unwrap().entry.is_none());
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let registry = Registry::with_capacity(2);
        assert!(registry.get(0).is_none());
        assert!(registry.get(99).is_none());
    }
}
