use std::collections::VecDeque;

use crate::thread::Tid;

/// Round-robin order of runnable threads. The head is the running thread.
///
/// Holds ids only; the registry owns the control blocks.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    ids: VecDeque<Tid>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> Option<Tid> {
        self.ids.front().copied()
    }

    /// Rotate the head to the tail and return the new head.
    pub fn advance(&mut self) -> Option<Tid> {
        if self.ids.len() > 1 {
            self.ids.rotate_left(1);
        }
        self.current()
    }

    pub fn push_back(&mut self, tid: Tid) {
        debug_assert!(!self.contains(tid), "thread {tid} queued twice");
        self.ids.push_back(tid);
    }

    pub fn remove(&mut self, tid: Tid) -> bool {
        match self.ids.iter().position(|&id| id == tid) {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, tid: Tid) -> bool {
        self.ids.contains(&tid)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tid> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(ids: &[Tid]) -> ReadyQueue {
        let mut q = ReadyQueue::new();
        for &id in ids {
            q.push_back(id);
        }
        q
    }

    #[test]
    fn advance_rotates_in_arrival_order() {
        let mut q = queue(&[0, 1, 2]);
        assert_eq!(q.current(), Some(0));
        assert_eq!(q.advance(), Some(1));
        assert_eq!(q.advance(), Some(2));
        assert_eq!(q.advance(), Some(0));
        assert_eq!(q.iter().collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn advance_single_and_empty() {
        let mut q = queue(&[4]);
        assert_eq!(q.advance(), Some(4));
        let mut empty = ReadyQueue::new();
        assert_eq!(empty.advance(), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn remove_keeps_relative_order() {
        let mut q = queue(&[0, 1, 2, 3]);
        assert!(q.remove(2));
        assert!(!q.remove(2));
        assert!(!q.contains(2));
        assert_eq!(q.iter().collect::<Vec<_>>(), [0, 1, 3]);
        assert!(q.remove(0));
        assert_eq!(q.current(), Some(1));
        assert_eq!(q.len(), 2);
    }
}
