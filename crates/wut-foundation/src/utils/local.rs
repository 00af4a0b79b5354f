use core::cell::RefCell;

/// An optional value owned by one OS thread, meant to sit in a `thread_local!`.
///
/// Access is closure-scoped. A closure must not switch contexts: the borrow
/// would still be held by the suspended thread when the next one arrives.
pub struct LocalOption<T> {
    slot: RefCell<Option<T>>,
}

impl<T> Default for LocalOption<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> LocalOption<T> {
    pub const fn none() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }

    /// Install `value`, handing back the previous one.
    pub fn set(&self, value: T) -> Option<T> {
        self.borrow_mut().replace(value)
    }

    pub fn take(&self) -> Option<T> {
        self.borrow_mut().take()
    }

    pub fn is_some(&self) -> bool {
        self.with_some(|_| ()).is_some()
    }

    #[inline(always)]
    pub fn with_some_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.borrow_mut().as_mut().map(f)
    }

    #[inline(always)]
    pub fn with_some<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        match self.slot.try_borrow() {
            Ok(slot) => slot.as_ref().map(f),
            Err(_) => crate::kfn::invariant("re-entrant access to a thread-local slot"),
        }
    }

    fn borrow_mut(&self) -> core::cell::RefMut<'_, Option<T>> {
        match self.slot.try_borrow_mut() {
            Ok(slot) => slot,
            Err(_) => crate::kfn::invariant("re-entrant access to a thread-local slot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_take_roundtrip() {
        let slot = LocalOption::none();
        assert!(!slot.is_some());
        assert_eq!(slot.with_some_mut(|v: &mut u32| *v), None);

        assert_eq!(slot.set(3), None);
        assert_eq!(slot.with_some_mut(|v| {
            *v += 1;
            *v
        }), Some(4));
        assert_eq!(slot.set(9), Some(4));
        assert_eq!(slot.take(), Some(9));
        assert!(!slot.is_some());
    }
}
