use crate::error::PlatformError;
use crate::stack::Stack;

/// Saved CPU state of a logical thread.
///
/// Implementations may hold self-referential data (glibc's `ucontext_t` points
/// into itself), so a context is always created boxed and never moved after
/// [`capture`](ExecutionContext::capture) or [`prepare`](ExecutionContext::prepare).
pub trait ExecutionContext: Sized {
    fn empty() -> Box<Self>;

    /// Snapshot the calling context into `self`.
    fn capture(&mut self) -> Result<(), PlatformError>;

    /// Arrange for `self` to start executing `entry` on `stack` the first
    /// time it is switched to. `entry` must never return.
    ///
    /// # Safety
    /// `stack` must outlive every execution of this context.
    unsafe fn prepare<S: Stack>(
        &mut self,
        stack: &S,
        entry: extern "C" fn(),
    ) -> Result<(), PlatformError>;

    /// Save the running context into `from` and continue at `to`.
    ///
    /// Returns only once another switch (or resume) targets `from` again.
    ///
    /// # Safety
    /// Both pointers must be valid, pinned contexts; `to` must have been
    /// captured, prepared or saved by an earlier switch.
    unsafe fn switch(from: *mut Self, to: *const Self) -> Result<(), PlatformError>;

    /// Continue at `to`, abandoning the running context.
    ///
    /// # Safety
    /// Same requirements on `to` as [`switch`](ExecutionContext::switch).
    unsafe fn resume(to: *const Self) -> !;
}
