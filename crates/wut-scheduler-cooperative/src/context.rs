use core::ptr::NonNull;

use foundation::kfn::OrDie;
use foundation::{ExecutionContext, PlatformError, Stack};

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "linux", target_env = "gnu"))] {
        pub type Context = os_linux::UContext;
        pub type ThreadStack = os_linux::MmapStack;
    } else {
        compile_error!("wut needs a glibc Linux target for its context primitive");
    }
}

/// Execution context of one logical thread and the stack it runs on.
///
/// The entry thread runs on the stack it was born with, so it owns none.
/// Dropping a `ThreadContext` releases both; the thread must not be running.
pub struct ThreadContext {
    ctx: NonNull<Context>,
    stack: Option<ThreadStack>,
}

impl ThreadContext {
    /// Capture the calling context. Used for the entry thread.
    pub fn capture_current() -> Result<Self, PlatformError> {
        let mut ctx = Context::empty();
        ctx.capture()?;
        Ok(Self {
            ctx: NonNull::from(Box::leak(ctx)),
            stack: None,
        })
    }

    /// Allocate a stack and prepare a context that starts at `entry` on it.
    pub fn spawn(stack_size: usize, entry: extern "C" fn()) -> Result<Self, PlatformError> {
        let stack = ThreadStack::allocate(stack_size)?;
        let mut ctx = Context::empty();
        if let Err(err) = unsafe { ctx.prepare(&stack, entry) } {
            // The stack is untouched; the prepare failure is the one worth reporting.
            let _ = stack.release();
            return Err(err);
        }
        Ok(Self {
            ctx: NonNull::from(Box::leak(ctx)),
            stack: Some(stack),
        })
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut Context {
        self.ctx.as_ptr()
    }

    #[inline]
    pub fn owns_stack(&self) -> bool {
        self.stack.is_some()
    }

    pub fn stack(&self) -> Option<&ThreadStack> {
        self.stack.as_ref()
    }

    /// Release the stack and context, reporting a failed unmap.
    pub fn release(mut self) -> Result<(), PlatformError> {
        match self.stack.take() {
            Some(stack) => stack.release(),
            None => Ok(()),
        }
    }

    /// Drop the context but keep the stack mapped. For the thread that is
    /// still executing on it when the process goes away.
    pub fn abandon(mut self) {
        core::mem::forget(self.stack.take());
    }
}

impl Drop for ThreadContext {
    fn drop(&mut self) {
        if let Some(stack) = self.stack.take() {
            stack.release().or_die("release thread stack");
        }
        unsafe { drop(Box::from_raw(self.ctx.as_ptr())) };
    }
}

impl core::fmt::Debug for ThreadContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadContext")
            .field("ctx", &self.ctx)
            .field("owns_stack", &self.owns_stack())
            .finish()
    }
}
