use core::mem;
use core::ptr;
use std::io;

use foundation::kfn;
use foundation::{ExecutionContext, PlatformError, Stack};

/// glibc `ucontext_t`. Boxed on creation and never moved: glibc keeps a
/// pointer from `uc_mcontext.fpregs` into the same struct.
#[repr(transparent)]
pub struct UContext {
    uc: libc::ucontext_t,
}

impl ExecutionContext for UContext {
    fn empty() -> Box<Self> {
        Box::new(Self {
            uc: unsafe { mem::zeroed() },
        })
    }

    fn capture(&mut self) -> Result<(), PlatformError> {
        // The snapshot is only ever overwritten (by makecontext or a later
        // swapcontext) before it is resumed, so getcontext returns once.
        if unsafe { libc::getcontext(&mut self.uc) } == -1 {
            return Err(PlatformError::Capture(io::Error::last_os_error()));
        }
        Ok(())
    }

    unsafe fn prepare<S: Stack>(
        &mut self,
        stack: &S,
        entry: extern "C" fn(),
    ) -> Result<(), PlatformError> {
        self.capture()?;
        self.uc.uc_stack.ss_sp = stack.base().cast();
        self.uc.uc_stack.ss_size = stack.size();
        self.uc.uc_stack.ss_flags = 0;
        self.uc.uc_link = ptr::null_mut();
        libc::makecontext(&mut self.uc, entry, 0);
        Ok(())
    }

    unsafe fn switch(from: *mut Self, to: *const Self) -> Result<(), PlatformError> {
        if libc::swapcontext(ptr::addr_of_mut!((*from).uc), ptr::addr_of!((*to).uc)) == -1 {
            return Err(PlatformError::Switch(io::Error::last_os_error()));
        }
        Ok(())
    }

    unsafe fn resume(to: *const Self) -> ! {
        libc::setcontext(ptr::addr_of!((*to).uc));
        kfn::die(
            "setcontext",
            PlatformError::Switch(io::Error::last_os_error()),
        )
    }
}
