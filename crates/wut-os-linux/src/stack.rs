use core::ptr::{self, NonNull};
use std::io;

use foundation::utils::align_up;
use foundation::{PlatformError, Stack};

const FALLBACK_PAGE_SIZE: usize = 4096;

/// Smallest usable stack handed out, whatever the caller asks for.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

pub fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// Anonymous private mapping with one `PROT_NONE` guard page at the low end.
///
/// ```text
/// map                 base                              top
///  | guard (no access) | usable, grows down  <---------- |
/// ```
#[derive(Debug)]
pub struct MmapStack {
    map: NonNull<u8>,
    map_len: usize,
    guard: usize,
}

impl Stack for MmapStack {
    fn allocate(size: usize) -> Result<Self, PlatformError> {
        let page = page_size();
        let usable =
            align_up(size.max(MIN_STACK_SIZE), page).ok_or(PlatformError::StackSize(size))?;
        let map_len = usable
            .checked_add(page)
            .ok_or(PlatformError::StackSize(size))?;

        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_STACK,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(PlatformError::StackMap(io::Error::last_os_error()));
        }

        if unsafe { libc::mprotect(addr, page, libc::PROT_NONE) } != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::munmap(addr, map_len) };
            return Err(PlatformError::StackGuard(err));
        }

        debug::writeln!("[STACK] map {:p} len={:#x}", addr, map_len);

        Ok(Self {
            // mmap never returns null on success.
            map: unsafe { NonNull::new_unchecked(addr.cast()) },
            map_len,
            guard: page,
        })
    }

    #[inline]
    fn base(&self) -> *mut u8 {
        self.map.as_ptr().wrapping_add(self.guard)
    }

    #[inline]
    fn size(&self) -> usize {
        self.map_len - self.guard
    }

    fn release(self) -> Result<(), PlatformError> {
        debug::writeln!("[STACK] unmap {:p} len={:#x}", self.map, self.map_len);
        if unsafe { libc::munmap(self.map.as_ptr().cast(), self.map_len) } == -1 {
            return Err(PlatformError::StackUnmap(io::Error::last_os_error()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_rounds_to_pages_and_is_writable() {
        let page = page_size();
        let stack = MmapStack::allocate(MIN_STACK_SIZE + 1).unwrap();
        assert_eq!(stack.size() % page, 0);
        assert!(stack.size() > MIN_STACK_SIZE);
        assert_eq!(stack.base() as usize % page, 0);
        assert_eq!(stack.top(), stack.base() as usize + stack.size());

        unsafe {
            stack.base().write(0xAA);
            ((stack.top() - 1) as *mut u8).write(0x55);
            assert_eq!(stack.base().read(), 0xAA);
        }
        stack.release().unwrap();
    }

    #[test]
    fn tiny_requests_get_the_minimum() {
        let stack = MmapStack::allocate(1).unwrap();
        assert!(stack.size() >= MIN_STACK_SIZE);
        stack.release().unwrap();
    }

    #[test]
    fn absurd_sizes_are_rejected() {
        let err = MmapStack::allocate(usize::MAX).unwrap_err();
        assert!(matches!(err, PlatformError::StackSize(_)));
    }
}
