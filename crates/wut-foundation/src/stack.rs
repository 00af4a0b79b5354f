use crate::error::PlatformError;

/// A memory region a logical thread runs on. Stacks grow downward from
/// [`top`](Stack::top).
pub trait Stack: Sized {
    /// Allocate a region with at least `size` usable bytes.
    fn allocate(size: usize) -> Result<Self, PlatformError>;

    /// Lowest usable address.
    fn base(&self) -> *mut u8;

    /// Usable bytes above [`base`](Stack::base).
    fn size(&self) -> usize;

    #[inline]
    fn top(&self) -> usize {
        self.base() as usize + self.size()
    }

    /// Return the region to the system. The stack must not be in use.
    fn release(self) -> Result<(), PlatformError>;
}
