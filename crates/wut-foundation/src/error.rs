use std::io;

use thiserror::Error;

/// Failure reported by a platform collaborator.
///
/// None of these are recoverable for the runtime: a thread cannot run without
/// its stack or context. Callers hand them to [`crate::kfn::die`].
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("mmap stack failed: {0}")]
    StackMap(#[source] io::Error),

    #[error("mprotect guard page failed: {0}")]
    StackGuard(#[source] io::Error),

    #[error("munmap stack failed: {0}")]
    StackUnmap(#[source] io::Error),

    #[error("stack size {0} is not representable")]
    StackSize(usize),

    #[error("getcontext failed: {0}")]
    Capture(#[source] io::Error),

    #[error("swapcontext failed: {0}")]
    Switch(#[source] io::Error),

    #[error("registry growth to {0} slots failed")]
    RegistryGrowth(usize),
}

impl PlatformError {
    /// Exit status for the fatal path: the OS error code when there is one.
    pub fn exit_code(&self) -> i32 {
        let os = match self {
            Self::StackMap(e)
            | Self::StackGuard(e)
            | Self::StackUnmap(e)
            | Self::Capture(e)
            | Self::Switch(e) => e.raw_os_error(),
            Self::StackSize(_) => Some(libc::EINVAL),
            Self::RegistryGrowth(_) => Some(libc::ENOMEM),
        };
        match os {
            Some(code) if code != 0 => code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_prefers_os_error() {
        let err = PlatformError::StackMap(io::Error::from_raw_os_error(libc::ENOMEM));
        assert_eq!(err.exit_code(), libc::ENOMEM);
        assert!(err.to_string().starts_with("mmap stack failed"));
    }

    #[test]
    fn exit_code_is_never_zero() {
        let err = PlatformError::Switch(io::Error::other("synthetic"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(PlatformError::RegistryGrowth(10).exit_code(), libc::ENOMEM);
    }
}
