use crate::error::PlatformError;

/// Terminate the process with `code`.
#[inline]
pub fn kexit(code: i32) -> ! {
    std::process::exit(code)
}

/// Fatal path: print a diagnostic and terminate with the error's OS code.
#[cold]
pub fn die(what: &str, err: PlatformError) -> ! {
    debug::fatal_line(format_args!("fatal: {what}: {err}"));
    kexit(err.exit_code())
}

/// Fatal path for broken runtime invariants.
#[cold]
pub fn invariant(what: &str) -> ! {
    debug::fatal_line(format_args!("fatal: invariant violated: {what}"));
    std::process::abort()
}

/// Unwrap a collaborator result or take the fatal path.
pub trait OrDie<T> {
    fn or_die(self, what: &str) -> T;
}

impl<T> OrDie<T> for Result<T, PlatformError> {
    #[inline]
    fn or_die(self, what: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) => die(what, e),
        }
    }
}
