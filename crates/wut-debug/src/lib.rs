//! Trace output for the runtime.
//!
//! `writeln!` is a no-op unless the `debug` feature is enabled. Arguments are
//! still type-checked so traces cannot rot while the feature is off.

use core::fmt;
use std::io::Write;

pub const PREFIX: &str = "[wut]";

cfg_if::cfg_if! {
    if #[cfg(feature = "debug")] {
        pub const ENABLED: bool = true;
    } else {
        pub const ENABLED: bool = false;
    }
}

#[doc(hidden)]
pub fn write_line(args: fmt::Arguments<'_>) {
    let mut stderr = std::io::stderr().lock();
    // Tracing must never take the runtime down.
    let _ = stderr.write_fmt(format_args!("{PREFIX} {args}\n"));
}

/// Writes a diagnostic line unconditionally. Used on the fatal path.
pub fn fatal_line(args: fmt::Arguments<'_>) {
    write_line(args);
}

#[macro_export]
macro_rules! writeln {
    ($($arg:tt)*) => {{
        if $crate::ENABLED {
            $crate::write_line(::core::format_args!($($arg)*));
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn writeln_accepts_format_arguments() {
        let tid = 3usize;
        crate::writeln!("[SCHED] yield {} -> {}", tid, tid + 1);
        crate::writeln!("[SCHED] plain");
    }
}
