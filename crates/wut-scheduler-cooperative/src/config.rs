use derive_builder::Builder;

use crate::registry::DEFAULT_CAPACITY;

pub const STACK_SIZE_VAR: &str = "WUT_STACK_SIZE";
pub const INITIAL_CAPACITY_VAR: &str = "WUT_INITIAL_CAPACITY";

pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct SchedulerConfig {
    /// Usable bytes per thread stack. Rounded up to whole pages.
    pub stack_size: usize,
    /// Registry slots before the first growth.
    pub initial_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            initial_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl SchedulerConfig {
    /// Defaults overridden by `WUT_STACK_SIZE` (e.g. `64KiB`) and
    /// `WUT_INITIAL_CAPACITY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    /// Unparseable or zero values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(STACK_SIZE_VAR) {
            let size = parse_size::parse_size(raw.trim())
                .ok()
                .and_then(|size| usize::try_from(size).ok())
                .filter(|&size| size > 0);
            match size {
                Some(size) => config.stack_size = size,
                None => debug::writeln!("[CONFIG] ignoring {}={:?}", STACK_SIZE_VAR, raw),
            }
        }

        if let Some(raw) = lookup(INITIAL_CAPACITY_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.initial_capacity = n,
                _ => debug::writeln!("[CONFIG] ignoring {}={:?}", INITIAL_CAPACITY_VAR, raw),
            }
        }

        config
    }
}

impl SchedulerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.stack_size == Some(0) {
            return Err("stack_size must be non-zero".into());
        }
        if self.initial_capacity == Some(0) {
            return Err("initial_capacity must be at least 1".into());
        }
        Ok(())
    }
}
