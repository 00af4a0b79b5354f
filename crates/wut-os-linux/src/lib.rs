//! Linux implementations of the collaborator traits in `foundation`:
//! [`MmapStack`] for thread stacks and [`UContext`] for context switches.

pub mod context;
pub mod stack;

pub use context::UContext;
pub use stack::{page_size, MmapStack, MIN_STACK_SIZE};
