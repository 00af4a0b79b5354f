//! Seams between the scheduler and the platform it runs on.
//!
//! The scheduler never touches the OS directly. It asks an [`ExecutionContext`]
//! to capture, prepare and switch CPU state, and a [`Stack`] for the memory a
//! fresh thread runs on.

pub mod context;
pub mod error;
pub mod kfn;
pub mod stack;
pub mod utils;

pub use context::ExecutionContext;
pub use error::PlatformError;
pub use stack::Stack;
