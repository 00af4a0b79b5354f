//! Cooperative user-space threads multiplexed on one OS thread.
//!
//! Every OS thread that calls [`init`] gets its own [`Scheduler`]. Logical
//! threads run until they [`yield_now`], [`join`] or [`exit`]; nothing else
//! switches.

pub mod config;
pub mod context;
pub mod error;
pub mod ops;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod thread;

pub use config::{SchedulerConfig, SchedulerConfigBuilder};
pub use context::{Context, ThreadContext, ThreadStack};
pub use error::Error;
pub use ops::{
    cancel, capacity, create, current_id, exit, init, init_with, join, teardown, thread_count,
    thread_state, yield_now, PANIC_EXIT_CODE,
};
pub use queue::ReadyQueue;
pub use registry::Registry;
pub use scheduler::Scheduler;
pub use thread::{ExitStatus, ThreadControlBlock, ThreadState, Tid, CANCELLED_STATUS};
