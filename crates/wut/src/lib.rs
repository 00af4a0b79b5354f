//! User-space cooperative threads.
//!
//! ```no_run
//! wut::init().unwrap();
//! let tid = wut::create(|| wut::exit(7)).unwrap();
//! assert_eq!(wut::join(tid).unwrap().code(), 7);
//! wut::teardown().unwrap();
//! ```

pub use debug;
pub use foundation;
pub use scheduler_cooperative as scheduler;

pub use foundation::PlatformError;
pub use scheduler_cooperative::{
    cancel, capacity, create, current_id, exit, init, init_with, join, teardown, thread_count,
    thread_state, yield_now, PANIC_EXIT_CODE,
};
pub use scheduler_cooperative::{
    Error, ExitStatus, SchedulerConfig, SchedulerConfigBuilder, ThreadState, Tid,
    CANCELLED_STATUS,
};
