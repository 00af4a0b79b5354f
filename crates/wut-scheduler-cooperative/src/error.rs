use thiserror::Error;

use crate::thread::Tid;

/// Misuse of the scheduler API.
///
/// These are logic errors in the caller and leave the scheduler untouched.
/// Resource exhaustion is not reported here: it is fatal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("scheduler is not initialized on this OS thread")]
    NotInitialized,

    #[error("scheduler is already initialized on this OS thread")]
    AlreadyInitialized,

    #[error("thread id {0} is out of range")]
    InvalidId(Tid),

    #[error("thread {0} cannot target itself")]
    SelfTarget(Tid),

    #[error("thread {0} was never created")]
    UnknownThread(Tid),

    #[error("thread {0} has already been reclaimed")]
    AlreadyReclaimed(Tid),

    #[error("thread {0} already has a joiner")]
    AlreadyJoined(Tid),

    #[error("thread {0} has already finished")]
    AlreadyFinished(Tid),

    #[error("joining thread {0} would deadlock")]
    Deadlock(Tid),

    #[error("no other runnable thread to yield to")]
    NoPeer,

    #[error("teardown must run on the entry context, not on a scheduler-owned stack")]
    TeardownFromSpawnedThread,
}
