use crate::context::ThreadContext;

pub type Tid = usize;

/// Status reported for a cancelled thread by [`ExitStatus::code`].
pub const CANCELLED_STATUS: i32 = 128;

/// Entry closure of a thread that has not started yet.
pub type Entry = Box<dyn FnOnce() + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Ready,
    Running,
    Blocked,
    Cancelled,
    Exited(u8),
}

impl ThreadState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Exited(_))
    }

    pub fn exit_status(self) -> Option<ExitStatus> {
        match self {
            Self::Exited(code) => Some(ExitStatus::Exited(code)),
            Self::Cancelled => Some(ExitStatus::Cancelled),
            _ => None,
        }
    }
}

/// How a joined thread finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Exited(u8),
    Cancelled,
}

impl ExitStatus {
    /// Numeric status: the exit code, or [`CANCELLED_STATUS`].
    pub fn code(self) -> i32 {
        match self {
            Self::Exited(code) => code as i32,
            Self::Cancelled => CANCELLED_STATUS,
        }
    }

    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}

pub struct ThreadControlBlock {
    pub tid: Tid,

    pub state: ThreadState,

    /// The thread joined on this one.
    pub blocking: Option<Tid>,
    /// The thread this one is joined on.
    pub blocked_by: Option<Tid>,
    /// Woken joiner that still has to reclaim this terminated thread.
    pub reaper: Option<Tid>,

    pub(crate) context: Option<ThreadContext>,
    pub(crate) entry: Option<Entry>,
}

impl ThreadControlBlock {
    pub fn new(tid: Tid, context: ThreadContext, entry: Option<Entry>) -> Self {
        Self {
            tid,
            state: ThreadState::Ready,
            blocking: None,
            blocked_by: None,
            reaper: None,
            context: Some(context),
            entry,
        }
    }

    /// Context and stack are gone; only the terminal state is remembered.
    #[inline]
    pub fn is_reclaimed(&self) -> bool {
        self.context.is_none()
    }

    pub fn context(&self) -> Option<&ThreadContext> {
        self.context.as_ref()
    }
}

impl core::fmt::Debug for ThreadControlBlock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadControlBlock")
            .field("tid", &self.tid)
            .field("state", &self.state)
            .field("blocking", &self.blocking)
            .field("blocked_by", &self.blocked_by)
            .field("reaper", &self.reaper)
            .field("context", &self.context)
            .field("started", &self.entry.is_none())
            .finish()
    }
}
