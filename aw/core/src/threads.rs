use serde::{Deserialize, Serialize};
use tracing::debug;

pub const THREAD_COUNT: usize = 64;
pub const THREAD_ID_MASK: u8 = 0x3F;

/// Program counter value of a thread that has nothing to run.
pub const INACTIVE_PC: u16 = 0xFFFF;
/// Wire encoding of "no pending program counter change".
pub const NO_PC_REQUEST: u16 = 0xFFFF;
/// Wire encoding of "kill at the next tick boundary".
pub const KILL_PC_REQUEST: u16 = 0xFFFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadState {
    #[default]
    Running,
    Paused,
}

impl ThreadState {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Running),
            1 => Some(Self::Paused),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PcRequest {
    #[default]
    None,
    Jump(u16),
    Kill,
}

impl PcRequest {
    pub fn to_wire(self) -> u16 {
        match self {
            Self::None => NO_PC_REQUEST,
            Self::Jump(pc) => pc,
            Self::Kill => KILL_PC_REQUEST,
        }
    }

    pub fn from_wire(value: u16) -> Self {
        match value {
            NO_PC_REQUEST => Self::None,
            KILL_PC_REQUEST => Self::Kill,
            pc => Self::Jump(pc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub current_pc: u16,
    pub requested_pc: PcRequest,
    pub state: ThreadState,
    pub requested_state: ThreadState,
    /// Last opcode fetched by this thread.
    pub opcode: u8,
    #[serde(skip)]
    pub yielded: bool,
}

impl Default for Thread {
    fn default() -> Self {
        Self {
            current_pc: INACTIVE_PC,
            requested_pc: PcRequest::None,
            state: ThreadState::Running,
            requested_state: ThreadState::Running,
            opcode: 0x3F,
            yielded: false,
        }
    }
}

impl Thread {
    pub fn is_active(&self) -> bool {
        self.current_pc != INACTIVE_PC
    }

    pub fn is_runnable(&self) -> bool {
        self.is_active() && self.state == ThreadState::Running
    }
}

/// A write to another thread's requested fields, held until the next tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PendingUpdate {
    Pc { thread: u8, request: PcRequest },
    State { thread: u8, state: ThreadState },
}

/// Fixed table of 64 cooperative threads addressed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadTable {
    threads: [Thread; THREAD_COUNT],
    pending: Vec<PendingUpdate>,
}

impl Default for ThreadTable {
    fn default() -> Self {
        Self {
            threads: [Thread::default(); THREAD_COUNT],
            pending: Vec::new(),
        }
    }
}

impl ThreadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every slot inactive with no requests, thread 0 ready to run from offset 0.
    pub fn restart(&mut self) {
        self.threads = [Thread::default(); THREAD_COUNT];
        self.pending.clear();
        self.threads[0].current_pc = 0;
    }

    pub fn get(&self, id: u8) -> &Thread {
        &self.threads[(id & THREAD_ID_MASK) as usize]
    }

    pub fn get_mut(&mut self, id: u8) -> &mut Thread {
        &mut self.threads[(id & THREAD_ID_MASK) as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Thread> {
        self.threads.iter()
    }

    pub fn active_count(&self) -> usize {
        self.threads.iter().filter(|t| t.is_active()).count()
    }

    pub fn pending(&self) -> &[PendingUpdate] {
        &self.pending
    }

    pub fn request_pc(&mut self, thread: u8, request: PcRequest) {
        self.pending.push(PendingUpdate::Pc {
            thread: thread & THREAD_ID_MASK,
            request,
        });
    }

    pub fn request_state(&mut self, thread: u8, state: ThreadState) {
        self.pending.push(PendingUpdate::State {
            thread: thread & THREAD_ID_MASK,
            state,
        });
    }

    /// Drain queued updates in issue order, then promote every request.
    ///
    /// Requested state is sticky: it stays in place and is re-applied on every
    /// boundary. A requested program counter is consumed.
    pub fn apply_pending(&mut self) {
        if !self.pending.is_empty() {
            debug!(updates = self.pending.len(), "applying thread updates");
        }
        for update in self.pending.drain(..) {
            match update {
                PendingUpdate::Pc { thread, request } => {
                    self.threads[thread as usize].requested_pc = request;
                }
                PendingUpdate::State { thread, state } => {
                    self.threads[thread as usize].requested_state = state;
                }
            }
        }
        for thread in self.threads.iter_mut() {
            thread.state = thread.requested_state;
            match thread.requested_pc {
                PcRequest::None => {}
                PcRequest::Jump(pc) => thread.current_pc = pc,
                PcRequest::Kill => thread.current_pc = INACTIVE_PC,
            }
            thread.requested_pc = PcRequest::None;
        }
    }

    pub fn threads(&self) -> &[Thread; THREAD_COUNT] {
        &self.threads
    }

    pub fn restore(&mut self, threads: [Thread; THREAD_COUNT], pending: Vec<PendingUpdate>) {
        self.threads = threads;
        self.pending = pending;
    }
}
