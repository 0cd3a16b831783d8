use serde::{Deserialize, Serialize};

/// Milliseconds per unit of the pause register.
pub const DEFAULT_FRAME_SLICE_MS: u32 = 20;
/// How far the gate pushes the deadline while the game is paused or quitting.
pub const IDLE_BACKOFF_MS: u32 = 100;

/// Host-time gate for interpreter ticks.
///
/// Deadlines are absolute tick values. The next deadline is computed from the
/// previous one, not from "now", so small host jitter does not accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameClock {
    pub slice_ms: u32,
    pub previous: u32,
    pub next: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_SLICE_MS)
    }
}

impl FrameClock {
    pub fn new(slice_ms: u32) -> Self {
        Self {
            slice_ms,
            previous: 0,
            next: 0,
        }
    }

    /// Returns `true` when a tick is due. While `idle`, the deadline keeps moving.
    pub fn is_ready(&mut self, now: u32, idle: bool) -> bool {
        if idle {
            self.next = now.wrapping_add(IDLE_BACKOFF_MS);
            return false;
        }
        if now >= self.next {
            self.previous = self.next;
            return true;
        }
        false
    }

    /// Schedule the next tick `pause_slices` frame slices after the previous one,
    /// but never at or before `now`.
    pub fn reschedule(&mut self, now: u32, pause_slices: u16) {
        let delay = pause_slices as u32 * self.slice_ms;
        self.next = self.previous.wrapping_add(delay);
        if self.next <= now {
            self.next = now.wrapping_add(1);
        }
    }

    pub fn next_deadline(&self) -> u32 {
        self.next
    }
}
