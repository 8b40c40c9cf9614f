//! Cancellable delayed action.
//!
//! Like the rest of the core, the timer has no thread of its own. The owner
//! calls [`CancellableTimer::poll`] once per tick with the frame delta and a
//! cancellation predicate, and reacts to the returned [`TimerTick`].
//!
//! ## State Transitions
//!
//! ```text
//! Pending -> Fired
//! Pending -> Cancelled
//! ```
//!
//! Both resolved states are terminal: a resolved timer answers every later
//! poll with [`TimerTick::Idle`], so `Fire` can be observed at most once.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Pending,
    Fired,
    Cancelled,
}

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Still waiting.
    Pending,
    /// The delay elapsed on this poll. Run the completion effect now.
    Fire,
    /// The predicate held on this poll. The effect must not run.
    Abort,
    /// Already resolved on an earlier poll.
    Idle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellableTimer {
    delay_ms: u64,
    elapsed_ms: u64,
    status: TimerStatus,
}

impl CancellableTimer {
    pub fn start(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            elapsed_ms: 0,
            status: TimerStatus::Pending,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == TimerStatus::Pending
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.delay_ms.saturating_sub(self.elapsed_ms)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Advance by `delta_ms`. The predicate is checked before time is
    /// accumulated, so a cancellation visible on the poll that would have
    /// completed the delay still wins.
    pub fn poll(&mut self, delta_ms: u64, is_cancelled: impl FnOnce() -> bool) -> TimerTick {
        if self.status != TimerStatus::Pending {
            return TimerTick::Idle;
        }
        if is_cancelled() {
            self.status = TimerStatus::Cancelled;
            return TimerTick::Abort;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        if self.elapsed_ms >= self.delay_ms {
            self.status = TimerStatus::Fired;
            return TimerTick::Fire;
        }
        TimerTick::Pending
    }

    /// Cancel from outside a poll. Returns true if the timer was still pending.
    pub fn cancel(&mut self) -> bool {
        if self.status != TimerStatus::Pending {
            return false;
        }
        self.status = TimerStatus::Cancelled;
        true
    }
}
