//! Fixed-interval phase sequencer.
//!
//! Counts `total_ticks` discrete ticks, one per `interval_ms`, then waits a
//! trailing delay and reports `Finished` once.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running(0) -> Running(1) -> ... -> Trailing(total) -> Finished
//!   ^                                                              |
//!   +------------------------- stop() / start() -------------------+
//! ```
//!
//! Time overshoot carries over, so one large delta produces every tick it
//! spans, in order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencerState {
    Idle,
    Running,
    /// All ticks done, waiting out the trailing delay.
    Trailing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Tick(u32),
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSequencer {
    interval_ms: u64,
    total_ticks: u32,
    trailing_ms: u64,
    state: SequencerState,
    tick: u32,
    /// Time accumulated toward the next phase boundary.
    elapsed_ms: u64,
}

impl PhaseSequencer {
    /// A zero interval is treated as one millisecond.
    pub fn new(interval_ms: u64, total_ticks: u32, trailing_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            total_ticks,
            trailing_ms,
            state: SequencerState::Idle,
            tick: 0,
            elapsed_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn total_ticks(&self) -> u32 {
        self.total_ticks
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SequencerState::Running | SequencerState::Trailing)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Reset to tick 0 and run. Restarts from scratch if already running.
    pub fn start(&mut self) {
        self.tick = 0;
        self.elapsed_ms = 0;
        self.state = if self.total_ticks == 0 {
            SequencerState::Trailing
        } else {
            SequencerState::Running
        };
    }

    /// Discard progress. There is no resume.
    pub fn stop(&mut self) {
        self.state = SequencerState::Idle;
        self.tick = 0;
        self.elapsed_ms = 0;
    }

    pub fn step(&mut self, delta_ms: u64) -> Vec<Phase> {
        let mut phases = Vec::new();
        if !self.is_running() {
            return phases;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);

        while self.state == SequencerState::Running && self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms -= self.interval_ms;
            self.tick += 1;
            phases.push(Phase::Tick(self.tick));
            if self.tick >= self.total_ticks {
                self.state = SequencerState::Trailing;
            }
        }

        if self.state == SequencerState::Trailing && self.elapsed_ms >= self.trailing_ms {
            self.elapsed_ms = 0;
            self.state = SequencerState::Finished;
            phases.push(Phase::Finished);
        }
        phases
    }
}
