//! Randomized recurring scheduler.
//!
//! While started, the scheduler always has at most one armed attempt: a
//! uniformly chosen candidate from its pool and a uniformly chosen delay.
//! The wait is cancelled as soon as the candidate is seen open. When the
//! delay elapses and the candidate is still closed, the attempt fires.
//! Either way a fresh, independent attempt is armed straight away.
//!
//! The scheduler decides *when* and *where*; the owner applies the effect.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{EntityId, EntityRegistry, ToggleState};
use crate::error::ValidationError;
use crate::timer::{secs_to_ms, CancellableTimer, TimerTick};

/// Half-open range of delays in seconds, `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct IntervalRange {
    min_secs: f64,
    max_secs: f64,
}

impl IntervalRange {
    /// Five to fifteen seconds.
    pub const DEFAULT: Self = Self {
        min_secs: 5.0,
        max_secs: 15.0,
    };

    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self, ValidationError> {
        Self::validated("interval", min_secs, max_secs)
    }

    pub(crate) fn validated(field: &str, min_secs: f64, max_secs: f64) -> Result<Self, ValidationError> {
        if !min_secs.is_finite() || !max_secs.is_finite() || min_secs < 0.0 || max_secs < min_secs {
            return Err(ValidationError::InvalidRange {
                field: field.to_string(),
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self { min_secs, max_secs })
    }

    pub fn min_secs(&self) -> f64 {
        self.min_secs
    }

    pub fn max_secs(&self) -> f64 {
        self.max_secs
    }

    /// Uniform in `[min, max)`, floored to a whole second.
    /// A degenerate range always yields `min`.
    pub fn sample_ms<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let secs = if self.max_secs > self.min_secs {
            rng.gen_range(self.min_secs..self.max_secs)
        } else {
            self.min_secs
        };
        secs_to_ms(secs.floor())
    }
}

impl TryFrom<[f64; 2]> for IntervalRange {
    type Error = ValidationError;

    fn try_from([min, max]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<IntervalRange> for [f64; 2] {
    fn from(range: IntervalRange) -> Self {
        [range.min_secs, range.max_secs]
    }
}

/// One pending attempt.
#[derive(Debug, Clone)]
struct Attempt {
    target: EntityId,
    timer: CancellableTimer,
}

/// What happened on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerTick {
    /// Stopped, or nothing to pick from.
    Idle,
    Waiting,
    /// The candidate opened (or was not closed at fire time). No effect.
    Aborted(EntityId),
    /// Apply the effect to this candidate now.
    Fire(EntityId),
}

#[derive(Debug, Clone)]
pub struct RandomScheduler {
    label: &'static str,
    pool: Vec<EntityId>,
    range: IntervalRange,
    running: bool,
    attempt: Option<Attempt>,
}

impl RandomScheduler {
    pub fn new(label: &'static str, pool: Vec<EntityId>, range: IntervalRange) -> Self {
        Self {
            label,
            pool,
            range,
            running: false,
            attempt: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The armed candidate and the time left before it fires.
    pub fn pending(&self) -> Option<(EntityId, u64)> {
        self.attempt
            .as_ref()
            .map(|a| (a.target, a.timer.remaining_ms()))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.running {
            return;
        }
        self.running = true;
        self.attempt = self.arm(rng);
    }

    /// Drop the pending attempt. Nothing fires after this.
    pub fn stop(&mut self) {
        self.running = false;
        self.attempt = None;
    }

    pub fn step<R: Rng + ?Sized>(
        &mut self,
        delta_ms: u64,
        entities: &EntityRegistry,
        rng: &mut R,
    ) -> SchedulerTick {
        if !self.running {
            return SchedulerTick::Idle;
        }
        let mut attempt = match self.attempt.take().or_else(|| self.arm(rng)) {
            Some(attempt) => attempt,
            // Empty pool: try again next tick.
            None => return SchedulerTick::Idle,
        };

        let target = attempt.target;
        match attempt.timer.poll(delta_ms, || entities.is_open(target)) {
            TimerTick::Pending => {
                self.attempt = Some(attempt);
                SchedulerTick::Waiting
            }
            TimerTick::Fire => {
                self.attempt = self.arm(rng);
                if entities.state(target) == Some(ToggleState::Closed) {
                    debug!(scheduler = self.label, %target, "attempt fired");
                    SchedulerTick::Fire(target)
                } else {
                    SchedulerTick::Aborted(target)
                }
            }
            TimerTick::Abort | TimerTick::Idle => {
                debug!(scheduler = self.label, %target, "attempt cancelled, candidate opened");
                self.attempt = self.arm(rng);
                SchedulerTick::Aborted(target)
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Attempt> {
        let target = *self.pool.choose(rng)?;
        let delay_ms = self.range.sample_ms(rng);
        debug!(scheduler = self.label, %target, delay_ms, "attempt armed");
        Some(Attempt {
            target,
            timer: CancellableTimer::start(delay_ms),
        })
    }
}
