mod cancellable;
mod clock;
mod sequencer;

pub use cancellable::{CancellableTimer, TimerStatus, TimerTick};
pub use clock::{display_hour, NightClock};
pub use sequencer::{Phase, PhaseSequencer, SequencerState};

/// Convert configured seconds to whole milliseconds. Negative and NaN
/// inputs clamp to zero.
pub fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_nan() || secs <= 0.0 {
        return 0;
    }
    (secs * 1000.0).round() as u64
}
