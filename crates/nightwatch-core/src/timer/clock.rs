//! In-game night clock.
//!
//! One in-game hour passes every `seconds_per_hour` of running time. After
//! `hours_per_night` hours and the trailing delay, the night is over.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::sequencer::{Phase, PhaseSequencer};
use crate::events::Event;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightClock {
    sequencer: PhaseSequencer,
}

impl NightClock {
    pub fn new(ms_per_hour: u64, hours_per_night: u32, trailing_ms: u64) -> Self {
        Self {
            sequencer: PhaseSequencer::new(ms_per_hour, hours_per_night, trailing_ms),
        }
    }

    /// Hours elapsed since the start of the night.
    pub fn current_hour(&self) -> u32 {
        self.sequencer.tick()
    }

    /// Current hour on a 12-hour dial: midnight reads 12.
    pub fn display_hour(&self) -> u32 {
        display_hour(self.current_hour())
    }

    pub fn is_running(&self) -> bool {
        self.sequencer.is_running()
    }

    pub fn is_finished(&self) -> bool {
        self.sequencer.state() == super::SequencerState::Finished
    }

    pub fn start(&mut self) {
        debug!(hours = self.sequencer.total_ticks(), "night clock started");
        self.sequencer.start();
    }

    pub fn stop(&mut self) {
        self.sequencer.stop();
    }

    pub fn step(&mut self, delta_ms: u64) -> Vec<Event> {
        self.sequencer
            .step(delta_ms)
            .into_iter()
            .map(|phase| match phase {
                Phase::Tick(hour) => {
                    debug!(hour, "hour passed");
                    Event::TimeChanged {
                        hour: display_hour(hour),
                    }
                }
                Phase::Finished => {
                    info!("night finished");
                    Event::NightFinished
                }
            })
            .collect()
    }
}

pub fn display_hour(hour: u32) -> u32 {
    if hour == 0 {
        12
    } else {
        hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_maps_midnight_to_twelve() {
        assert_eq!(display_hour(0), 12);
        assert_eq!(display_hour(1), 1);
        assert_eq!(display_hour(6), 6);
    }

    #[test]
    fn full_night_at_frame_rate() {
        let mut clock = NightClock::new(90_000, 6, 5_000);
        clock.start();
        assert_eq!(clock.display_hour(), 12);

        let mut hours = Vec::new();
        let mut finished = 0;
        // 540 s at 20 ms frames.
        for _ in 0..27_000 {
            for event in clock.step(20) {
                match event {
                    Event::TimeChanged { hour } => hours.push(hour),
                    Event::NightFinished => finished += 1,
                    other => panic!("unexpected {other:?}"),
                }
            }
        }
        assert_eq!(hours, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(finished, 0, "must wait out the trailing delay");

        for _ in 0..249 {
            assert!(clock.step(20).is_empty());
        }
        assert_eq!(clock.step(20), vec![Event::NightFinished]);
        assert!(clock.is_finished());
        assert!(clock.step(60_000).is_empty());
    }
}
