mod director;
mod random;

pub use director::{DoorClips, DoorEventDirector, DoorTiming};
pub use random::{IntervalRange, RandomScheduler, SchedulerTick};
