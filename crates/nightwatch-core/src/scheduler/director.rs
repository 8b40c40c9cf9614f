//! Door event director.
//!
//! Drives the scripted scares around the doors of a scene:
//!
//! - **Knocks**: a [`RandomScheduler`] over the knock pool plays a random knock
//!   clip at a closed door.
//! - **Slams**: a second scheduler over the main door forces it open and plays
//!   the slam clip. Only runs when a slam clip exists.
//! - **Jump-scare**: opening the main door arms a countdown. Closing it again
//!   before the countdown ends cancels the scare. Once the scare plays, inputs
//!   are disabled and `JumpscareOccurred` follows after a short aftermath.
//!   With no jump-scare clips the door stays harmless until it is closed.
//!
//! ## Jump-scare States
//!
//! ```text
//! (none) --main door opened--> Countdown --fire--> Aftermath --fire--> Done
//!                                 |
//!                                 +--main door closed--> (none)
//!
//! (none) --main door opened, no clips--> Silent --main door closed--> (none)
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::random::{IntervalRange, RandomScheduler, SchedulerTick};
use crate::entity::{EntityId, EntityRegistry};
use crate::events::Event;
use crate::services::{ClipId, Services};
use crate::timer::{CancellableTimer, TimerTick};

/// Clip pools used by the director.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoorClips {
    #[serde(default)]
    pub knock: Vec<ClipId>,
    #[serde(default)]
    pub jumpscare: Vec<ClipId>,
    #[serde(default)]
    pub slam: Option<ClipId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorTiming {
    pub knock_interval: IntervalRange,
    pub slam_interval: IntervalRange,
    pub time_before_jumpscare_ms: u64,
    pub post_jumpscare_delay_ms: u64,
}

#[derive(Debug, Clone)]
enum Jumpscare {
    Countdown {
        clip: Option<ClipId>,
        timer: CancellableTimer,
    },
    /// The scare has played. No longer cancellable.
    Aftermath { timer: CancellableTimer },
    Done,
    /// Nothing to play. Holds until the main door closes.
    Silent,
}

#[derive(Debug, Clone)]
pub struct DoorEventDirector {
    main_door: EntityId,
    knock: RandomScheduler,
    slam: Option<RandomScheduler>,
    jumpscare: Option<Jumpscare>,
    clips: DoorClips,
    timing: DoorTiming,
    active: bool,
}

impl DoorEventDirector {
    pub fn new(main_door: EntityId, knock_pool: Vec<EntityId>, clips: DoorClips, timing: DoorTiming) -> Self {
        let slam = clips
            .slam
            .as_ref()
            .map(|_| RandomScheduler::new("slam", vec![main_door], timing.slam_interval));
        Self {
            main_door,
            knock: RandomScheduler::new("knock", knock_pool, timing.knock_interval),
            slam,
            jumpscare: None,
            clips,
            timing,
            active: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn main_door(&self) -> EntityId {
        self.main_door
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True between the main door opening and the scare playing.
    pub fn jumpscare_pending(&self) -> bool {
        matches!(self.jumpscare, Some(Jumpscare::Countdown { .. }))
    }

    pub fn knock_scheduler(&self) -> &RandomScheduler {
        &self.knock
    }

    pub fn slam_scheduler(&self) -> Option<&RandomScheduler> {
        self.slam.as_ref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start<R: Rng + ?Sized>(&mut self, entities: &EntityRegistry, rng: &mut R) {
        if self.active {
            return;
        }
        self.active = true;
        self.knock.start(rng);
        if let Some(slam) = self.slam.as_mut() {
            slam.start(rng);
        }
        // The door may already stand open when the director comes up.
        if entities.is_open(self.main_door) {
            self.arm_jumpscare(rng);
        }
    }

    /// Drop every pending timer. Nothing scheduled before this will fire.
    pub fn stop(&mut self) {
        self.active = false;
        self.knock.stop();
        if let Some(slam) = self.slam.as_mut() {
            slam.stop();
        }
        self.jumpscare = None;
    }

    /// React to a notification raised elsewhere in the same tick.
    pub fn observe<R: Rng + ?Sized>(&mut self, event: &Event, rng: &mut R) {
        if !self.active {
            return;
        }
        match event {
            Event::EntityOpened { entity, .. } if *entity == self.main_door => {
                if self.jumpscare.is_none() {
                    self.arm_jumpscare(rng);
                }
            }
            Event::EntityClosed { entity } if *entity == self.main_door => {
                match self.jumpscare.as_mut() {
                    Some(Jumpscare::Countdown { timer, .. }) => {
                        timer.cancel();
                        self.jumpscare = None;
                        debug!("jump-scare cancelled, main door closed");
                    }
                    Some(Jumpscare::Silent) => self.jumpscare = None,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    pub fn step<R: Rng + ?Sized>(
        &mut self,
        delta_ms: u64,
        entities: &mut EntityRegistry,
        fx: &mut Services,
        rng: &mut R,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.active {
            return events;
        }

        if let SchedulerTick::Fire(door) = self.knock.step(delta_ms, entities, rng) {
            if let (Some(clip), Some(entity)) = (self.clips.knock.choose(rng), entities.get(door)) {
                fx.play_positional(Some(clip), entity.position());
                events.push(Event::KnockPlayed {
                    entity: door,
                    clip: clip.clone(),
                });
            }
        }

        if let Some(slam) = self.slam.as_mut() {
            if let SchedulerTick::Fire(door) = slam.step(delta_ms, entities, rng) {
                if let Some(entity) = entities.get_mut(door) {
                    if let Some(opened) = entity.force_open(fx) {
                        fx.play_positional(self.clips.slam.as_ref(), entity.position());
                        info!(door = entity.name(), "door slammed open");
                        events.push(opened);
                        events.push(Event::DoorSlammed { entity: door });
                    }
                }
            }
        }

        self.step_jumpscare(delta_ms, entities, fx, &mut events);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm_jumpscare<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let Some(clip) = self.clips.jumpscare.choose(rng).cloned() else {
            debug!("no jump-scare clips, main door left harmless");
            self.jumpscare = Some(Jumpscare::Silent);
            return;
        };
        let clip = Some(clip);
        debug!(?clip, delay_ms = self.timing.time_before_jumpscare_ms, "jump-scare armed");
        self.jumpscare = Some(Jumpscare::Countdown {
            clip,
            timer: CancellableTimer::start(self.timing.time_before_jumpscare_ms),
        });
    }

    fn step_jumpscare(
        &mut self,
        delta_ms: u64,
        entities: &EntityRegistry,
        fx: &mut Services,
        events: &mut Vec<Event>,
    ) {
        let main_door = self.main_door;
        let Some(phase) = self.jumpscare.take() else {
            return;
        };
        self.jumpscare = match phase {
            Jumpscare::Countdown { clip, mut timer } => {
                match timer.poll(delta_ms, || !entities.is_open(main_door)) {
                    TimerTick::Fire => {
                        fx.play_ambient(clip.as_ref());
                        fx.disable_inputs();
                        info!(?clip, "jump-scare played");
                        events.push(Event::JumpscarePlayed { clip });
                        let timer = CancellableTimer::start(self.timing.post_jumpscare_delay_ms);
                        // A zero aftermath completes within this tick.
                        Some(Self::step_aftermath(timer, 0, events))
                    }
                    TimerTick::Pending => Some(Jumpscare::Countdown { clip, timer }),
                    TimerTick::Abort | TimerTick::Idle => {
                        debug!("jump-scare cancelled, main door not open");
                        None
                    }
                }
            }
            Jumpscare::Aftermath { timer } => Some(Self::step_aftermath(timer, delta_ms, events)),
            Jumpscare::Done => Some(Jumpscare::Done),
            Jumpscare::Silent => Some(Jumpscare::Silent),
        };
    }

    fn step_aftermath(mut timer: CancellableTimer, delta_ms: u64, events: &mut Vec<Event>) -> Jumpscare {
        match timer.poll(delta_ms, || false) {
            TimerTick::Fire => {
                info!("jump-scare occurred");
                events.push(Event::JumpscareOccurred);
                Jumpscare::Done
            }
            _ => Jumpscare::Aftermath { timer },
        }
    }
}
