//! Game session controller.
//!
//! The session owns every gameplay component and is the only logical thread:
//! the host calls [`GameSession::step`] once per frame with the frame delta.
//! Each step advances the night clock and the door director, then drains the
//! event queue. Every event is first applied to the session's own reactions
//! (director bookkeeping, HUD text, win/lose) and then handed to the observers
//! in registration order. Events raised while draining join the same queue,
//! so they are delivered within the tick that caused them.
//!
//! ## State Transitions
//!
//! ```text
//! MainMenu -> Playing <-> Paused
//!             Playing -> GameOver
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = GameSession::new(&config, &SceneLayout::haunted_house(), services)?;
//! session.subscribe(|event| println!("{event:?}"));
//! session.start();
//! // In a loop:
//! session.step(frame_ms);
//! ```

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::{EntityId, EntityRegistry};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::inventory::{Inventory, ItemId};
use crate::objective::{assign_spawn_points, ObjectiveSet};
use crate::scheduler::DoorEventDirector;
use crate::services::{Position, Services};
use crate::storage::{Config, SceneLayout, UiConfig};
use crate::timer::{display_hour, CancellableTimer, NightClock, TimerTick};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    MainMenu,
    Playing,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost,
}

/// When collecting every objective counts as a win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinPolicy {
    /// Win the moment the last objective is collected. Reaching the end of
    /// the night first is a loss.
    #[default]
    ImmediateOnCompletion,
    /// Decide when the night ends: win if every objective was collected.
    AtNightEnd,
}

/// Summary of a session, suitable for printing or storing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub id: Uuid,
    pub seed: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: GameState,
    pub outcome: Option<Outcome>,
    pub simulated_ms: u64,
    pub events: usize,
    pub collected: usize,
    pub total: usize,
    /// Clock reading in 12-hour form.
    pub final_hour: u32,
}

type Observer = Box<dyn FnMut(&Event)>;

pub struct GameSession {
    id: Uuid,
    seed: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    state: GameState,

    entities: EntityRegistry,
    inventory: Inventory,
    objectives: ObjectiveSet,
    placements: Vec<(ItemId, Position)>,
    director: DoorEventDirector,
    clock: NightClock,

    policy: WinPolicy,
    win_delay_ms: u64,
    win_timer: Option<CancellableTimer>,
    outcome: Option<Outcome>,
    inputs_enabled: bool,
    /// Last clock reading shown, in 12-hour form.
    hour: u32,
    focus: Option<EntityId>,
    texts: UiConfig,

    fx: Services,
    rng: Mcg128Xsl64,
    queue: VecDeque<Event>,
    observers: Vec<Observer>,
    elapsed_ms: u64,
    delivered: usize,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("outcome", &self.outcome)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Build a session from validated settings. Nothing runs until [`start`](Self::start).
    pub fn new(config: &Config, layout: &SceneLayout, mut fx: Services) -> Result<Self> {
        config.validate()?;
        layout.validate()?;

        let entities = layout.build_registry();
        let main_door = entities
            .find(&layout.main_door)
            .ok_or_else(|| ValidationError::UnknownReference {
                kind: "door".into(),
                name: layout.main_door.clone(),
            })?;
        let knock_pool = layout.resolve(&entities, &layout.knock_doors)?;

        let seed = config.game.seed.unwrap_or_else(rand::random);
        let mut rng = Mcg128Xsl64::seed_from_u64(seed);
        let placements = assign_spawn_points(&layout.objective_items, &layout.spawn_points, &mut rng);

        fx.set_mix(config.volume_mix());
        let id = Uuid::new_v4();
        debug!(session = %id, seed, entities = entities.len(), "session created");

        Ok(Self {
            id,
            seed,
            started_at: None,
            finished_at: None,
            state: GameState::MainMenu,
            director: DoorEventDirector::new(main_door, knock_pool, layout.clips.clone(), config.door_timing()),
            entities,
            inventory: Inventory::new(),
            objectives: ObjectiveSet::new(layout.objective_items.iter().cloned()),
            placements,
            clock: config.night_clock(),
            policy: config.game.win_policy,
            win_delay_ms: config.win_transition_delay_ms(),
            win_timer: None,
            outcome: None,
            inputs_enabled: false,
            hour: display_hour(0),
            focus: None,
            texts: config.ui.clone(),
            fx,
            rng,
            queue: VecDeque::new(),
            observers: Vec::new(),
            elapsed_ms: 0,
            delivered: 0,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn entity_id(&self, name: &str) -> Option<EntityId> {
        self.entities.find(name)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn objectives(&self) -> &ObjectiveSet {
        &self.objectives
    }

    /// Where each objective item was placed at construction.
    pub fn placements(&self) -> &[(ItemId, Position)] {
        &self.placements
    }

    pub fn clock(&self) -> &NightClock {
        &self.clock
    }

    pub fn director(&self) -> &DoorEventDirector {
        &self.director
    }

    pub fn inputs_enabled(&self) -> bool {
        self.inputs_enabled
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn report(&self) -> SessionReport {
        let (collected, total) = self.objectives.progress();
        SessionReport {
            id: self.id,
            seed: self.seed,
            started_at: self.started_at,
            finished_at: self.finished_at,
            state: self.state,
            outcome: self.outcome,
            simulated_ms: self.elapsed_ms,
            events: self.delivered,
            collected,
            total,
            final_hour: self.hour,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Register an observer. Observers see every event after the session's
    /// own reactions, in registration order.
    pub fn subscribe(&mut self, observer: impl FnMut(&Event) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Leave the main menu and start the night.
    pub fn start(&mut self) -> bool {
        if self.state != GameState::MainMenu {
            return false;
        }
        info!(session = %self.id, seed = self.seed, "night started");
        self.started_at = Some(Utc::now());
        self.set_state(GameState::Playing);

        self.clock.start();
        self.director.start(&self.entities, &mut self.rng);
        self.set_inputs(true);

        self.fx.set_clock_text(&ui::clock_text(self.hour));
        let (collected, total) = self.objectives.progress();
        self.fx.set_objective_text(&ui::progress_text(collected, total));

        self.dispatch();
        true
    }

    /// Advance the session by one frame.
    pub fn step(&mut self, delta_ms: u64) {
        if self.state != GameState::Playing {
            return;
        }
        self.elapsed_ms += delta_ms;

        let clock_events = self.clock.step(delta_ms);
        self.queue.extend(clock_events);
        let door_events = self
            .director
            .step(delta_ms, &mut self.entities, &mut self.fx, &mut self.rng);
        self.queue.extend(door_events);

        if let Some(timer) = self.win_timer.as_mut() {
            if timer.poll(delta_ms, || false) == TimerTick::Fire {
                self.win_timer = None;
                self.finish(Outcome::Won);
            }
        }

        self.dispatch();
    }

    /// Point the player at an entity (or at nothing) and refresh the prompt.
    pub fn look_at(&mut self, target: Option<EntityId>) {
        self.focus = target;
        self.refresh_prompt();
    }

    /// Player interaction with a door or cabinet. Ignored while inputs are off.
    pub fn interact(&mut self, entity: EntityId) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(target) = self.entities.get_mut(entity) else {
            return false;
        };
        let events = target.interact(&mut self.inventory, &mut self.fx);
        self.queue.extend(events);
        self.dispatch();
        true
    }

    /// Put an item (usually a key) in the inventory.
    pub fn pick_up(&mut self, item: ItemId) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let picked = self.inventory.add_item(item);
        let accepted = picked.is_some();
        self.queue.extend(picked);
        self.dispatch();
        accepted
    }

    pub fn drop_item(&mut self, item: &ItemId) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let dropped = self.inventory.drop_item(item);
        let accepted = dropped.is_some();
        self.queue.extend(dropped);
        self.dispatch();
        accepted
    }

    /// Collect an objective item.
    pub fn collect(&mut self, item: &ItemId) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let events = self.objectives.collect(item);
        let accepted = !events.is_empty();
        self.queue.extend(events);
        self.dispatch();
        accepted
    }

    pub fn pause(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        self.set_state(GameState::Paused);
        self.dispatch();
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused {
            return false;
        }
        self.set_state(GameState::Playing);
        self.dispatch();
        true
    }

    /// Tear down without an outcome. Every pending timer is dropped.
    pub fn stop(&mut self) {
        self.director.stop();
        self.clock.stop();
        self.win_timer = None;
        if self.state != GameState::GameOver {
            self.set_inputs(false);
            self.set_state(GameState::GameOver);
            self.finished_at = Some(Utc::now());
            self.dispatch();
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn accepts_input(&self) -> bool {
        self.state == GameState::Playing && self.inputs_enabled && self.outcome.is_none()
    }

    fn set_state(&mut self, state: GameState) {
        debug!(from = ?self.state, to = ?state, "game state changed");
        self.state = state;
        self.queue.push_back(Event::GameStateChanged { state });
    }

    fn set_inputs(&mut self, enabled: bool) {
        self.inputs_enabled = enabled;
        if enabled {
            self.fx.enable_inputs();
        } else {
            self.fx.disable_inputs();
        }
    }

    fn refresh_prompt(&mut self) {
        let prompt = self
            .focus
            .and_then(|id| self.entities.get(id))
            .map(|entity| entity.prompt())
            .unwrap_or("");
        self.fx.set_prompt_text(prompt);
    }

    fn dispatch(&mut self) {
        while let Some(event) = self.queue.pop_front() {
            self.react(&event);
            for observer in &mut self.observers {
                observer(&event);
            }
            self.delivered += 1;
        }
    }

    fn react(&mut self, event: &Event) {
        match event {
            Event::EntityOpened { entity, .. } | Event::EntityClosed { entity } => {
                self.director.observe(event, &mut self.rng);
                if self.focus == Some(*entity) {
                    self.refresh_prompt();
                }
            }
            Event::JumpscarePlayed { .. } => {
                // The director already cut the inputs.
                self.inputs_enabled = false;
            }
            Event::TimeChanged { hour } => {
                self.hour = *hour;
                self.fx.set_clock_text(&ui::clock_text(*hour));
            }
            Event::ObjectiveProgress { collected, total } => {
                self.fx.set_objective_text(&ui::progress_text(*collected, *total));
            }
            Event::ObjectiveCompleted => {
                if self.policy == WinPolicy::ImmediateOnCompletion {
                    self.decide(Outcome::Won);
                }
            }
            Event::NightFinished => {
                let outcome = match self.policy {
                    WinPolicy::AtNightEnd if self.objectives.is_completed() => Outcome::Won,
                    _ => Outcome::Lost,
                };
                self.decide(outcome);
            }
            Event::JumpscareOccurred => self.decide(Outcome::Lost),
            _ => {}
        }
    }

    /// Settle the outcome. Only the first call has any effect.
    fn decide(&mut self, outcome: Outcome) {
        if self.outcome.is_some() {
            debug!(?outcome, "outcome already decided");
            return;
        }
        info!(session = %self.id, ?outcome, elapsed_ms = self.elapsed_ms, "outcome decided");
        self.outcome = Some(outcome);
        self.director.stop();
        self.clock.stop();

        match outcome {
            Outcome::Won => {
                self.fx.set_outcome_text(&self.texts.win_text);
                self.set_inputs(false);
                self.queue.push_back(Event::GameWon);
                if self.win_delay_ms == 0 {
                    self.finish(Outcome::Won);
                } else {
                    self.win_timer = Some(CancellableTimer::start(self.win_delay_ms));
                }
            }
            Outcome::Lost => {
                self.fx.set_outcome_text(&self.texts.lose_text);
                self.queue.push_back(Event::GameLost);
                self.finish(Outcome::Lost);
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.set_inputs(false);
        self.finished_at = Some(Utc::now());
        self.set_state(GameState::GameOver);
        self.queue.push_back(Event::GameOver { outcome });
        info!(session = %self.id, ?outcome, "game over");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recording::{Recorder, SinkCall};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.game.seed = Some(17);
        config.clock.seconds_per_hour = 10.0;
        config
    }

    fn session_with(config: &Config) -> (GameSession, Recorder, Rc<RefCell<Vec<Event>>>) {
        let recorder = Recorder::new();
        let mut session = GameSession::new(config, &SceneLayout::haunted_house(), recorder.services()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        (session, recorder, seen)
    }

    fn collect_all(session: &mut GameSession) {
        for item in ["old_photo", "music_box", "diary"] {
            assert!(session.collect(&ItemId::new(item)));
        }
    }

    #[test]
    fn start_renders_initial_hud() {
        let (mut session, recorder, seen) = session_with(&quick_config());
        assert!(session.start());
        assert!(!session.start());
        assert_eq!(session.state(), GameState::Playing);
        assert!(session.inputs_enabled());

        let calls = recorder.calls();
        assert!(calls.contains(&SinkCall::Clock("12:00 AM".into())));
        assert!(calls.contains(&SinkCall::Objective("Collected Items 0 / 3".into())));
        assert_eq!(
            seen.borrow().as_slice(),
            &[Event::GameStateChanged {
                state: GameState::Playing
            }]
        );
    }

    #[test]
    fn step_is_inert_before_start_and_while_paused() {
        let (mut session, _, seen) = session_with(&quick_config());
        session.step(60_000);
        assert!(seen.borrow().is_empty());

        session.start();
        session.pause();
        let before = seen.borrow().len();
        session.step(60_000);
        assert_eq!(seen.borrow().len(), before);
        assert_eq!(session.elapsed_ms(), 0);
        assert!(!session.interact(EntityId(1)));

        assert!(session.resume());
        assert_eq!(session.state(), GameState::Playing);
    }

    #[test]
    fn collecting_everything_wins_after_transition() {
        let (mut session, recorder, seen) = session_with(&quick_config());
        session.start();
        collect_all(&mut session);

        assert_eq!(session.outcome(), Some(Outcome::Won));
        assert_eq!(session.state(), GameState::Playing, "win transition still running");
        assert!(!session.inputs_enabled());
        assert!(seen.borrow().contains(&Event::GameWon));
        assert!(recorder.calls().contains(&SinkCall::Outcome("You survived the night".into())));

        session.step(2_999);
        assert_eq!(session.state(), GameState::Playing);
        session.step(1);
        assert_eq!(session.state(), GameState::GameOver);
        assert_eq!(
            seen.borrow().last(),
            Some(&Event::GameOver {
                outcome: Outcome::Won
            })
        );
    }

    #[test]
    fn night_end_before_completion_loses() {
        let mut config = quick_config();
        config.doors.time_before_jumpscare = 1_000.0;
        let (mut session, _, seen) = session_with(&config);
        session.start();
        session.collect(&ItemId::new("diary"));
        // Six hours of ten seconds.
        for _ in 0..61 {
            session.step(1_000);
        }
        assert_eq!(session.outcome(), Some(Outcome::Lost));
        assert_eq!(session.state(), GameState::GameOver);

        let seen = seen.borrow();
        let hours: Vec<u32> = seen
            .iter()
            .filter_map(|e| match e {
                Event::TimeChanged { hour } => Some(*hour),
                _ => None,
            })
            .collect();
        assert_eq!(hours, vec![1, 2, 3, 4, 5, 6]);
        let tail: Vec<&Event> = seen.iter().skip_while(|e| **e != Event::NightFinished).collect();
        assert_eq!(
            tail,
            vec![
                &Event::NightFinished,
                &Event::GameLost,
                &Event::GameStateChanged {
                    state: GameState::GameOver
                },
                &Event::GameOver {
                    outcome: Outcome::Lost
                },
            ]
        );
    }

    #[test]
    fn at_night_end_policy_waits_for_the_clock() {
        let mut config = quick_config();
        config.game.win_policy = WinPolicy::AtNightEnd;
        config.game.win_transition_delay_secs = 0.0;
        config.doors.time_before_jumpscare = 1_000.0;
        let (mut session, _, seen) = session_with(&config);
        session.start();
        collect_all(&mut session);
        assert_eq!(session.outcome(), None);
        assert!(seen.borrow().contains(&Event::ObjectiveCompleted));

        for _ in 0..60 {
            session.step(1_000);
        }
        assert_eq!(session.outcome(), Some(Outcome::Won));
        assert_eq!(session.state(), GameState::GameOver);
    }

    #[test]
    fn opening_the_front_door_ends_in_jumpscare() {
        let (mut session, recorder, seen) = session_with(&quick_config());
        session.start();
        let front = session.entity_id("front_door").unwrap();
        assert!(session.interact(front));
        assert!(session.director().jumpscare_pending());

        session.step(2_000);
        assert!(!session.inputs_enabled());
        assert!(!session.interact(front), "inputs are off after the scare");
        session.step(1_000);

        assert_eq!(session.outcome(), Some(Outcome::Lost));
        assert!(seen.borrow().contains(&Event::JumpscareOccurred));
        assert!(recorder.calls().contains(&SinkCall::Outcome("You did not make it".into())));
    }

    #[test]
    fn outcome_is_decided_once() {
        let (mut session, _, seen) = session_with(&quick_config());
        session.start();
        let front = session.entity_id("front_door").unwrap();
        session.interact(front);
        collect_all(&mut session);
        assert_eq!(session.outcome(), Some(Outcome::Won));

        // The director was stopped with the win, so the scare never lands.
        session.step(10_000);
        let seen = seen.borrow();
        assert!(!seen.contains(&Event::JumpscareOccurred));
        assert!(!seen.contains(&Event::GameLost));
        assert_eq!(seen.iter().filter(|e| matches!(e, Event::GameOver { .. })).count(), 1);
    }

    #[test]
    fn locked_door_needs_its_key() {
        let (mut session, _, seen) = session_with(&quick_config());
        session.start();
        let bedroom = session.entity_id("bedroom_door").unwrap();

        session.interact(bedroom);
        assert!(seen.borrow().contains(&Event::InteractionDenied { entity: bedroom }));

        assert!(session.pick_up(ItemId::new("bedroom_key")));
        session.interact(bedroom);
        assert!(session.entities().is_open(bedroom));
        assert_eq!(session.inventory().items().count(), 0, "key consumed");
    }

    #[test]
    fn prompt_follows_focused_entity() {
        let (mut session, recorder, _) = session_with(&quick_config());
        session.start();
        let hall = session.entity_id("hall_door").unwrap();
        session.look_at(Some(hall));
        session.interact(hall);
        session.look_at(None);

        let prompts: Vec<SinkCall> = recorder
            .calls()
            .into_iter()
            .filter(|c| matches!(c, SinkCall::Prompt(_)))
            .collect();
        assert_eq!(
            prompts,
            vec![
                SinkCall::Prompt("Open Door".into()),
                SinkCall::Prompt("Close Door".into()),
                SinkCall::Prompt(String::new()),
            ]
        );
    }

    #[test]
    fn observers_run_in_registration_order() {
        let (mut session, _, _) = session_with(&quick_config());
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = Rc::clone(&order);
            session.subscribe(move |_| order.borrow_mut().push(tag));
        }
        session.start();
        assert_eq!(order.borrow().as_slice(), &["first", "second"]);
    }

    #[test]
    fn stop_drops_everything() {
        let (mut session, _, seen) = session_with(&quick_config());
        session.start();
        let front = session.entity_id("front_door").unwrap();
        session.interact(front);
        session.stop();
        session.step(60_000);
        assert_eq!(session.state(), GameState::GameOver);
        assert_eq!(session.outcome(), None);
        assert!(!seen.borrow().contains(&Event::JumpscareOccurred));
    }

    #[test]
    fn report_reflects_session() {
        let (mut session, _, _) = session_with(&quick_config());
        session.start();
        session.collect(&ItemId::new("diary"));
        session.step(10_000);
        let report = session.report();
        assert_eq!(report.seed, 17);
        assert_eq!(report.simulated_ms, 10_000);
        assert_eq!((report.collected, report.total), (1, 3));
        assert_eq!(report.final_hour, 1);
        assert!(report.started_at.is_some());
        assert_eq!(report.outcome, None);
    }

    #[test]
    fn seeded_sessions_place_items_identically() {
        let config = quick_config();
        let (a, _, _) = session_with(&config);
        let (b, _, _) = session_with(&config);
        assert_eq!(a.placements(), b.placements());
        assert_eq!(a.placements().len(), 3);
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut config = quick_config();
        config.clock.hours_per_night = 0;
        assert!(GameSession::new(&config, &SceneLayout::haunted_house(), Services::headless()).is_err());

        let mut layout = SceneLayout::haunted_house();
        layout.main_door = "chimney".into();
        assert!(GameSession::new(&quick_config(), &layout, Services::headless()).is_err());
    }
}
