//! Two-state interactable entities (doors, cabinets).
//!
//! ## State Transitions
//!
//! ```text
//! Closed --interact (unlocked, or key held)--> Opened
//! Closed --force_open (lock bypassed)--------> Opened
//! Opened --interact--------------------------> Closed
//! ```
//!
//! A locked entity whose key is absent stays `Closed` and reports
//! `InteractionDenied`. The key is consumed on the first successful unlock and
//! the requirement is gone for good afterwards.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EntityId;
use crate::events::Event;
use crate::inventory::{ItemId, KeyRing};
use crate::services::{ClipId, Position, Services};

/// Animator parameter driven on every open/close.
pub const OPEN_PARAM: &str = "Open";
/// Animator parameter driven by a scripted slam.
pub const SLAM_OPEN_PARAM: &str = "Slam Open Door";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Opened,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Door,
    Cabinet,
}

impl EntityKind {
    /// Prompt shown while the entity is closed.
    pub fn open_prompt(self) -> &'static str {
        match self {
            EntityKind::Door => "Open Door",
            EntityKind::Cabinet => "Open Cabinet",
        }
    }

    /// Prompt shown while the entity is opened.
    pub fn close_prompt(self) -> &'static str {
        match self {
            EntityKind::Door => "Close Door",
            EntityKind::Cabinet => "Close Cabinet",
        }
    }
}

/// Optional clips played by an entity's own transitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySounds {
    #[serde(default)]
    pub open: Option<ClipId>,
    #[serde(default)]
    pub close: Option<ClipId>,
    #[serde(default)]
    pub locked: Option<ClipId>,
    #[serde(default)]
    pub unlock: Option<ClipId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleEntity {
    id: EntityId,
    kind: EntityKind,
    name: String,
    position: Position,
    state: ToggleState,
    /// Key that must be consumed to open. Cleared on the first unlock.
    required_key: Option<ItemId>,
    sounds: EntitySounds,
}

impl ToggleEntity {
    /// A closed, unlocked entity. The id is assigned by the registry on insert.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: EntityId(0),
            kind,
            name: name.into(),
            position: Position::default(),
            state: ToggleState::Closed,
            required_key: None,
            sounds: EntitySounds::default(),
        }
    }

    pub fn door(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Door, name)
    }

    pub fn cabinet(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Cabinet, name)
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn locked_with(mut self, key: ItemId) -> Self {
        self.required_key = Some(key);
        self
    }

    pub fn with_sounds(mut self, sounds: EntitySounds) -> Self {
        self.sounds = sounds;
        self
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ToggleState::Opened
    }

    /// Only ever true while closed. A slammed-open locked door reports
    /// unlocked until it is closed again.
    pub fn is_locked(&self) -> bool {
        self.state == ToggleState::Closed && self.required_key.is_some()
    }

    pub fn required_key(&self) -> Option<&ItemId> {
        self.required_key.as_ref()
    }

    pub fn prompt(&self) -> &'static str {
        match self.state {
            ToggleState::Closed => self.kind.open_prompt(),
            ToggleState::Opened => self.kind.close_prompt(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Player interaction. Opens, closes, unlocks or is denied.
    pub fn interact(&mut self, keys: &mut dyn KeyRing, fx: &mut Services) -> Vec<Event> {
        match self.state {
            ToggleState::Opened => vec![self.close(fx)],
            ToggleState::Closed => match self.required_key.take() {
                None => vec![self.open(fx, false)],
                Some(key) if keys.consume_item(&key) => {
                    debug!(entity = %self.name, %key, "unlocked");
                    fx.play_positional(self.sounds.unlock.as_ref(), self.position);
                    let unlocked = Event::EntityUnlocked {
                        entity: self.id,
                        key,
                    };
                    vec![unlocked, self.open(fx, false)]
                }
                Some(key) => {
                    self.required_key = Some(key);
                    fx.play_positional(self.sounds.locked.as_ref(), self.position);
                    vec![Event::InteractionDenied { entity: self.id }]
                }
            },
        }
    }

    /// Open regardless of the lock. Does nothing if already opened.
    pub fn force_open(&mut self, fx: &mut Services) -> Option<Event> {
        if self.is_open() {
            return None;
        }
        fx.set_bool_parameter(self.id, SLAM_OPEN_PARAM, true);
        self.state = ToggleState::Opened;
        Some(Event::EntityOpened {
            entity: self.id,
            forced: true,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn open(&mut self, fx: &mut Services, forced: bool) -> Event {
        fx.set_bool_parameter(self.id, OPEN_PARAM, true);
        fx.play_positional(self.sounds.open.as_ref(), self.position);
        self.state = ToggleState::Opened;
        Event::EntityOpened {
            entity: self.id,
            forced,
        }
    }

    fn close(&mut self, fx: &mut Services) -> Event {
        fx.set_bool_parameter(self.id, OPEN_PARAM, false);
        fx.set_bool_parameter(self.id, SLAM_OPEN_PARAM, false);
        fx.play_positional(self.sounds.close.as_ref(), self.position);
        self.state = ToggleState::Closed;
        Event::EntityClosed { entity: self.id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Inventory;
    use crate::services::recording::{Recorder, SinkCall};
    use proptest::prelude::*;

    fn key() -> ItemId {
        ItemId::new("rusty_key")
    }

    #[test]
    fn unlocked_door_toggles() {
        let mut door = ToggleEntity::door("hall");
        let mut inv = Inventory::new();
        let mut fx = Services::headless();

        assert_eq!(door.prompt(), "Open Door");
        let events = door.interact(&mut inv, &mut fx);
        assert_eq!(
            events,
            vec![Event::EntityOpened {
                entity: EntityId(0),
                forced: false
            }]
        );
        assert_eq!(door.state(), ToggleState::Opened);
        assert_eq!(door.prompt(), "Close Door");

        let events = door.interact(&mut inv, &mut fx);
        assert_eq!(events, vec![Event::EntityClosed { entity: EntityId(0) }]);
        assert_eq!(door.state(), ToggleState::Closed);
    }

    #[test]
    fn locked_without_key_is_denied() {
        let recorder = Recorder::new();
        let mut fx = recorder.services();
        let mut door = ToggleEntity::door("cellar")
            .locked_with(key())
            .with_sounds(EntitySounds {
                locked: Some(ClipId::new("rattle")),
                ..Default::default()
            });
        let mut inv = Inventory::new();

        let events = door.interact(&mut inv, &mut fx);
        assert_eq!(events, vec![Event::InteractionDenied { entity: EntityId(0) }]);
        assert!(door.is_locked());
        assert_eq!(door.state(), ToggleState::Closed);
        assert_eq!(
            recorder.count(|c| matches!(c, SinkCall::PlayPositional { clip, .. } if clip.as_str() == "rattle")),
            1
        );
    }

    #[test]
    fn unlock_consumes_key_once() {
        let mut door = ToggleEntity::door("cellar").locked_with(key());
        let mut inv = Inventory::new();
        inv.add_item(key());
        inv.add_item(key());
        let mut fx = Services::headless();

        let events = door.interact(&mut inv, &mut fx);
        assert!(matches!(events[0], Event::EntityUnlocked { .. }));
        assert!(matches!(events[1], Event::EntityOpened { forced: false, .. }));
        assert!(!door.is_locked());
        assert!(door.required_key().is_none());
        // Only one of the two keys was used.
        assert!(inv.has_item(&key()));

        door.interact(&mut inv, &mut fx);
        door.interact(&mut inv, &mut fx);
        assert!(door.is_open());
        assert!(inv.has_item(&key()));
    }

    #[test]
    fn cabinet_uses_cabinet_prompts() {
        let mut cabinet = ToggleEntity::cabinet("kitchen");
        assert_eq!(cabinet.prompt(), "Open Cabinet");
        cabinet.interact(&mut Inventory::new(), &mut Services::headless());
        assert_eq!(cabinet.prompt(), "Close Cabinet");
    }

    #[test]
    fn force_open_bypasses_lock_and_is_idempotent() {
        let recorder = Recorder::new();
        let mut fx = recorder.services();
        let mut door = ToggleEntity::door("front").locked_with(key());

        let first = door.force_open(&mut fx);
        assert_eq!(
            first,
            Some(Event::EntityOpened {
                entity: EntityId(0),
                forced: true
            })
        );
        assert!(!door.is_locked());
        assert!(door.force_open(&mut fx).is_none());
        assert_eq!(
            recorder.count(|c| matches!(c, SinkCall::SetBool { name, value: true, .. } if name == SLAM_OPEN_PARAM)),
            1
        );

        // Closing re-engages the untouched lock.
        door.interact(&mut Inventory::new(), &mut fx);
        assert!(door.is_locked());
    }

    proptest! {
        #[test]
        fn interact_alternates_unless_denied(locked in any::<bool>(), holds_key in any::<bool>(), n in 0usize..40) {
            let mut door = ToggleEntity::door("d");
            if locked {
                door = door.locked_with(key());
            }
            let mut inv = Inventory::new();
            if holds_key {
                inv.add_item(key());
            }
            let mut fx = Services::headless();
            let denied = locked && !holds_key;

            let mut expected = ToggleState::Closed;
            for _ in 0..n {
                door.interact(&mut inv, &mut fx);
                if !denied {
                    expected = match expected {
                        ToggleState::Closed => ToggleState::Opened,
                        ToggleState::Opened => ToggleState::Closed,
                    };
                }
                prop_assert_eq!(door.state(), expected);
                prop_assert!(!(door.is_locked() && door.is_open()));
            }
        }
    }
}
