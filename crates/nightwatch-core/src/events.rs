use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::inventory::ItemId;
use crate::services::ClipId;
use crate::session::{GameState, Outcome};

/// Every state change in the core produces an Event.
/// Events raised during a tick are delivered within that same tick,
/// to observers in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A toggle entity went from closed to opened.
    /// `forced` is set when the lock was bypassed by a scripted slam.
    EntityOpened {
        entity: EntityId,
        forced: bool,
    },
    EntityClosed {
        entity: EntityId,
    },
    /// The required key was consumed and the lock removed for good.
    EntityUnlocked {
        entity: EntityId,
        key: ItemId,
    },
    /// Interaction with a locked entity while the key is absent.
    InteractionDenied {
        entity: EntityId,
    },
    KnockPlayed {
        entity: EntityId,
        clip: ClipId,
    },
    DoorSlammed {
        entity: EntityId,
    },
    /// The scare itself (sound + input lock). Precedes `JumpscareOccurred`.
    JumpscarePlayed {
        clip: Option<ClipId>,
    },
    /// Terminal: the jump-scare sequence ran to completion.
    JumpscareOccurred,
    /// In-game hour changed. `hour` is already in 12-hour display form.
    TimeChanged {
        hour: u32,
    },
    /// Terminal: the last hour passed and the trailing delay elapsed.
    NightFinished,
    ObjectiveProgress {
        collected: usize,
        total: usize,
    },
    /// Terminal: every required objective item has been collected.
    ObjectiveCompleted,
    ItemPicked {
        item: ItemId,
    },
    ItemUsed {
        item: ItemId,
    },
    ItemDropped {
        item: ItemId,
    },
    GameStateChanged {
        state: GameState,
    },
    GameWon,
    GameLost,
    /// The session is over; nothing steps after this.
    GameOver {
        outcome: Outcome,
    },
}
