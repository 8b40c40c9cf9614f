mod registry;
mod toggle;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use registry::EntityRegistry;
pub use toggle::{EntityKind, EntitySounds, ToggleEntity, ToggleState, OPEN_PARAM, SLAM_OPEN_PARAM};

/// Non-owning handle to an entity in an [`EntityRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub usize);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
