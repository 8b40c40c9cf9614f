use serde::{Deserialize, Serialize};

use super::{EntityId, ToggleEntity, ToggleState};

/// Owns every toggle entity in the scene. Schedulers hold [`EntityId`]s and
/// poll state through here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRegistry {
    entities: Vec<ToggleEntity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut entity: ToggleEntity) -> EntityId {
        let id = EntityId(self.entities.len());
        entity.assign_id(id);
        self.entities.push(entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&ToggleEntity> {
        self.entities.get(id.0)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut ToggleEntity> {
        self.entities.get_mut(id.0)
    }

    pub fn state(&self, id: EntityId) -> Option<ToggleState> {
        self.get(id).map(ToggleEntity::state)
    }

    /// Unknown ids count as not open.
    pub fn is_open(&self, id: EntityId) -> bool {
        self.state(id) == Some(ToggleState::Opened)
    }

    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.entities.iter().find(|e| e.name() == name).map(ToggleEntity::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToggleEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
