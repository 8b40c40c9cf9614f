//! Scene layouts: which doors and cabinets exist, which of them the door
//! events use, where objective items can spawn and which clips play.
//!
//! Layouts are plain TOML. Names are the only cross-references; they are
//! resolved to [`EntityId`]s when the session builds its registry.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityKind, EntityRegistry, EntitySounds, ToggleEntity};
use crate::error::{Result, SceneError, ValidationError};
use crate::inventory::ItemId;
use crate::scheduler::DoorClips;
use crate::services::{ClipId, Position};

/// One toggle entity in a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_key: Option<ItemId>,
    #[serde(default)]
    pub sounds: EntitySounds,
}

impl EntitySpec {
    pub fn build(&self) -> ToggleEntity {
        let entity = ToggleEntity::new(self.kind, self.name.clone())
            .at(self.position)
            .with_sounds(self.sounds.clone());
        match &self.required_key {
            Some(key) => entity.locked_with(key.clone()),
            None => entity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLayout {
    /// Door whose opening arms the jump-scare and which slams open.
    pub main_door: String,
    /// Doors eligible for knocks.
    #[serde(default)]
    pub knock_doors: Vec<String>,
    /// Items that can unlock entities without being objectives.
    #[serde(default)]
    pub key_items: Vec<ItemId>,
    pub objective_items: Vec<ItemId>,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    #[serde(default)]
    pub spawn_points: Vec<Position>,
    #[serde(default)]
    pub clips: DoorClips,
}

impl SceneLayout {
    /// Read and validate a layout file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SceneError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let layout = Self::from_toml(&content)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_toml(content: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, SceneError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every name reference and the basic shape of the scene.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut names = HashSet::new();
        for spec in &self.entities {
            if !names.insert(spec.name.as_str()) {
                return Err(ValidationError::DuplicateName(spec.name.clone()));
            }
        }

        self.door(&self.main_door)?;
        for name in &self.knock_doors {
            self.door(name)?;
        }

        for spec in &self.entities {
            if let Some(key) = &spec.required_key {
                if !self.key_items.contains(key) && !self.objective_items.contains(key) {
                    return Err(ValidationError::UnknownReference {
                        kind: "key".into(),
                        name: key.to_string(),
                    });
                }
            }
        }

        if self.objective_items.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "objective_items".into(),
                message: "at least one objective item is required".into(),
            });
        }
        Ok(())
    }

    /// Build the entity registry. Ids follow declaration order.
    pub fn build_registry(&self) -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        for spec in &self.entities {
            registry.insert(spec.build());
        }
        registry
    }

    /// Resolve door names against a registry built from this layout.
    pub fn resolve(&self, registry: &EntityRegistry, names: &[String]) -> Result<Vec<EntityId>, ValidationError> {
        names
            .iter()
            .map(|name| {
                registry.find(name).ok_or_else(|| ValidationError::UnknownReference {
                    kind: "entity".into(),
                    name: name.clone(),
                })
            })
            .collect()
    }

    fn door(&self, name: &str) -> Result<&EntitySpec, ValidationError> {
        self.entities
            .iter()
            .find(|spec| spec.name == name && spec.kind == EntityKind::Door)
            .ok_or_else(|| ValidationError::UnknownReference {
                kind: "door".into(),
                name: name.to_string(),
            })
    }

    /// Built-in demo scene: a small house with a locked bedroom.
    pub fn haunted_house() -> Self {
        let door = |name: &str, x: f32, z: f32| EntitySpec {
            name: name.into(),
            kind: EntityKind::Door,
            position: Position::new(x, 0.0, z),
            required_key: None,
            sounds: EntitySounds {
                open: Some(ClipId::new("door_open")),
                close: Some(ClipId::new("door_close")),
                locked: Some(ClipId::new("door_locked")),
                unlock: Some(ClipId::new("door_unlock")),
            },
        };
        let cabinet = |name: &str, x: f32, z: f32| EntitySpec {
            name: name.into(),
            kind: EntityKind::Cabinet,
            position: Position::new(x, 0.0, z),
            required_key: None,
            sounds: EntitySounds {
                open: Some(ClipId::new("cabinet_open")),
                close: Some(ClipId::new("cabinet_close")),
                ..Default::default()
            },
        };

        let mut bedroom = door("bedroom_door", 6.0, 4.0);
        bedroom.required_key = Some(ItemId::new("bedroom_key"));

        Self {
            main_door: "front_door".into(),
            knock_doors: vec!["hall_door".into(), "bedroom_door".into(), "attic_door".into()],
            key_items: vec![ItemId::new("bedroom_key")],
            objective_items: vec![
                ItemId::new("old_photo"),
                ItemId::new("music_box"),
                ItemId::new("diary"),
            ],
            entities: vec![
                door("front_door", 0.0, 0.0),
                door("hall_door", 3.0, 2.0),
                bedroom,
                door("attic_door", 2.0, 8.0),
                cabinet("kitchen_cabinet", -3.0, 1.5),
                cabinet("wardrobe", 7.5, 5.0),
            ],
            spawn_points: vec![
                Position::new(-3.0, 1.0, 1.5),
                Position::new(7.5, 1.0, 5.0),
                Position::new(4.0, 0.5, 6.0),
                Position::new(2.0, 3.0, 9.0),
                Position::new(-1.0, 0.5, 4.0),
            ],
            clips: DoorClips {
                knock: vec![
                    ClipId::new("knock_soft"),
                    ClipId::new("knock_hard"),
                    ClipId::new("knock_double"),
                ],
                jumpscare: vec![ClipId::new("scream"), ClipId::new("growl")],
                slam: Some(ClipId::new("door_slam")),
            },
        }
    }
}
