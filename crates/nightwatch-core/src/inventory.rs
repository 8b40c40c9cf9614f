//! Player inventory: a handful of fixed slots holding item ids.
//!
//! Doors only care whether the player holds a key, so they talk to the
//! inventory through the narrow [`KeyRing`] trait.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Number of slots in the player inventory.
pub const INVENTORY_SLOTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Anything that can hold and give up keys.
pub trait KeyRing {
    fn has_item(&self, item: &ItemId) -> bool;

    /// Remove one instance of `item`. Returns false if it was not held.
    fn consume_item(&mut self, item: &ItemId) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemId>>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(INVENTORY_SLOTS)
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(slots: usize) -> Self {
        Self {
            slots: vec![None; slots],
        }
    }

    /// Put `item` in the first empty slot. Does nothing when full.
    pub fn add_item(&mut self, item: ItemId) -> Option<Event> {
        let slot = self.slots.iter_mut().find(|s| s.is_none())?;
        *slot = Some(item.clone());
        Some(Event::ItemPicked { item })
    }

    pub fn use_item(&mut self, item: &ItemId) -> Option<Event> {
        self.take(item).then(|| Event::ItemUsed { item: item.clone() })
    }

    pub fn drop_item(&mut self, item: &ItemId) -> Option<Event> {
        self.take(item).then(|| Event::ItemDropped { item: item.clone() })
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemId> {
        self.slots.iter().flatten()
    }

    fn take(&mut self, item: &ItemId) -> bool {
        match self.slots.iter_mut().find(|s| s.as_ref() == Some(item)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }
}

impl KeyRing for Inventory {
    fn has_item(&self, item: &ItemId) -> bool {
        self.items().any(|held| held == item)
    }

    fn consume_item(&mut self, item: &ItemId) -> bool {
        self.take(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_fills_first_empty_slot() {
        let mut inv = Inventory::new();
        assert!(inv.add_item("key".into()).is_some());
        assert!(inv.add_item("candle".into()).is_some());
        assert!(inv.add_item("note".into()).is_some());
        assert!(inv.is_full());
        assert!(inv.add_item("extra".into()).is_none());
        assert!(!inv.has_item(&"extra".into()));
    }

    #[test]
    fn use_and_drop_free_the_slot() {
        let mut inv = Inventory::new();
        inv.add_item("key".into());
        inv.add_item("candle".into());

        assert_eq!(
            inv.use_item(&"key".into()),
            Some(Event::ItemUsed { item: "key".into() })
        );
        assert!(inv.use_item(&"key".into()).is_none());
        assert_eq!(
            inv.drop_item(&"candle".into()),
            Some(Event::ItemDropped {
                item: "candle".into()
            })
        );
        assert_eq!(inv.items().count(), 0);
    }

    #[test]
    fn consume_removes_exactly_one() {
        let mut inv = Inventory::new();
        inv.add_item("key".into());
        inv.add_item("key".into());
        assert!(inv.consume_item(&"key".into()));
        assert!(inv.has_item(&"key".into()));
        assert!(inv.consume_item(&"key".into()));
        assert!(!inv.consume_item(&"key".into()));
    }
}
