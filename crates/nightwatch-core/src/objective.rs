//! Objective collection tracking.
//!
//! Items move one way only, from `required` to `collected`. The two sets
//! stay disjoint and their union never changes after construction, so the
//! set is complete exactly when `required` is empty.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::Event;
use crate::inventory::ItemId;
use crate::services::Position;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectiveSet {
    required: BTreeSet<ItemId>,
    collected: BTreeSet<ItemId>,
    completion_emitted: bool,
}

impl ObjectiveSet {
    pub fn new(required: impl IntoIterator<Item = ItemId>) -> Self {
        Self::with_collected(required, std::iter::empty())
    }

    /// Start with some items already collected. An item listed in both is
    /// treated as collected.
    pub fn with_collected(
        required: impl IntoIterator<Item = ItemId>,
        collected: impl IntoIterator<Item = ItemId>,
    ) -> Self {
        let collected: BTreeSet<ItemId> = collected.into_iter().collect();
        let required = required
            .into_iter()
            .filter(|item| !collected.contains(item))
            .collect();
        Self {
            required,
            collected,
            completion_emitted: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// `(collected, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.collected.len(), self.total())
    }

    pub fn total(&self) -> usize {
        self.collected.len() + self.required.len()
    }

    pub fn is_completed(&self) -> bool {
        self.required.is_empty()
    }

    pub fn is_required(&self, item: &ItemId) -> bool {
        self.required.contains(item)
    }

    pub fn is_collected(&self, item: &ItemId) -> bool {
        self.collected.contains(item)
    }

    pub fn required(&self) -> impl Iterator<Item = &ItemId> {
        self.required.iter()
    }

    pub fn collected(&self) -> impl Iterator<Item = &ItemId> {
        self.collected.iter()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Collect `item`. Items that are not (or no longer) required are ignored.
    pub fn collect(&mut self, item: &ItemId) -> Vec<Event> {
        if !self.required.remove(item) {
            debug!(%item, "not a required objective item");
            return Vec::new();
        }
        self.collected.insert(item.clone());
        let (collected, total) = self.progress();
        debug!(%item, collected, total, "objective item collected");

        let mut events = vec![Event::ObjectiveProgress { collected, total }];
        if self.is_completed() && !self.completion_emitted {
            self.completion_emitted = true;
            info!(total, "objective completed");
            events.push(Event::ObjectiveCompleted);
        }
        events
    }
}

/// Place each item at a distinct, randomly chosen spawn point. Points are
/// used without replacement; items beyond the number of points stay unplaced.
pub fn assign_spawn_points<R: Rng + ?Sized>(
    items: &[ItemId],
    points: &[Position],
    rng: &mut R,
) -> Vec<(ItemId, Position)> {
    let mut free = points.to_vec();
    let mut placed = Vec::with_capacity(items.len().min(points.len()));
    for item in items {
        if free.is_empty() {
            break;
        }
        let index = rng.gen_range(0..free.len());
        placed.push((item.clone(), free.swap_remove(index)));
    }
    placed
}
