//! Player progress: currency, inventory and quest lists.

use nquester_common::{ItemId, QuestId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-session player state.
///
/// Quest lists are mutated only by the quest manager; everything else is
/// open to the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    /// Currency ("users"). Negative random events may push it below zero.
    pub(crate) currency: i64,
    /// Item id to count
    pub(crate) inventory: BTreeMap<ItemId, u32>,
    /// Completed quest ids, in completion order
    pub(crate) completed_quests: Vec<QuestId>,
    /// Active quest ids, in start order
    pub(crate) active_quests: Vec<QuestId>,
}

impl PlayerProgress {
    /// Creates an empty player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a player with starting currency.
    #[must_use]
    pub fn with_currency(currency: i64) -> Self {
        Self {
            currency,
            ..Self::default()
        }
    }

    /// Returns the raw currency.
    #[must_use]
    pub const fn currency(&self) -> i64 {
        self.currency
    }

    /// Currency as shown in the HUD: floored at zero and capped at `target`.
    #[must_use]
    pub fn display_currency(&self, target: i64) -> i64 {
        self.currency.clamp(0, target.max(0))
    }

    /// Applies a currency delta.
    pub fn add_currency(&mut self, delta: i64) {
        self.currency = self.currency.saturating_add(delta);
    }

    /// Adds items to the inventory.
    pub fn add_item(&mut self, item: ItemId, count: u32) {
        if count == 0 {
            return;
        }
        *self.inventory.entry(item).or_insert(0) += count;
    }

    /// Returns whether at least one of `item` is held.
    #[must_use]
    pub fn has_item(&self, item: &str) -> bool {
        self.item_count(item) > 0
    }

    /// Returns how many of `item` are held.
    #[must_use]
    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    /// Removes items. Returns false and leaves the inventory untouched when
    /// fewer than `count` are held.
    pub fn remove_item(&mut self, item: &str, count: u32) -> bool {
        let Some(held) = self.inventory.get_mut(item) else {
            return count == 0;
        };
        if *held < count {
            return false;
        }
        *held -= count;
        if *held == 0 {
            self.inventory.remove(item);
        }
        true
    }

    /// Items from `items` that are not held.
    #[must_use]
    pub fn missing_items<'a>(&self, items: &'a [ItemId]) -> Vec<&'a ItemId> {
        items.iter().filter(|item| !self.has_item(item.as_str())).collect()
    }

    /// Returns the inventory.
    #[must_use]
    pub const fn inventory(&self) -> &BTreeMap<ItemId, u32> {
        &self.inventory
    }

    /// Completed quest ids.
    #[must_use]
    pub fn completed_quests(&self) -> &[QuestId] {
        &self.completed_quests
    }

    /// Active quest ids.
    #[must_use]
    pub fn active_quests(&self) -> &[QuestId] {
        &self.active_quests
    }

    /// Returns whether a quest is completed.
    #[must_use]
    pub fn has_completed(&self, quest: &str) -> bool {
        self.completed_quests.iter().any(|q| q.as_str() == quest)
    }

    /// Returns whether a quest is active.
    #[must_use]
    pub fn is_active(&self, quest: &str) -> bool {
        self.active_quests.iter().any(|q| q.as_str() == quest)
    }

    pub(crate) fn push_active(&mut self, quest: &QuestId) {
        if !self.is_active(quest.as_str()) {
            self.active_quests.push(quest.clone());
        }
    }

    pub(crate) fn remove_active(&mut self, quest: &QuestId) {
        self.active_quests.retain(|q| q != quest);
    }

    pub(crate) fn push_completed(&mut self, quest: &QuestId) {
        self.remove_active(quest);
        if !self.has_completed(quest.as_str()) {
            self.completed_quests.push(quest.clone());
        }
    }
}
