//! Reward computation: currency payout, bonus item drops and experience.

use crate::catalog::{BaseReward, Difficulty};
use nquester_common::{Dice, ItemId, QuestId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Experience granted per quest before the difficulty multiplier.
pub const BASE_EXPERIENCE: f64 = 50.0;

/// Effect an item has when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Grants currency
    Users,
    /// Movement speed multiplier
    Speed,
    /// Luck multiplier
    Luck,
    /// Energy restore
    Energy,
}

/// Template for a bonus item that can drop from a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemArchetype {
    /// Inventory key
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Effect type
    pub effect: EffectKind,
    /// Effect magnitude
    pub magnitude: f32,
    /// Effect duration in seconds, 0 = permanent
    pub duration_secs: f32,
}

impl ItemArchetype {
    /// Creates an archetype.
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        effect: EffectKind,
        magnitude: f32,
        duration_secs: f32,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.to_string(),
            effect,
            magnitude,
            duration_secs,
        }
    }

    /// Returns whether the effect never expires.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.duration_secs <= 0.0
    }
}

/// The five bonus items.
#[must_use]
pub fn default_items() -> Vec<ItemArchetype> {
    vec![
        ItemArchetype::new("coffee", "Coffee", EffectKind::Users, 50.0, 0.0),
        ItemArchetype::new("energy_drink", "Energy Drink", EffectKind::Speed, 1.5, 30.0),
        ItemArchetype::new("presentation", "Presentation", EffectKind::Users, 200.0, 0.0),
        ItemArchetype::new("certificate", "Certificate", EffectKind::Users, 100.0, 0.0),
        ItemArchetype::new("debug_tool", "Debug Tool", EffectKind::Luck, 1.3, 0.0),
    ]
}

/// Payout for one completed quest. Produced once and applied once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardOutcome {
    /// Quest that paid out
    pub quest_id: QuestId,
    /// Currency delta
    pub currency: i64,
    /// Item the quest always grants
    pub quest_item: Option<ItemId>,
    /// Random bonus drop
    pub bonus_item: Option<ItemArchetype>,
    /// Experience delta (display only)
    pub experience: u32,
}

impl RewardOutcome {
    /// Every item id granted by this outcome.
    pub fn granted_items(&self) -> impl Iterator<Item = &ItemId> {
        self.quest_item
            .iter()
            .chain(self.bonus_item.as_ref().map(|item| &item.id))
    }
}

/// Computes quest payouts. Stateless apart from its item table.
#[derive(Debug, Clone)]
pub struct RewardSystem {
    items: Vec<ItemArchetype>,
}

impl Default for RewardSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardSystem {
    /// Creates a reward system with the default item table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: default_items(),
        }
    }

    /// Replaces the item table. An empty table disables drops.
    #[must_use]
    pub fn with_items(mut self, items: Vec<ItemArchetype>) -> Self {
        self.items = items;
        self
    }

    /// Returns the item table.
    #[must_use]
    pub fn items(&self) -> &[ItemArchetype] {
        &self.items
    }

    /// Looks up an archetype by id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemArchetype> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    /// Currency paid for `base` at `difficulty`.
    #[must_use]
    pub fn payout(base: i64, difficulty: Difficulty) -> i64 {
        (base as f64 * difficulty.multiplier()).round() as i64
    }

    /// Computes the payout for a quest. Never fails.
    pub fn give_reward(
        &self,
        quest_id: &QuestId,
        base: &BaseReward,
        difficulty: Difficulty,
        dice: &mut dyn Dice,
    ) -> RewardOutcome {
        let currency = Self::payout(base.currency, difficulty);
        let experience = (BASE_EXPERIENCE * difficulty.multiplier()) as u32;

        let bonus_item = if !self.items.is_empty() && dice.roll() < difficulty.item_drop_chance() {
            let idx = dice.pick(self.items.len());
            self.items.get(idx).cloned()
        } else {
            None
        };

        debug!(
            "Reward for {quest_id}: {currency} users, {experience} xp, bonus {:?}",
            bonus_item.as_ref().map(|item| item.id.as_str())
        );

        RewardOutcome {
            quest_id: quest_id.clone(),
            currency,
            quest_item: base.item.clone(),
            bonus_item,
            experience,
        }
    }
}
