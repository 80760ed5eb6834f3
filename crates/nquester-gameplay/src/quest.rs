//! Quest manager: the sole owner and mutator of per-session quest state.
//!
//! Transitions follow `NotStarted -> Active -> {Completed | Failed -> Active}`.
//! A completed quest never leaves `Completed` and pays out exactly once.

use crate::catalog::{ChallengeParams, QuestCatalog, QuestDefinition};
use crate::events::{publish, GameSignal};
use crate::player::PlayerProgress;
use crate::reward::{RewardOutcome, RewardSystem};
use crossbeam_channel::Sender;
use nquester_common::{Dice, QuestId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Error types for quest operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestError {
    /// Quest not found
    #[error("Quest not found: {0}")]
    NotFound(QuestId),
    /// Quest already active
    #[error("Quest already active: {0}")]
    AlreadyActive(QuestId),
    /// Quest already completed
    #[error("Quest already completed: {0}")]
    AlreadyCompleted(QuestId),
    /// Quest not active
    #[error("Quest not active: {0}")]
    NotActive(QuestId),
}

/// Result type for quest operations.
pub type QuestResult<T> = Result<T, QuestError>;

/// Lifecycle status of a quest within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestStatus {
    /// Never started
    #[default]
    NotStarted,
    /// In progress
    Active,
    /// Completed and rewarded
    Completed,
    /// Last attempt failed; can be retried
    Failed,
}

impl QuestStatus {
    /// Returns the status as a lowercase string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Per-session state of one quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestInstance {
    /// Quest ID
    pub quest_id: QuestId,
    /// Current status
    pub status: QuestStatus,
    /// Number of times the quest was started
    pub attempts: u32,
    /// Game time of the latest start
    pub started_at: f64,
    /// Challenge reported success for the current attempt
    pub challenge_completed: bool,
    /// Seconds between the last start and completion
    pub time_taken: Option<f64>,
}

impl QuestInstance {
    fn new(quest_id: QuestId) -> Self {
        Self {
            quest_id,
            status: QuestStatus::NotStarted,
            attempts: 0,
            started_at: 0.0,
            challenge_completed: false,
            time_taken: None,
        }
    }

    /// Completed on the first attempt.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.status == QuestStatus::Completed && self.attempts == 1
    }
}

/// Tracks quest instances for one player session.
#[derive(Debug)]
pub struct QuestManager {
    /// Immutable quest definitions
    catalog: QuestCatalog,
    /// Instances created on first start
    instances: HashMap<QuestId, QuestInstance>,
    /// Current game time (for start timestamps)
    game_time: f64,
    /// Signal sink
    signals: Option<Sender<GameSignal>>,
}

impl QuestManager {
    /// Creates a quest manager over a catalog.
    #[must_use]
    pub fn new(catalog: QuestCatalog) -> Self {
        Self {
            catalog,
            instances: HashMap::new(),
            game_time: 0.0,
            signals: None,
        }
    }

    /// Routes quest signals to a bus.
    #[must_use]
    pub fn with_signals(mut self, sender: Sender<GameSignal>) -> Self {
        self.signals = Some(sender);
        self
    }

    fn emit(&self, signal: GameSignal) {
        if let Some(sender) = &self.signals {
            publish(sender, signal);
        }
    }

    /// Returns the catalog.
    #[must_use]
    pub const fn catalog(&self) -> &QuestCatalog {
        &self.catalog
    }

    /// Sets the current game time.
    pub fn set_game_time(&mut self, time: f64) {
        self.game_time = time;
    }

    /// Advances the game time.
    pub fn advance_time(&mut self, dt: f64) {
        self.game_time += dt.max(0.0);
    }

    /// Returns the current game time.
    #[must_use]
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Gets a quest definition.
    pub fn get_quest_data(&self, quest_id: &str) -> QuestResult<&QuestDefinition> {
        self.catalog
            .get(quest_id)
            .ok_or_else(|| QuestError::NotFound(QuestId::new(quest_id)))
    }

    /// Gets the session state of a quest.
    #[must_use]
    pub fn instance(&self, quest_id: &str) -> Option<&QuestInstance> {
        self.instances.get(quest_id)
    }

    /// Returns the status of a quest.
    #[must_use]
    pub fn status(&self, quest_id: &str) -> QuestStatus {
        self.instances
            .get(quest_id)
            .map_or(QuestStatus::NotStarted, |i| i.status)
    }

    /// Number of times a quest was started.
    #[must_use]
    pub fn attempts(&self, quest_id: &str) -> u32 {
        self.instances.get(quest_id).map_or(0, |i| i.attempts)
    }

    /// Iterates all quest instances.
    pub fn instances(&self) -> impl Iterator<Item = &QuestInstance> {
        self.instances.values()
    }

    /// Number of completed quests.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.instances
            .values()
            .filter(|i| i.status == QuestStatus::Completed)
            .count()
    }

    /// Starts (or restarts after failure) a quest.
    pub fn start_quest(&mut self, quest_id: &str, player: &mut PlayerProgress) -> QuestResult<()> {
        let id = self.get_quest_data(quest_id)?.id.clone();

        let instance = self
            .instances
            .entry(id.clone())
            .or_insert_with(|| QuestInstance::new(id.clone()));
        match instance.status {
            QuestStatus::Active => return Err(QuestError::AlreadyActive(id)),
            QuestStatus::Completed => return Err(QuestError::AlreadyCompleted(id)),
            QuestStatus::NotStarted | QuestStatus::Failed => {},
        }

        instance.status = QuestStatus::Active;
        instance.attempts += 1;
        instance.started_at = self.game_time;
        instance.challenge_completed = false;
        let attempts = instance.attempts;

        player.push_active(&id);
        info!("Quest started: {id} (attempt {attempts})");
        self.emit(GameSignal::QuestStarted { quest_id: id });
        Ok(())
    }

    fn active_instance_mut(&mut self, quest_id: &str) -> QuestResult<&mut QuestInstance> {
        let id = self.get_quest_data(quest_id)?.id.clone();
        match self.instances.get_mut(quest_id) {
            Some(instance) if instance.status == QuestStatus::Active => Ok(instance),
            Some(instance) if instance.status == QuestStatus::Completed => {
                Err(QuestError::AlreadyCompleted(id))
            },
            _ => Err(QuestError::NotActive(id)),
        }
    }

    /// Records that the quest's challenge succeeded. Idempotent; grants nothing.
    pub fn mark_challenge_completed(&mut self, quest_id: &str) -> QuestResult<()> {
        let instance = self.active_instance_mut(quest_id)?;
        instance.challenge_completed = true;
        debug!("Challenge completed for {quest_id}");
        Ok(())
    }

    /// Checks whether an active quest's completion condition holds.
    ///
    /// Fetch needs the item, item collection needs every required item, all
    /// other kinds need the challenge flag.
    #[must_use]
    pub fn check_completion(&self, quest_id: &str, player: &PlayerProgress) -> bool {
        let (Some(definition), Some(instance)) =
            (self.catalog.get(quest_id), self.instances.get(quest_id))
        else {
            return false;
        };
        if instance.status != QuestStatus::Active {
            return false;
        }
        match &definition.challenge {
            ChallengeParams::Fetch { item } => player.has_item(item.as_str()),
            ChallengeParams::ItemCollection { required_items } => {
                player.missing_items(required_items).is_empty()
            },
            _ => instance.challenge_completed,
        }
    }

    /// Completes an active quest and pays its reward into `player`.
    pub fn complete_quest(
        &mut self,
        quest_id: &str,
        player: &mut PlayerProgress,
        rewards: &RewardSystem,
        dice: &mut dyn Dice,
    ) -> QuestResult<RewardOutcome> {
        let game_time = self.game_time;
        let instance = self.active_instance_mut(quest_id)?;
        instance.status = QuestStatus::Completed;
        instance.time_taken = Some((game_time - instance.started_at).max(0.0));
        let id = instance.quest_id.clone();

        let definition = self.get_quest_data(quest_id)?;
        let outcome = rewards.give_reward(&id, &definition.reward, definition.difficulty, dice);

        player.add_currency(outcome.currency);
        for item in outcome.granted_items() {
            player.add_item(item.clone(), 1);
        }
        player.push_completed(&id);

        info!("Quest completed: {id} (+{} users)", outcome.currency);
        self.emit(GameSignal::QuestCompleted {
            quest_id: id.clone(),
            currency: outcome.currency,
        });
        for item in outcome.granted_items() {
            info!("Item granted: {item}");
            self.emit(GameSignal::RewardItemGranted {
                quest_id: id.clone(),
                item: item.clone(),
            });
        }
        Ok(outcome)
    }

    /// Fails an active quest without reward. The quest stays retryable.
    pub fn fail_quest(&mut self, quest_id: &str, player: &mut PlayerProgress) -> QuestResult<()> {
        let instance = self.active_instance_mut(quest_id)?;
        instance.status = QuestStatus::Failed;
        instance.challenge_completed = false;
        let id = instance.quest_id.clone();

        player.remove_active(&id);
        info!("Quest failed: {id}");
        self.emit(GameSignal::QuestFailed { quest_id: id });
        Ok(())
    }

    /// Rebuilds instances from saved quest lists. Unknown ids are skipped.
    pub fn restore(&mut self, active: &[QuestId], completed: &[QuestId]) {
        self.instances.clear();
        for (ids, status) in [
            (completed, QuestStatus::Completed),
            (active, QuestStatus::Active),
        ] {
            for id in ids {
                if !self.catalog.contains(id.as_str()) || self.instances.contains_key(id) {
                    continue;
                }
                let mut instance = QuestInstance::new(id.clone());
                instance.status = status;
                instance.attempts = 1;
                instance.started_at = self.game_time;
                self.instances.insert(id.clone(), instance);
            }
        }
        debug!("Restored {} quest instances", self.instances.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestDefinition;
    use crate::events::SignalBus;
    use nquester_common::{ItemId, ScriptedDice};

    fn catalog() -> QuestCatalog {
        QuestCatalog::from_definitions([
            QuestDefinition::new("q1", "Alikhan", "Debug", ChallengeParams::minigame("swift_debug"))
                .with_reward(100, None),
            QuestDefinition::new("fetch", "book_student", "Book", ChallengeParams::fetch("book"))
                .with_reward(180, Some("Book")),
        ])
        .expect("catalog should build")
    }

    fn no_drop() -> ScriptedDice {
        ScriptedDice::constant(0.99)
    }

    #[test]
    fn test_start_unknown_quest() {
        let mut quests = QuestManager::new(catalog());
        let mut player = PlayerProgress::new();
        let before = player.clone();

        assert_eq!(
            quests.start_quest("unknown", &mut player),
            Err(QuestError::NotFound(QuestId::new("unknown")))
        );
        assert_eq!(player, before);
        assert!(quests.instance("unknown").is_none());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut quests = QuestManager::new(catalog());
        let mut player = PlayerProgress::new();
        quests
            .start_quest("q1", &mut player)
            .expect("start should succeed");
        assert_eq!(
            quests.start_quest("q1", &mut player),
            Err(QuestError::AlreadyActive(QuestId::new("q1")))
        );
        assert_eq!(quests.attempts("q1"), 1);
    }

    #[test]
    fn test_complete_pays_once() {
        let mut quests = QuestManager::new(catalog());
        let mut player = PlayerProgress::new();
        let rewards = RewardSystem::new();

        quests
            .start_quest("q1", &mut player)
            .expect("start should succeed");
        quests
            .mark_challenge_completed("q1")
            .expect("mark should succeed");
        let outcome = quests
            .complete_quest("q1", &mut player, &rewards, &mut no_drop())
            .expect("complete should succeed");

        assert_eq!(outcome.currency, 100);
        assert_eq!(player.currency(), 100);
        assert!(player.has_completed("q1"));
        assert!(!player.is_active("q1"));

        let again = quests.complete_quest("q1", &mut player, &rewards, &mut no_drop());
        assert_eq!(again, Err(QuestError::AlreadyCompleted(QuestId::new("q1"))));
        assert_eq!(player.currency(), 100);
        assert_eq!(
            quests.start_quest("q1", &mut player),
            Err(QuestError::AlreadyCompleted(QuestId::new("q1")))
        );
    }

    #[test]
    fn test_complete_requires_active() {
        let mut quests = QuestManager::new(catalog());
        let mut player = PlayerProgress::new();
        let result = quests.complete_quest("q1", &mut player, &RewardSystem::new(), &mut no_drop());
        assert_eq!(result, Err(QuestError::NotActive(QuestId::new("q1"))));
        assert_eq!(player.currency(), 0);
    }

    #[test]
    fn test_fail_then_retry() {
        let mut quests = QuestManager::new(catalog());
        let mut player = PlayerProgress::new();

        quests
            .start_quest("q1", &mut player)
            .expect("start should succeed");
        quests
            .fail_quest("q1", &mut player)
            .expect("fail should succeed");
        assert_eq!(quests.status("q1"), QuestStatus::Failed);
        assert!(!player.is_active("q1"));

        quests
            .start_quest("q1", &mut player)
            .expect("restart should succeed");
        assert_eq!(quests.attempts("q1"), 2);
        quests
            .complete_quest("q1", &mut player, &RewardSystem::new(), &mut no_drop())
            .expect("complete should succeed");
        let instance = quests.instance("q1").expect("instance exists");
        assert!(!instance.is_perfect());
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut quests = QuestManager::new(catalog());
        let mut player = PlayerProgress::new();
        quests
            .start_quest("q1", &mut player)
            .expect("start should succeed");
        quests.mark_challenge_completed("q1").expect("first mark");
        quests.mark_challenge_completed("q1").expect("second mark");
        assert!(quests.check_completion("q1", &player));
        assert_eq!(player.currency(), 0);
    }

    #[test]
    fn test_check_completion_fetch() {
        let mut quests = QuestManager::new(catalog());
        let mut player = PlayerProgress::new();
        quests
            .start_quest("fetch", &mut player)
            .expect("start should succeed");
        assert!(!quests.check_completion("fetch", &player));
        player.add_item(ItemId::new("book"), 1);
        assert!(quests.check_completion("fetch", &player));
        assert!(!quests.check_completion("q1", &player));
    }

    #[test]
    fn test_time_taken_recorded() {
        let mut quests = QuestManager::new(catalog());
        let mut player = PlayerProgress::new();
        quests.set_game_time(10.0);
        quests
            .start_quest("q1", &mut player)
            .expect("start should succeed");
        quests.advance_time(4.5);
        quests
            .complete_quest("q1", &mut player, &RewardSystem::new(), &mut no_drop())
            .expect("complete should succeed");
        let instance = quests.instance("q1").expect("instance exists");
        assert_eq!(instance.time_taken, Some(4.5));
        assert!(instance.is_perfect());
    }

    #[test]
    fn test_signals_emitted_in_order() {
        let bus = SignalBus::new(16);
        let mut quests = QuestManager::new(catalog()).with_signals(bus.sender());
        let mut player = PlayerProgress::new();

        quests
            .start_quest("fetch", &mut player)
            .expect("start should succeed");
        quests
            .complete_quest("fetch", &mut player, &RewardSystem::new(), &mut no_drop())
            .expect("complete should succeed");

        let names: Vec<&str> = bus.drain().iter().map(GameSignal::name).collect();
        assert_eq!(
            names,
            vec!["quest_started", "quest_completed", "reward_item_granted"]
        );
        assert_eq!(player.item_count("Book"), 1);
    }

    #[test]
    fn test_restore() {
        let mut quests = QuestManager::new(catalog());
        quests.restore(
            &[QuestId::new("fetch")],
            &[QuestId::new("q1"), QuestId::new("gone")],
        );
        assert_eq!(quests.status("q1"), QuestStatus::Completed);
        assert_eq!(quests.status("fetch"), QuestStatus::Active);
        assert!(quests.instance("gone").is_none());
        assert_eq!(quests.completed_count(), 1);
    }
}
