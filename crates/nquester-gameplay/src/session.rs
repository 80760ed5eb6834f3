//! Game session: owns every manager and runs the quest flow.
//!
//! The session is the orchestrator of the update loop. It keeps a current
//! [`GameMode`] instead of nesting loops: talking to an NPC switches to
//! dialogue, accepting an offer runs the challenge synchronously and lands
//! back in dialogue with the outcome lines, closing the dialogue returns to
//! exploration. Reaching the currency target switches to victory.
//!
//! Flow for one quest:
//! 1. [`Session::interact`] yields the NPC's interaction and remembers any offer
//! 2. [`Session::accept_quest`] starts the quest and dispatches its challenge
//! 3. On success the quest manager pays out and the NPC and progress tracker
//!    mirror the completion; on failure the quest stays retryable
//! 4. [`Session::update`] ticks random events and achievements every frame

use crate::achievements::{AchievementBook, GameStats, NO_FASTEST_TIME};
use crate::catalog::{ChallengeKind, ChallengeParams, QuestCatalog, QuestCategory, QuestDefinition};
use crate::challenge::{ChallengeDispatcher, ChallengeOutcome, ChallengeProvider, ChallengeRequest};
use crate::config::SessionConfig;
use crate::content::{default_catalog, default_roster};
use crate::events::{GameSignal, SignalBus, SignalHandler};
use crate::humor;
use crate::npc::{Interaction, Npc, NpcRole, NpcRoster};
use crate::player::PlayerProgress;
use crate::progress::ProgressTracker;
use crate::quest::{QuestError, QuestManager, QuestStatus};
use crate::random_event::{EventManager, RandomEventDef};
use crate::reward::{RewardOutcome, RewardSystem};
use crate::save::{NpcFlags, SessionSnapshot};
use nquester_common::{Dice, ItemId, NpcId, QuestId, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// What the update loop is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Walking around
    #[default]
    Exploration,
    /// Dialogue box open
    Dialogue,
    /// Minigame running
    Challenge,
    /// Boss battle running
    BossBattle,
    /// Target reached
    Victory,
}

impl GameMode {
    /// Mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Dialogue => "dialogue",
            Self::Challenge => "challenge",
            Self::BossBattle => "boss_battle",
            Self::Victory => "victory",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Quest transition rejected
    #[error(transparent)]
    Quest(#[from] QuestError),

    /// No NPC with this id
    #[error("Unknown NPC: {0}")]
    UnknownNpc(String),

    /// Nothing to accept
    #[error("No quest on offer")]
    NoPendingOffer,

    /// Operation not allowed in the current mode
    #[error("Not allowed in {actual} mode (needs {expected})")]
    WrongMode {
        /// Mode the operation needs
        expected: GameMode,
        /// Current mode
        actual: GameMode,
    },
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result of accepting a quest offer.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestFlowOutcome {
    /// Quest attempted
    pub quest_id: QuestId,
    /// What the challenge reported
    pub outcome: ChallengeOutcome,
    /// Payout, present only on success
    pub reward: Option<RewardOutcome>,
    /// Dialogue lines explaining the result
    pub lines: Vec<String>,
    /// Follow-up quest now offered by the same NPC
    pub follow_up: Option<QuestId>,
}

impl QuestFlowOutcome {
    /// Returns whether the quest was completed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.reward.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingOffer {
    npc: NpcId,
    quest_id: QuestId,
}

/// One player's game session.
pub struct Session {
    config: SessionConfig,
    quests: QuestManager,
    npcs: NpcRoster,
    rewards: RewardSystem,
    progress: ProgressTracker,
    events: EventManager,
    achievements: AchievementBook,
    challenges: ChallengeDispatcher,
    player: PlayerProgress,
    bus: SignalBus,
    dice: Box<dyn Dice>,
    mode: GameMode,
    dialogue: Vec<String>,
    pending: Option<PendingOffer>,
    bugs_found: u32,
    perfect_quests: u32,
    fastest_quest_time: f64,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("currency", &self.player.currency())
            .field("completed", &self.player.completed_quests().len())
            .field("active", &self.player.active_quests())
            .field("pending", &self.pending)
            .field("challenges", &self.challenges)
            .finish_non_exhaustive()
    }
}

fn build_progress(catalog: &QuestCatalog, roster: &NpcRoster) -> ProgressTracker {
    let mut progress = ProgressTracker::new(catalog.len());
    for npc in roster.iter().filter(|npc| npc.role() == NpcRole::Student) {
        let total = catalog.for_npc(npc.id().as_str()).count();
        progress.register_student(npc.id().clone(), total);
    }
    progress
}

fn build_events(config: &SessionConfig) -> EventManager {
    let mut events = EventManager::new(config.event_interval_secs);
    events.set_enabled(config.events_enabled);
    events
}

impl Session {
    /// Creates a session over a catalog and a placed NPC roster.
    #[must_use]
    pub fn new(config: SessionConfig, catalog: QuestCatalog, roster: NpcRoster) -> Self {
        let mut config = config;
        config.validate();

        let bus = SignalBus::new(config.signal_capacity);
        let progress = build_progress(&catalog, &roster);
        let events = build_events(&config);
        let dice: Box<dyn Dice> = match config.rng_seed {
            Some(seed) => Box::new(fastrand::Rng::with_seed(seed)),
            None => Box::new(fastrand::Rng::new()),
        };

        info!(
            "New session: {} quests, {} NPCs, target {} users",
            catalog.len(),
            roster.len(),
            config.target_users
        );

        Self {
            quests: QuestManager::new(catalog).with_signals(bus.sender()),
            npcs: roster,
            rewards: RewardSystem::new(),
            progress,
            events,
            achievements: AchievementBook::new(),
            challenges: ChallengeDispatcher::with_builtin_checks(),
            player: PlayerProgress::new(),
            bus,
            dice,
            mode: GameMode::Exploration,
            dialogue: Vec::new(),
            pending: None,
            bugs_found: 0,
            perfect_quests: 0,
            fastest_quest_time: NO_FASTEST_TIME,
            config,
        }
    }

    /// Creates a session with the built-in quests and NPCs.
    #[must_use]
    pub fn with_default_content(config: SessionConfig) -> Self {
        let catalog = default_catalog();
        let roster = default_roster(&catalog);
        Self::new(config, catalog, roster)
    }

    /// Replaces the randomness source.
    #[must_use]
    pub fn with_dice(mut self, dice: impl Dice + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    /// Replaces the reward table.
    #[must_use]
    pub fn with_rewards(mut self, rewards: RewardSystem) -> Self {
        self.rewards = rewards;
        self
    }

    /// Replaces the random event pool.
    #[must_use]
    pub fn with_event_pool(mut self, pool: Vec<RandomEventDef>) -> Self {
        self.events = build_events(&self.config).with_pool(pool);
        self
    }

    /// Registers (or replaces) the challenge provider for a kind.
    pub fn register_provider(
        &mut self,
        kind: ChallengeKind,
        provider: impl ChallengeProvider + 'static,
    ) {
        self.challenges.register(kind, provider);
    }

    fn require_mode(&self, expected: GameMode) -> SessionResult<()> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(SessionError::WrongMode {
                expected,
                actual: self.mode,
            })
        }
    }

    /// Talks to an NPC. Opens the dialogue and remembers any quest offer.
    pub fn interact(&mut self, npc_id: &str) -> SessionResult<Interaction> {
        self.require_mode(GameMode::Exploration)?;
        let npc = self
            .npcs
            .get_mut(npc_id)
            .ok_or_else(|| SessionError::UnknownNpc(npc_id.to_string()))?;

        let interaction = npc.interact(self.dice.as_mut());
        self.pending = interaction.quest_id().map(|quest_id| PendingOffer {
            npc: npc.id().clone(),
            quest_id: quest_id.clone(),
        });
        self.dialogue = interaction.lines().to_vec();
        self.mode = GameMode::Dialogue;
        debug!("Talking to {npc_id}: {:?}", self.pending);
        Ok(interaction)
    }

    /// Accepts the offered quest and runs its challenge to completion.
    ///
    /// On success the reward is paid and the NPC may offer a follow-up; on
    /// failure the quest can be retried. Either way the session ends up in
    /// dialogue mode showing the result lines.
    pub fn accept_quest(&mut self) -> SessionResult<QuestFlowOutcome> {
        self.require_mode(GameMode::Dialogue)?;
        let offer = self.pending.take().ok_or(SessionError::NoPendingOffer)?;

        let result = self.run_quest(&offer);
        if let Err(e) = &result {
            warn!("Could not run quest {}: {e}", offer.quest_id);
            self.end_dialogue();
        }
        result
    }

    fn run_quest(&mut self, offer: &PendingOffer) -> SessionResult<QuestFlowOutcome> {
        let definition = self
            .quests
            .get_quest_data(offer.quest_id.as_str())?
            .clone();
        if self.quests.status(definition.id.as_str()) == QuestStatus::Active {
            // Restored mid-quest: run the challenge again without a new attempt
            debug!("Resuming active quest {}", definition.id);
        } else {
            self.quests
                .start_quest(definition.id.as_str(), &mut self.player)?;
        }

        self.mode = if definition.kind() == ChallengeKind::BossBattle {
            GameMode::BossBattle
        } else {
            GameMode::Challenge
        };

        let request = ChallengeRequest {
            quest_id: &definition.id,
            params: &definition.challenge,
            player: &self.player,
        };
        let outcome = self.challenges.dispatch(&request);

        if let Some(seconds) = outcome.metrics().and_then(|m| m.time_taken) {
            self.quests.advance_time(seconds);
        }

        let flow = if outcome.is_success() {
            self.finish_success(offer, &definition, outcome)?
        } else {
            self.finish_failure(offer, &definition, outcome)?
        };

        self.dialogue.clone_from(&flow.lines);
        self.mode = GameMode::Dialogue;
        self.check_victory();
        Ok(flow)
    }

    fn finish_success(
        &mut self,
        offer: &PendingOffer,
        definition: &QuestDefinition,
        outcome: ChallengeOutcome,
    ) -> SessionResult<QuestFlowOutcome> {
        let quest_id = &definition.id;
        self.quests.mark_challenge_completed(quest_id.as_str())?;
        if let Some(bugs) = outcome.metrics().and_then(|m| m.bugs_found) {
            self.bugs_found = self.bugs_found.saturating_add(bugs);
        }

        if !self.quests.check_completion(quest_id.as_str(), &self.player) {
            warn!("Challenge for {quest_id} passed but its completion condition does not hold");
            let outcome = ChallengeOutcome::Failed(outcome.metrics().copied().unwrap_or_default());
            return self.finish_failure(offer, definition, outcome);
        }

        for item in definition.challenge.consumed_items() {
            self.player.remove_item(item.as_str(), 1);
        }

        let reward = self.quests.complete_quest(
            quest_id.as_str(),
            &mut self.player,
            &self.rewards,
            self.dice.as_mut(),
        )?;

        self.progress.record_quest_attempt(quest_id, true);
        self.progress
            .record_student_completion(definition.npc_id.as_str(), quest_id);
        if self
            .quests
            .instance(quest_id.as_str())
            .is_some_and(|instance| instance.is_perfect())
        {
            self.perfect_quests += 1;
        }
        if let Some(seconds) = outcome.metrics().and_then(|m| m.time_taken) {
            self.fastest_quest_time = self.fastest_quest_time.min(seconds);
        }

        let mut lines = Vec::new();
        if !definition.dialogue.complete.is_empty() {
            lines.push(definition.dialogue.complete.clone());
        }

        let next = definition
            .follow_up
            .as_ref()
            .and_then(|id| self.quests.catalog().get(id.as_str()));
        if let Some(npc) = self.npcs.get_mut(offer.npc.as_str()) {
            npc.complete_quest();
            let thanks = npc.completion_line(self.dice.as_mut());
            if !thanks.is_empty() {
                lines.push(thanks.to_string());
            }
            if let Some(next) = next {
                let hint = npc.reward_hint();
                npc.assign_quest(next.id.clone(), next.dialogue.start.clone(), hint);
                info!("{} now offers {}", npc.id(), next.id);
            }
        }
        lines.extend(definition.dialogue.user_feedback.iter().cloned());

        Ok(QuestFlowOutcome {
            quest_id: quest_id.clone(),
            outcome,
            reward: Some(reward),
            lines,
            follow_up: next.map(|next| next.id.clone()),
        })
    }

    fn finish_failure(
        &mut self,
        offer: &PendingOffer,
        definition: &QuestDefinition,
        outcome: ChallengeOutcome,
    ) -> SessionResult<QuestFlowOutcome> {
        let quest_id = &definition.id;
        self.quests.fail_quest(quest_id.as_str(), &mut self.player)?;
        self.progress.record_quest_attempt(quest_id, false);
        if let Some(npc) = self.npcs.get_mut(offer.npc.as_str()) {
            npc.fail_quest();
        }

        if let ChallengeOutcome::ProviderError(message) = &outcome {
            warn!("Quest {quest_id} failed on a provider error: {message}");
        }

        let missing: Vec<&str> = match &definition.challenge {
            ChallengeParams::ItemCollection { required_items } => self
                .player
                .missing_items(required_items)
                .into_iter()
                .map(ItemId::as_str)
                .collect(),
            ChallengeParams::Fetch { item } if !self.player.has_item(item.as_str()) => {
                vec![item.as_str()]
            },
            _ => Vec::new(),
        };
        let line = if missing.is_empty() {
            definition.failure_line().to_string()
        } else {
            format!("You still need: {}", missing.join(", "))
        };

        Ok(QuestFlowOutcome {
            quest_id: quest_id.clone(),
            outcome,
            reward: None,
            lines: vec![line],
            follow_up: None,
        })
    }

    fn end_dialogue(&mut self) {
        self.dialogue.clear();
        self.pending = None;
        if self.mode != GameMode::Victory {
            self.mode = GameMode::Exploration;
        }
    }

    /// Closes the dialogue box, declining any offer.
    pub fn close_dialogue(&mut self) {
        if self.mode == GameMode::Dialogue {
            self.end_dialogue();
        }
    }

    /// Adds a found item to the inventory.
    pub fn pick_up_item(&mut self, item: impl Into<ItemId>) {
        let item = item.into();
        debug!("Picked up {item}");
        self.player.add_item(item, 1);
    }

    /// Advances the session by `dt` seconds.
    ///
    /// Ticks the random event timer, applies an activated event's currency
    /// delta, re-evaluates achievements and checks for victory. Returns the
    /// event activated this tick, if any.
    pub fn update(&mut self, dt: f64) -> Option<RandomEventDef> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.quests.advance_time(dt);

        let triggered = self.events.update(dt, self.dice.as_mut());
        if let Some(event) = &triggered {
            self.player.add_currency(event.effect.currency_delta());
            self.bus.publish(GameSignal::RandomEventTriggered {
                name: event.name.clone(),
                effect: event.effect,
            });
        }

        let stats = self.game_stats();
        for achievement in self.achievements.update(&stats) {
            self.bus
                .publish(GameSignal::AchievementUnlocked { achievement });
        }

        self.check_victory();
        triggered
    }

    fn check_victory(&mut self) {
        if self.mode != GameMode::Victory && self.player.currency() >= self.config.target_users {
            info!(
                "Victory: {} users reached",
                self.player.currency()
            );
            self.mode = GameMode::Victory;
            self.pending = None;
        }
    }

    /// Flat statistics for the achievement sink.
    #[must_use]
    pub fn game_stats(&self) -> GameStats {
        let catalog = self.quests.catalog();
        let completed_in = |category: QuestCategory| {
            self.player
                .completed_quests()
                .iter()
                .filter(|id| {
                    catalog
                        .get(id.as_str())
                        .is_some_and(|definition| definition.category == category)
                })
                .count() as u32
        };

        GameStats {
            completed_quests: self.player.completed_quests().len() as u32,
            swift_quests: completed_in(QuestCategory::Swift),
            ai_quests: completed_in(QuestCategory::Ai),
            typescript_quests: completed_in(QuestCategory::TypeScript),
            bugs_found: self.bugs_found,
            users: self.player.currency(),
            fastest_quest_time: self.fastest_quest_time,
            perfect_quests: self.perfect_quests,
            mentors_met: self.npcs.mentors_met() as u32,
        }
    }

    /// Captures everything needed to resume the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SchemaVersion::SNAPSHOT,
            currency: self.player.currency(),
            inventory: self.player.inventory().clone(),
            active_quests: self.player.active_quests().to_vec(),
            completed_quests: self.player.completed_quests().to_vec(),
            npcs: self
                .npcs
                .iter()
                .map(|npc: &Npc| {
                    (
                        npc.id().clone(),
                        NpcFlags {
                            quest_id: npc.quest_id().cloned(),
                            completed: npc.is_completed(),
                            failed: npc.is_failed(),
                            met: npc.is_met(),
                        },
                    )
                })
                .collect(),
            achievements: self.achievements.flags().clone(),
            bugs_found: self.bugs_found,
            perfect_quests: self.perfect_quests,
            fastest_quest_time: self.fastest_quest_time,
        }
    }

    /// Restores a snapshot. Quest and NPC ids missing from the current
    /// content are skipped; random events restart from scratch.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) {
        let (completed, active) = {
            let catalog = self.quests.catalog();
            let known = |id: &&QuestId| catalog.contains(id.as_str());
            let completed: Vec<QuestId> = snapshot
                .completed_quests
                .iter()
                .filter(known)
                .cloned()
                .collect();
            let active: Vec<QuestId> = snapshot
                .active_quests
                .iter()
                .filter(known)
                .filter(|id| !completed.contains(id))
                .cloned()
                .collect();
            (completed, active)
        };
        let skipped = snapshot.completed_quests.len() + snapshot.active_quests.len()
            - completed.len()
            - active.len();
        if skipped > 0 {
            warn!("Skipped {skipped} unknown quest ids while restoring");
        }

        let mut player = PlayerProgress::with_currency(snapshot.currency);
        player.inventory.clone_from(&snapshot.inventory);
        player.completed_quests.clone_from(&completed);
        player.active_quests.clone_from(&active);
        self.player = player;
        self.quests.restore(&active, &completed);

        for (id, flags) in &snapshot.npcs {
            let Some(npc) = self.npcs.get_mut(id.as_str()) else {
                continue;
            };
            if let Some(quest_id) = &flags.quest_id {
                if npc.quest_id() != Some(quest_id) {
                    if let Some(definition) = self.quests.catalog().get(quest_id.as_str()) {
                        let hint = npc.reward_hint();
                        npc.assign_quest(quest_id.clone(), definition.dialogue.start.clone(), hint);
                    }
                }
            }
            npc.restore_flags(flags.completed, flags.failed);
            npc.restore_met(flags.met);
        }

        self.progress = build_progress(self.quests.catalog(), &self.npcs);
        for quest_id in &completed {
            self.progress.record_quest_attempt(quest_id, true);
            if let Some(definition) = self.quests.catalog().get(quest_id.as_str()) {
                self.progress
                    .record_student_completion(definition.npc_id.as_str(), quest_id);
            }
        }

        self.achievements.restore(&snapshot.achievements);
        self.bugs_found = snapshot.bugs_found;
        self.perfect_quests = snapshot.perfect_quests;
        self.fastest_quest_time = if snapshot.fastest_quest_time.is_finite() {
            snapshot.fastest_quest_time.max(0.0)
        } else {
            NO_FASTEST_TIME
        };
        self.events = build_events(&self.config);
        self.mode = GameMode::Exploration;
        self.end_dialogue();
        self.check_victory();

        info!(
            "Restored session: {} users, {} completed, {} active",
            self.player.currency(),
            completed.len(),
            active.len()
        );
    }

    /// Drains pending signals.
    pub fn drain_signals(&self) -> Vec<GameSignal> {
        self.bus.drain()
    }

    /// Drains pending signals into a handler.
    pub fn dispatch_signals(&self, handler: &mut dyn SignalHandler) -> usize {
        self.bus.dispatch(handler)
    }

    /// Random loading screen tip.
    pub fn random_tip(&mut self) -> &'static str {
        humor::random_tip(self.dice.as_mut())
    }

    /// Random loading screen meme.
    pub fn random_meme(&mut self) -> &'static str {
        humor::random_meme(self.dice.as_mut())
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    /// Lines in the open dialogue box.
    #[must_use]
    pub fn dialogue_lines(&self) -> &[String] {
        &self.dialogue
    }

    /// Quest offered in the open dialogue.
    #[must_use]
    pub fn pending_quest(&self) -> Option<&QuestId> {
        self.pending.as_ref().map(|offer| &offer.quest_id)
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Player state.
    #[must_use]
    pub const fn player(&self) -> &PlayerProgress {
        &self.player
    }

    /// Currency clamped for display.
    #[must_use]
    pub fn display_currency(&self) -> i64 {
        self.player.display_currency(self.config.target_users)
    }

    /// Quest manager.
    #[must_use]
    pub const fn quests(&self) -> &QuestManager {
        &self.quests
    }

    /// NPC roster.
    #[must_use]
    pub const fn npcs(&self) -> &NpcRoster {
        &self.npcs
    }

    /// Looks up one NPC.
    #[must_use]
    pub fn npc(&self, id: &str) -> Option<&Npc> {
        self.npcs.get(id)
    }

    /// Reward table.
    #[must_use]
    pub const fn rewards(&self) -> &RewardSystem {
        &self.rewards
    }

    /// Progress tracker.
    #[must_use]
    pub const fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Overall completion percentage.
    #[must_use]
    pub fn completion_percentage(&self) -> f32 {
        self.progress.completion_percentage()
    }

    /// Random event manager.
    #[must_use]
    pub const fn events(&self) -> &EventManager {
        &self.events
    }

    /// Achievement flags.
    #[must_use]
    pub const fn achievements(&self) -> &AchievementBook {
        &self.achievements
    }

    /// Bugs found so far.
    #[must_use]
    pub const fn bugs_found(&self) -> u32 {
        self.bugs_found
    }
}
