//! NPCs: quest givers with a thin presentation mirror of quest state.
//!
//! The quest manager owns quest state. An NPC only mirrors it through the
//! `has_quest` / `completed` / `failed` flags so it can pick what to say.

use nquester_common::{Dice, NpcId, QuestId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::content::completion_lines;

/// Flavour lines appended to a quest offer.
const FLAVOR_LINES: &[&str] = &[
    "I'd do it myself, but I have a deadline...",
    "They say finishing this quest spawns a bug in prod!",
    "Help me out or I'm fired on Monday!",
    "Pull it off and I'll buy you a coffee!",
    "Do it and I'll tell you a secret life hack!",
    "If it doesn't work, we'll call it a feature!",
    "Finish it for +100 karma!",
    "I haven't slept in three days, help!",
    "If anything goes wrong, I don't know you!",
    "Finish it and I'll tell you how to pass a Google interview!",
];

/// Encouragement lines offered after a failed attempt.
const RETRY_LINES: &[&str] = &[
    "Don't give up! Try again!",
    "You can do it! Give it another shot!",
    "Mistakes help you learn! Try again!",
    "Practice makes perfect! Try again!",
];

/// What kind of character an NPC is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcRole {
    /// Mentor with a skill quest
    Mentor,
    /// Student with a small errand
    Student,
    /// Final boss
    Boss,
}

/// Theme of an NPC's idle chatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueCategory {
    /// Exhausted student
    Tired,
    /// Busy coder
    Coding,
    /// Coffee addict
    Coffee,
    /// Anyone else
    #[default]
    General,
}

impl DialogueCategory {
    /// Idle line, depending on whether the NPC's quest is done.
    #[must_use]
    pub const fn idle_line(self, quest_done: bool) -> &'static str {
        match (self, quest_done) {
            (Self::Tired, true) => "Thanks for the water! I feel better now!",
            (Self::Tired, false) => "Ugh... so tired... need coffee...",
            (Self::Coding, true) => "The code is so much cleaner now! Thanks!",
            (Self::Coding, false) => "Writing code, catching bugs... just another day!",
            (Self::Coffee, true) => "Coffee and code: the best combo!",
            (Self::Coffee, false) => "Coffee is a programmer's best friend!",
            (Self::General, true) => "Thanks for the help! Everything works great!",
            (Self::General, false) => "Hi! How's it going?",
        }
    }
}

/// Where an NPC is in its quest state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NpcQuestState {
    /// No quest assigned
    Idle,
    /// Quest offered, not yet done
    Offered,
    /// Last attempt failed, retry available
    Failed,
    /// Quest done
    Completed,
}

/// Result of talking to an NPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// First offer of a quest
    QuestOffer {
        /// Quest on offer
        quest_id: QuestId,
        /// Opening dialogue plus one flavour line
        lines: Vec<String>,
    },
    /// Offer to retry a failed quest
    RetryOffer {
        /// Quest on offer
        quest_id: QuestId,
        /// One encouragement line
        lines: Vec<String>,
    },
    /// Plain dialogue, no quest on offer
    Dialogue {
        /// Lines to show
        lines: Vec<String>,
    },
}

impl Interaction {
    /// Quest on offer, if any.
    #[must_use]
    pub fn quest_id(&self) -> Option<&QuestId> {
        match self {
            Self::QuestOffer { quest_id, .. } | Self::RetryOffer { quest_id, .. } => Some(quest_id),
            Self::Dialogue { .. } => None,
        }
    }

    /// Lines to show.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        match self {
            Self::QuestOffer { lines, .. }
            | Self::RetryOffer { lines, .. }
            | Self::Dialogue { lines } => lines,
        }
    }
}

/// A quest-giving character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    id: NpcId,
    role: NpcRole,
    category: DialogueCategory,
    quest_id: Option<QuestId>,
    opening_dialogue: Vec<String>,
    reward_hint: i64,
    has_quest: bool,
    completed: bool,
    failed: bool,
    quest_marker: bool,
    met: bool,
}

impl Npc {
    /// Creates an NPC without a quest.
    #[must_use]
    pub fn new(id: NpcId, role: NpcRole) -> Self {
        Self {
            id,
            role,
            category: DialogueCategory::General,
            quest_id: None,
            opening_dialogue: Vec::new(),
            reward_hint: 0,
            has_quest: false,
            completed: false,
            failed: false,
            quest_marker: false,
            met: false,
        }
    }

    /// Sets the idle dialogue theme.
    #[must_use]
    pub const fn with_dialogue_category(mut self, category: DialogueCategory) -> Self {
        self.category = category;
        self
    }

    /// Returns the NPC id.
    #[must_use]
    pub const fn id(&self) -> &NpcId {
        &self.id
    }

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> NpcRole {
        self.role
    }

    /// Returns the assigned quest.
    #[must_use]
    pub const fn quest_id(&self) -> Option<&QuestId> {
        self.quest_id.as_ref()
    }

    /// Currency shown next to the offer. Display only; payouts come from the
    /// reward system.
    #[must_use]
    pub const fn reward_hint(&self) -> i64 {
        self.reward_hint
    }

    /// Returns whether a quest is assigned.
    #[must_use]
    pub const fn has_quest(&self) -> bool {
        self.has_quest
    }

    /// Returns whether the assigned quest is done.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns whether the last attempt failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns whether the "!" marker is shown.
    #[must_use]
    pub const fn shows_marker(&self) -> bool {
        self.quest_marker
    }

    /// Returns whether the player has talked to this NPC.
    #[must_use]
    pub const fn is_met(&self) -> bool {
        self.met
    }

    /// Current quest state.
    #[must_use]
    pub const fn quest_state(&self) -> NpcQuestState {
        if !self.has_quest {
            NpcQuestState::Idle
        } else if self.completed {
            NpcQuestState::Completed
        } else if self.failed {
            NpcQuestState::Failed
        } else {
            NpcQuestState::Offered
        }
    }

    /// Assigns a fresh quest, clearing any previous outcome.
    pub fn assign_quest(&mut self, quest_id: QuestId, dialogue: Vec<String>, reward_hint: i64) {
        self.quest_id = Some(quest_id);
        self.opening_dialogue = dialogue;
        self.reward_hint = reward_hint;
        self.has_quest = true;
        self.completed = false;
        self.failed = false;
        self.quest_marker = true;
    }

    /// Talks to the NPC.
    pub fn interact(&mut self, dice: &mut dyn Dice) -> Interaction {
        self.met = true;
        match (self.quest_state(), self.quest_id.clone()) {
            (NpcQuestState::Offered, Some(quest_id)) => {
                let mut lines = self.opening_dialogue.clone();
                lines.push(pick(FLAVOR_LINES, dice).to_string());
                Interaction::QuestOffer { quest_id, lines }
            },
            (NpcQuestState::Failed, Some(quest_id)) => Interaction::RetryOffer {
                quest_id,
                lines: vec![pick(RETRY_LINES, dice).to_string()],
            },
            (state, _) => Interaction::Dialogue {
                lines: vec![self
                    .category
                    .idle_line(state == NpcQuestState::Completed)
                    .to_string()],
            },
        }
    }

    /// Mirrors a completed quest.
    pub fn complete_quest(&mut self) {
        self.completed = true;
        self.failed = false;
        self.quest_marker = false;
    }

    /// Mirrors a failed attempt. The marker comes back on for the retry.
    pub fn fail_quest(&mut self) {
        self.failed = true;
        self.quest_marker = true;
    }

    /// Restores saved flags.
    pub fn restore_flags(&mut self, completed: bool, failed: bool) {
        self.completed = completed;
        self.failed = failed && !completed;
        self.quest_marker = self.has_quest && !completed;
    }

    /// Restores the saved "met" flag.
    pub fn restore_met(&mut self, met: bool) {
        self.met = met;
    }

    /// Thank-you line for after the quest.
    #[must_use]
    pub fn completion_line(&self, dice: &mut dyn Dice) -> &'static str {
        pick(completion_lines(self.id.as_str()), dice)
    }
}

fn pick(lines: &'static [&'static str], dice: &mut dyn Dice) -> &'static str {
    if lines.is_empty() {
        return "";
    }
    lines[dice.pick(lines.len()).min(lines.len() - 1)]
}

/// NPCs keyed by id, in placement order.
#[derive(Debug, Clone, Default)]
pub struct NpcRoster {
    npcs: Vec<Npc>,
    index: HashMap<NpcId, usize>,
}

impl NpcRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an NPC.
    pub fn insert(&mut self, npc: Npc) {
        if let Some(&i) = self.index.get(npc.id()) {
            self.npcs[i] = npc;
        } else {
            self.index.insert(npc.id().clone(), self.npcs.len());
            self.npcs.push(npc);
        }
    }

    /// Gets an NPC.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Npc> {
        self.index.get(id).map(|&i| &self.npcs[i])
    }

    /// Gets an NPC mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Npc> {
        self.index.get(id).map(|&i| &mut self.npcs[i])
    }

    /// Iterates NPCs in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.iter()
    }

    /// Number of NPCs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    /// Returns true when the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    /// Number of mentors the player has talked to.
    #[must_use]
    pub fn mentors_met(&self) -> usize {
        self.npcs
            .iter()
            .filter(|npc| npc.role() == NpcRole::Mentor && npc.is_met())
            .count()
    }
}
