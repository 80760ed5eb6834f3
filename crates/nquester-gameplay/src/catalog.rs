//! Quest catalog: immutable quest definitions loaded at startup.

use nquester_common::{ItemId, NpcId, NquesterError, QuestId, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Error types for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Document could not be parsed
    #[error("Failed to parse quest catalog: {0}")]
    Parse(String),
    /// Two definitions share an id
    #[error("Duplicate quest id: {0}")]
    DuplicateId(QuestId),
    /// A follow-up points at a quest that is not in the catalog
    #[error("Quest {quest} names unknown follow-up {follow_up}")]
    DanglingFollowUp {
        /// Quest declaring the follow-up
        quest: QuestId,
        /// Missing follow-up id
        follow_up: QuestId,
    },
    /// Document was written by an incompatible catalog version
    #[error("Unsupported catalog version {0}")]
    UnsupportedVersion(SchemaVersion),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for NquesterError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Io(e) => NquesterError::Io(e),
            CatalogError::UnsupportedVersion(found) => NquesterError::VersionMismatch {
                expected: SchemaVersion::QUEST_CATALOG.to_string(),
                actual: found.to_string(),
            },
            other => NquesterError::Content(other.to_string()),
        }
    }
}

/// Kind of challenge a quest runs. Used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Named arcade minigame
    Minigame,
    /// Turn-based boss battle
    BossBattle,
    /// Hand in a set of items
    ItemCollection,
    /// Click a number of times within a time limit
    Clicker,
    /// Hit beats in rhythm
    Rhythm,
    /// Pick colours within a time limit
    ColorPicker,
    /// Bring a single item
    Fetch,
}

impl ChallengeKind {
    /// All challenge kinds.
    pub const ALL: [Self; 7] = [
        Self::Minigame,
        Self::BossBattle,
        Self::ItemCollection,
        Self::Clicker,
        Self::Rhythm,
        Self::ColorPicker,
        Self::Fetch,
    ];

    /// Returns the snake_case name used in content files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minigame => "minigame",
            Self::BossBattle => "boss_battle",
            Self::ItemCollection => "item_collection",
            Self::Clicker => "clicker",
            Self::Rhythm => "rhythm",
            Self::ColorPicker => "color_picker",
            Self::Fetch => "fetch",
        }
    }
}

impl std::fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Challenge parameters, one shape per challenge kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChallengeParams {
    /// Named arcade minigame
    Minigame {
        /// Minigame identifier understood by the provider
        minigame_id: String,
    },
    /// Boss battle
    BossBattle,
    /// Hand in every listed item
    ItemCollection {
        /// Items that must all be in the inventory
        required_items: Vec<ItemId>,
    },
    /// Clicker game
    Clicker {
        /// Clicks needed to pass
        clicks_needed: u32,
        /// Time limit in seconds
        time_limit_secs: u32,
    },
    /// Rhythm game
    Rhythm {
        /// Beats needed to pass
        beats_needed: u32,
        /// Time limit in seconds
        time_limit_secs: u32,
    },
    /// Colour picker game
    ColorPicker {
        /// Colours needed to pass
        colors_needed: u32,
        /// Time limit in seconds
        time_limit_secs: u32,
    },
    /// Bring one item
    Fetch {
        /// Item to bring
        item: ItemId,
    },
}

impl ChallengeParams {
    /// Creates minigame parameters.
    #[must_use]
    pub fn minigame(minigame_id: impl Into<String>) -> Self {
        Self::Minigame {
            minigame_id: minigame_id.into(),
        }
    }

    /// Creates fetch parameters.
    #[must_use]
    pub fn fetch(item: impl Into<ItemId>) -> Self {
        Self::Fetch { item: item.into() }
    }

    /// Creates item collection parameters.
    #[must_use]
    pub fn collection<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self::ItemCollection {
            required_items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates clicker parameters.
    #[must_use]
    pub const fn clicker(clicks_needed: u32, time_limit_secs: u32) -> Self {
        Self::Clicker {
            clicks_needed,
            time_limit_secs,
        }
    }

    /// Returns the dispatch kind for these parameters.
    #[must_use]
    pub const fn kind(&self) -> ChallengeKind {
        match self {
            Self::Minigame { .. } => ChallengeKind::Minigame,
            Self::BossBattle => ChallengeKind::BossBattle,
            Self::ItemCollection { .. } => ChallengeKind::ItemCollection,
            Self::Clicker { .. } => ChallengeKind::Clicker,
            Self::Rhythm { .. } => ChallengeKind::Rhythm,
            Self::ColorPicker { .. } => ChallengeKind::ColorPicker,
            Self::Fetch { .. } => ChallengeKind::Fetch,
        }
    }

    /// Items the challenge consumes on success.
    #[must_use]
    pub fn consumed_items(&self) -> Vec<ItemId> {
        match self {
            Self::Fetch { item } => vec![item.clone()],
            Self::ItemCollection { required_items } => required_items.clone(),
            _ => Vec::new(),
        }
    }
}

/// Reward difficulty tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Easy quest
    Easy,
    /// Normal quest
    #[default]
    Normal,
    /// Hard quest
    Hard,
    /// Boss quest
    Boss,
}

impl Difficulty {
    /// Currency multiplier for this tier.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Easy => 0.7,
            Self::Normal => 1.0,
            Self::Hard => 1.5,
            Self::Boss => 3.0,
        }
    }

    /// Chance of a bonus item drop for this tier.
    #[must_use]
    pub const fn item_drop_chance(self) -> f32 {
        match self {
            Self::Normal => 0.3,
            Self::Hard => 0.5,
            Self::Easy | Self::Boss => 0.8,
        }
    }
}

/// Skill track a quest belongs to. Feeds achievement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestCategory {
    /// iOS / Swift
    Swift,
    /// Machine learning
    Ai,
    /// TypeScript
    TypeScript,
    /// Frontend
    Frontend,
    /// Backend
    Backend,
    /// Anything else
    #[default]
    General,
}

/// Dialogue attached to a quest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestDialogue {
    /// Lines spoken when the quest is offered
    pub start: Vec<String>,
    /// Line spoken when the quest is completed
    pub complete: String,
    /// Line spoken when the challenge is failed
    pub failure: String,
    /// Feedback lines shown after a successful completion
    pub user_feedback: Vec<String>,
}

/// Base payout before the difficulty multiplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseReward {
    /// Currency ("users")
    pub currency: i64,
    /// Item always granted on completion
    #[serde(default)]
    pub item: Option<ItemId>,
}

/// Immutable definition of a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDefinition {
    /// Unique quest id
    pub id: QuestId,
    /// NPC offering the quest
    pub npc_id: NpcId,
    /// Display title
    pub title: String,
    /// Dialogue lines
    #[serde(default)]
    pub dialogue: QuestDialogue,
    /// Challenge to run
    pub challenge: ChallengeParams,
    /// Base reward
    pub reward: BaseReward,
    /// Reward tier
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Skill track
    #[serde(default)]
    pub category: QuestCategory,
    /// Quest handed out by the same NPC after this one completes
    #[serde(default)]
    pub follow_up: Option<QuestId>,
}

impl QuestDefinition {
    /// Creates a definition with no dialogue and zero reward.
    #[must_use]
    pub fn new(
        id: impl Into<QuestId>,
        npc_id: impl Into<NpcId>,
        title: impl Into<String>,
        challenge: ChallengeParams,
    ) -> Self {
        Self {
            id: id.into(),
            npc_id: npc_id.into(),
            title: title.into(),
            dialogue: QuestDialogue::default(),
            challenge,
            reward: BaseReward::default(),
            difficulty: Difficulty::Normal,
            category: QuestCategory::General,
            follow_up: None,
        }
    }

    /// Sets the base reward.
    #[must_use]
    pub fn with_reward(mut self, currency: i64, item: Option<&str>) -> Self {
        self.reward = BaseReward {
            currency,
            item: item.map(ItemId::from),
        };
        self
    }

    /// Sets the difficulty tier.
    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the skill category.
    #[must_use]
    pub const fn with_category(mut self, category: QuestCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets the opening lines.
    #[must_use]
    pub fn with_start_lines(mut self, lines: &[&str]) -> Self {
        self.dialogue.start = lines.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the completion line.
    #[must_use]
    pub fn with_complete_line(mut self, line: impl Into<String>) -> Self {
        self.dialogue.complete = line.into();
        self
    }

    /// Sets the failure line.
    #[must_use]
    pub fn with_failure_line(mut self, line: impl Into<String>) -> Self {
        self.dialogue.failure = line.into();
        self
    }

    /// Sets the post-completion feedback lines.
    #[must_use]
    pub fn with_feedback(mut self, lines: &[&str]) -> Self {
        self.dialogue.user_feedback = lines.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the follow-up quest.
    #[must_use]
    pub fn with_follow_up(mut self, follow_up: impl Into<QuestId>) -> Self {
        self.follow_up = Some(follow_up.into());
        self
    }

    /// Returns the challenge kind.
    #[must_use]
    pub const fn kind(&self) -> ChallengeKind {
        self.challenge.kind()
    }

    /// Line to show after a failed attempt.
    #[must_use]
    pub fn failure_line(&self) -> &str {
        if self.dialogue.failure.is_empty() {
            "That didn't work out. Try again!"
        } else {
            &self.dialogue.failure
        }
    }
}

/// On-disk catalog document.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    version: SchemaVersion,
    quests: Vec<QuestDefinition>,
}

/// Collection of quest definitions, in authoring order.
#[derive(Debug, Clone, Default)]
pub struct QuestCatalog {
    quests: Vec<QuestDefinition>,
    index: HashMap<QuestId, usize>,
}

impl QuestCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from definitions, rejecting duplicates and dangling follow-ups.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = QuestDefinition>,
    ) -> CatalogResult<Self> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.register(definition)?;
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Registers a definition.
    pub fn register(&mut self, definition: QuestDefinition) -> CatalogResult<()> {
        if self.index.contains_key(&definition.id) {
            return Err(CatalogError::DuplicateId(definition.id));
        }
        debug!("Registered quest {}", definition.id);
        self.index.insert(definition.id.clone(), self.quests.len());
        self.quests.push(definition);
        Ok(())
    }

    /// Checks that every follow-up refers to a registered quest.
    pub fn validate(&self) -> CatalogResult<()> {
        for quest in &self.quests {
            if let Some(follow_up) = &quest.follow_up {
                if !self.contains(follow_up.as_str()) {
                    return Err(CatalogError::DanglingFollowUp {
                        quest: quest.id.clone(),
                        follow_up: follow_up.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Gets a definition.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&QuestDefinition> {
        self.index.get(id).map(|&i| &self.quests[i])
    }

    /// Returns whether the catalog holds this id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quests.len()
    }

    /// Returns true when the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Iterates definitions in authoring order.
    pub fn iter(&self) -> impl Iterator<Item = &QuestDefinition> {
        self.quests.iter()
    }

    /// Definitions offered by one NPC.
    pub fn for_npc<'a>(&'a self, npc: &'a str) -> impl Iterator<Item = &'a QuestDefinition> {
        self.quests.iter().filter(move |q| q.npc_id.as_str() == npc)
    }

    /// Parses a JSON catalog document.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        if !SchemaVersion::QUEST_CATALOG.can_read(&document.version) {
            return Err(CatalogError::UnsupportedVersion(document.version));
        }
        Self::from_definitions(document.quests)
    }

    /// Loads a JSON catalog document from disk.
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&contents)?;
        info!("Loaded {} quests from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Serializes the catalog to a JSON document.
    pub fn to_json_string(&self) -> CatalogResult<String> {
        let document = CatalogDocument {
            version: SchemaVersion::QUEST_CATALOG,
            quests: self.quests.clone(),
        };
        serde_json::to_string_pretty(&document).map_err(|e| CatalogError::Parse(e.to_string()))
    }
}
