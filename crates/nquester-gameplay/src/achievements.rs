//! Achievements evaluated against flat game statistics.

use nquester_common::AchievementId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Sentinel for "no quest timed yet".
pub const NO_FASTEST_TIME: f64 = 999.0;

/// Flat statistics recomputed every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    /// Completed quests
    pub completed_quests: u32,
    /// Completed Swift quests
    pub swift_quests: u32,
    /// Completed AI quests
    pub ai_quests: u32,
    /// Completed TypeScript quests
    pub typescript_quests: u32,
    /// Bugs squashed in challenges
    pub bugs_found: u32,
    /// Current currency
    pub users: i64,
    /// Fastest completion in seconds
    pub fastest_quest_time: f64,
    /// Quests completed on the first attempt
    pub perfect_quests: u32,
    /// Mentors talked to
    pub mentors_met: u32,
}

impl Default for GameStats {
    fn default() -> Self {
        Self {
            completed_quests: 0,
            swift_quests: 0,
            ai_quests: 0,
            typescript_quests: 0,
            bugs_found: 0,
            users: 0,
            fastest_quest_time: NO_FASTEST_TIME,
            perfect_quests: 0,
            mentors_met: 0,
        }
    }
}

impl GameStats {
    /// Stats as a flat key/value map.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("completed_quests", f64::from(self.completed_quests)),
            ("swift_quests", f64::from(self.swift_quests)),
            ("ai_quests", f64::from(self.ai_quests)),
            ("typescript_quests", f64::from(self.typescript_quests)),
            ("bugs_found", f64::from(self.bugs_found)),
            ("users", self.users as f64),
            ("fastest_quest_time", self.fastest_quest_time),
            ("perfect_quests", f64::from(self.perfect_quests)),
            ("mentors_met", f64::from(self.mentors_met)),
        ])
    }
}

/// Static achievement definition.
#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    /// Stable key
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Display description
    pub description: &'static str,
    /// Unlock condition
    pub condition: fn(&GameStats) -> bool,
}

/// All achievements.
pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_quest",
        name: "First Step",
        description: "Complete your first quest",
        condition: |s| s.completed_quests >= 1,
    },
    AchievementDef {
        id: "swift_master",
        name: "Swift Master",
        description: "Complete 3 Swift quests",
        condition: |s| s.swift_quests >= 3,
    },
    AchievementDef {
        id: "ai_expert",
        name: "AI Expert",
        description: "Complete 5 AI quests",
        condition: |s| s.ai_quests >= 5,
    },
    AchievementDef {
        id: "typescript_guru",
        name: "TypeScript Guru",
        description: "Complete 3 TypeScript quests",
        condition: |s| s.typescript_quests >= 3,
    },
    AchievementDef {
        id: "debug_master",
        name: "Debug Master",
        description: "Find 10 bugs",
        condition: |s| s.bugs_found >= 10,
    },
    AchievementDef {
        id: "user_magnet",
        name: "User Magnet",
        description: "Reach 5000 users",
        condition: |s| s.users >= 5000,
    },
    AchievementDef {
        id: "quest_hunter",
        name: "Quest Hunter",
        description: "Complete 10 quests",
        condition: |s| s.completed_quests >= 10,
    },
    AchievementDef {
        id: "speed_runner",
        name: "Speed Runner",
        description: "Complete a quest in under 5 seconds",
        condition: |s| s.fastest_quest_time < 5.0,
    },
    AchievementDef {
        id: "perfectionist",
        name: "Perfectionist",
        description: "Complete a quest on the first try",
        condition: |s| s.perfect_quests >= 1,
    },
    AchievementDef {
        id: "mentor_friend",
        name: "Mentor Friend",
        description: "Talk to 8 mentors",
        condition: |s| s.mentors_met >= 8,
    },
];

/// Looks up an achievement definition.
#[must_use]
pub fn achievement(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|def| def.id == id)
}

/// Unlock flags for every achievement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementBook {
    unlocked: BTreeMap<AchievementId, bool>,
}

impl Default for AchievementBook {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementBook {
    /// Creates a book with everything locked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            unlocked: ACHIEVEMENTS
                .iter()
                .map(|def| (AchievementId::new(def.id), false))
                .collect(),
        }
    }

    /// Evaluates every locked achievement. Returns the newly unlocked ones.
    pub fn update(&mut self, stats: &GameStats) -> Vec<AchievementId> {
        let mut newly = Vec::new();
        for def in ACHIEVEMENTS {
            let Some(flag) = self.unlocked.get_mut(def.id) else {
                continue;
            };
            if !*flag && (def.condition)(stats) {
                *flag = true;
                info!("Achievement unlocked: {}", def.name);
                newly.push(AchievementId::new(def.id));
            }
        }
        newly
    }

    /// Returns whether an achievement is unlocked.
    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.get(id).copied().unwrap_or(false)
    }

    /// Number of unlocked achievements.
    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.unlocked.values().filter(|v| **v).count()
    }

    /// All flags.
    #[must_use]
    pub const fn flags(&self) -> &BTreeMap<AchievementId, bool> {
        &self.unlocked
    }

    /// Restores saved flags. Unknown keys are ignored; missing keys stay locked.
    pub fn restore(&mut self, flags: &BTreeMap<AchievementId, bool>) {
        for (id, unlocked) in flags {
            if let Some(flag) = self.unlocked.get_mut(id) {
                *flag = *unlocked;
            }
        }
    }
}
