//! ID types for quests, NPCs, items and achievements.
//!
//! Content is authored with string keys (`"quest_alikhan_01"`, `"Alikhan"`,
//! `"coffee"`), so every ID here is a thin newtype over `String`. The
//! newtypes keep a quest id from being passed where an item id is expected.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw string key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the ID and returns the raw string key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Unique identifier for a quest definition.
    QuestId
);

string_id!(
    /// Unique identifier for an NPC (its display name doubles as the key).
    NpcId
);

string_id!(
    /// Unique identifier for an inventory item.
    ItemId
);

string_id!(
    /// Unique identifier for an achievement.
    AchievementId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_quest_id_display() {
        let id = QuestId::new("quest_alikhan_01");
        assert_eq!(id.to_string(), "quest_alikhan_01");
        assert_eq!(id.as_str(), "quest_alikhan_01");
    }

    #[test]
    fn test_id_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(ItemId::new("coffee"), 2_u32);

        // Lookup by &str works through Borrow<str>
        assert_eq!(map.get("coffee"), Some(&2));
    }

    #[test]
    fn test_id_conversions() {
        let from_str: NpcId = "Alikhan".into();
        let from_string: NpcId = String::from("Alikhan").into();
        assert_eq!(from_str, from_string);
        assert_eq!(from_str.into_inner(), "Alikhan");
    }

    #[test]
    fn test_id_ordering_is_lexical() {
        let mut ids = vec![QuestId::new("q2"), QuestId::new("q10"), QuestId::new("q1")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "q1");
        assert_eq!(ids[1].as_str(), "q10");
    }
}
