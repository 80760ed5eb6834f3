//! Session snapshots for persistence.
//!
//! The snapshot is a flat, serializable picture of everything a session needs
//! to resume: currency, inventory, quest lists, NPC flags and achievement
//! flags. Random events are never persisted. Two encodings are provided: JSON
//! for inspection and a compact binary form with a magic header.

use nquester_common::{
    AchievementId, ItemId, MagicBytes, NpcId, NquesterError, QuestId, SchemaVersion,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::achievements::NO_FASTEST_TIME;

/// Errors that can occur during snapshot encoding and decoding.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid magic bytes
    #[error("Invalid snapshot format")]
    InvalidFormat,

    /// Version mismatch
    #[error("Incompatible snapshot version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: SchemaVersion,
        /// Found version
        found: SchemaVersion,
    },

    /// Snapshot corrupted
    #[error("Snapshot corrupted: {0}")]
    Corrupted(String),
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

impl From<SnapshotError> for NquesterError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Io(e) => NquesterError::Io(e),
            SnapshotError::VersionMismatch { expected, found } => NquesterError::VersionMismatch {
                expected: expected.to_string(),
                actual: found.to_string(),
            },
            other => NquesterError::Serialization(other.to_string()),
        }
    }
}

/// Saved quest outcome mirror of one NPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcFlags {
    /// Quest the NPC holds
    pub quest_id: Option<QuestId>,
    /// Quest done
    pub completed: bool,
    /// Last attempt failed
    pub failed: bool,
    /// Player has talked to this NPC
    #[serde(default)]
    pub met: bool,
}

/// Serializable session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Format version
    pub version: SchemaVersion,
    /// Currency
    pub currency: i64,
    /// Item id to count
    pub inventory: BTreeMap<ItemId, u32>,
    /// Active quest ids, in start order
    pub active_quests: Vec<QuestId>,
    /// Completed quest ids, in completion order
    pub completed_quests: Vec<QuestId>,
    /// Per-NPC flags
    pub npcs: BTreeMap<NpcId, NpcFlags>,
    /// Achievement unlock flags
    pub achievements: BTreeMap<AchievementId, bool>,
    /// Bugs found so far
    #[serde(default)]
    pub bugs_found: u32,
    /// Quests completed on the first attempt
    #[serde(default)]
    pub perfect_quests: u32,
    /// Fastest timed completion in seconds
    #[serde(default = "no_fastest_time")]
    pub fastest_quest_time: f64,
}

const fn no_fastest_time() -> f64 {
    NO_FASTEST_TIME
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            version: SchemaVersion::SNAPSHOT,
            currency: 0,
            inventory: BTreeMap::new(),
            active_quests: Vec::new(),
            completed_quests: Vec::new(),
            npcs: BTreeMap::new(),
            achievements: BTreeMap::new(),
            bugs_found: 0,
            perfect_quests: 0,
            fastest_quest_time: NO_FASTEST_TIME,
        }
    }
}

impl SessionSnapshot {
    fn check_version(&self) -> SnapshotResult<()> {
        if SchemaVersion::SNAPSHOT.can_read(&self.version) {
            Ok(())
        } else {
            Err(SnapshotError::VersionMismatch {
                expected: SchemaVersion::SNAPSHOT,
                found: self.version,
            })
        }
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> SnapshotResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    /// Deserializes from JSON.
    pub fn from_json(json: &str) -> SnapshotResult<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| SnapshotError::Corrupted(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Serializes to binary format.
    pub fn to_bytes(&self) -> SnapshotResult<Vec<u8>> {
        let mut buffer = Vec::new();

        // Write magic bytes
        buffer.extend_from_slice(&MagicBytes::SNAPSHOT.bytes());

        let data =
            bincode::serialize(self).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        buffer.extend(data);

        Ok(buffer)
    }

    /// Deserializes from binary format.
    pub fn from_bytes(bytes: &[u8]) -> SnapshotResult<Self> {
        if !MagicBytes::SNAPSHOT.matches(bytes) {
            return Err(SnapshotError::InvalidFormat);
        }

        let snapshot: Self =
            bincode::deserialize(&bytes[4..]).map_err(|e| SnapshotError::Corrupted(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Writes the binary form to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SnapshotResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes()?)?;
        info!("Saved snapshot to {}", path.display());
        Ok(())
    }

    /// Reads the binary form from a file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> SnapshotResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let snapshot = Self::from_bytes(&bytes)?;
        info!("Loaded snapshot from {}", path.display());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            currency: 1_250,
            completed_quests: vec![QuestId::new("quest_alikhan_01")],
            active_quests: vec![QuestId::new("quest_student_book")],
            bugs_found: 3,
            perfect_quests: 1,
            fastest_quest_time: 4.5,
            ..SessionSnapshot::default()
        };
        snapshot.inventory.insert(ItemId::new("coffee"), 2);
        snapshot.npcs.insert(
            NpcId::new("Alikhan"),
            NpcFlags {
                quest_id: Some(QuestId::new("quest_alikhan_01")),
                completed: true,
                failed: false,
                met: true,
            },
        );
        snapshot
            .achievements
            .insert(AchievementId::new("first_quest"), true);
        snapshot
    }

    #[test]
    fn test_json_shape() {
        let json = sample().to_json().expect("serialize should succeed");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["currency"], 1_250);
        assert_eq!(value["inventory"]["coffee"], 2);
        assert_eq!(value["completed_quests"][0], "quest_alikhan_01");
        assert_eq!(value["npcs"]["Alikhan"]["completed"], true);
        assert_eq!(value["perfect_quests"], 1);
        assert_eq!(value["fastest_quest_time"], 4.5);

        let back = SessionSnapshot::from_json(&json).expect("deserialize should succeed");
        assert_eq!(back, sample());
    }

    #[test]
    fn test_binary_magic_checked() {
        let mut bytes = sample().to_bytes().expect("serialize should succeed");
        assert_eq!(&bytes[..4], b"NQSV");

        bytes[0] = b'X';
        assert!(matches!(
            SessionSnapshot::from_bytes(&bytes),
            Err(SnapshotError::InvalidFormat)
        ));
        assert!(matches!(
            SessionSnapshot::from_bytes(b"NQ"),
            Err(SnapshotError::InvalidFormat)
        ));
    }

    #[test]
    fn test_binary_truncated_is_corrupted() {
        let bytes = sample().to_bytes().expect("serialize should succeed");
        let result = SessionSnapshot::from_bytes(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(SnapshotError::Corrupted(_))));
    }

    #[test]
    fn test_future_major_version_rejected() {
        let snapshot = SessionSnapshot {
            version: SchemaVersion::new(2, 0, 0),
            ..sample()
        };
        let json = snapshot.to_json().expect("serialize should succeed");
        assert!(matches!(
            SessionSnapshot::from_json(&json),
            Err(SnapshotError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("saves").join("slot1.nqs");
        sample().save_to(&path).expect("save should succeed");
        let loaded = SessionSnapshot::load_from(&path).expect("load should succeed");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{
            "version": { "major": 1, "minor": 0, "patch": 0 },
            "currency": 5,
            "inventory": {},
            "active_quests": [],
            "completed_quests": [],
            "npcs": { "Gaziz": { "quest_id": null, "completed": false, "failed": true } },
            "achievements": {}
        }"#;
        let snapshot = SessionSnapshot::from_json(json).expect("deserialize should succeed");
        assert_eq!(snapshot.bugs_found, 0);
        assert_eq!(snapshot.perfect_quests, 0);
        assert!((snapshot.fastest_quest_time - NO_FASTEST_TIME).abs() < f64::EPSILON);
        assert!(!snapshot.npcs["Gaziz"].met);
    }
}
