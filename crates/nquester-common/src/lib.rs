//! # nQuester Common
//!
//! Shared types for the nQuester quest core.
//!
//! This crate provides foundational types used by gameplay and tooling:
//! - ID types (QuestId, NpcId, ItemId, AchievementId)
//! - The `Dice` randomness seam
//! - Version information for snapshot schemas
//! - Common error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod dice;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dice::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
