//! # nQuester Gameplay
//!
//! Quest, NPC and reward state machine for nQuester.
//!
//! This crate provides the engine-agnostic game core:
//! - Quest catalog and built-in content
//! - Quest manager (start / complete / fail transitions)
//! - NPCs with quest offers and retry dialogue
//! - Reward system with difficulty multipliers and item drops
//! - Progress tracking and achievements
//! - Challenge dispatch to external minigame providers
//! - Timer-driven random events
//! - Signal bus, snapshots and configuration
//! - Session orchestrator tying it all together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod achievements;
pub mod catalog;
pub mod challenge;
pub mod config;
pub mod content;
pub mod events;
pub mod humor;
pub mod npc;
pub mod player;
pub mod progress;
pub mod quest;
pub mod random_event;
pub mod reward;
pub mod save;
pub mod session;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::achievements::*;
    pub use crate::catalog::*;
    pub use crate::challenge::*;
    pub use crate::config::*;
    pub use crate::content::*;
    pub use crate::events::*;
    pub use crate::humor::*;
    pub use crate::npc::*;
    pub use crate::player::*;
    pub use crate::progress::*;
    pub use crate::quest::*;
    pub use crate::random_event::*;
    pub use crate::reward::*;
    pub use crate::save::*;
    pub use crate::session::*;
}

pub use prelude::*;
