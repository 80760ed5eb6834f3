//! Signal bus for notifying observers (UI, audio, analytics) of gameplay changes.

use crossbeam_channel::{bounded, Receiver, Sender};
use nquester_common::{AchievementId, ItemId, QuestId};
use serde::{Deserialize, Serialize};

use crate::random_event::EventEffect;

/// Named notifications emitted by the quest core. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameSignal {
    /// A quest became active
    QuestStarted {
        /// Quest ID
        quest_id: QuestId,
    },
    /// A quest completed and paid out
    QuestCompleted {
        /// Quest ID
        quest_id: QuestId,
        /// Currency granted
        currency: i64,
    },
    /// A quest attempt failed
    QuestFailed {
        /// Quest ID
        quest_id: QuestId,
    },
    /// An item was added to the inventory as a reward
    RewardItemGranted {
        /// Quest that granted the item
        quest_id: QuestId,
        /// Item granted
        item: ItemId,
    },
    /// A random event activated
    RandomEventTriggered {
        /// Event name
        name: String,
        /// Event effect
        effect: EventEffect,
    },
    /// An achievement unlocked
    AchievementUnlocked {
        /// Achievement ID
        achievement: AchievementId,
    },
}

impl GameSignal {
    /// Returns the signal name observers subscribe to.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::QuestStarted { .. } => "quest_started",
            Self::QuestCompleted { .. } => "quest_completed",
            Self::QuestFailed { .. } => "quest_failed",
            Self::RewardItemGranted { .. } => "reward_item_granted",
            Self::RandomEventTriggered { .. } => "random_event_triggered",
            Self::AchievementUnlocked { .. } => "achievement_unlocked",
        }
    }
}

/// Bounded signal bus. Publishing never blocks.
#[derive(Debug)]
pub struct SignalBus {
    /// Sender for publishing signals
    sender: Sender<GameSignal>,
    /// Receiver for collecting signals
    receiver: Receiver<GameSignal>,
    /// Channel capacity
    capacity: usize,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl SignalBus {
    /// Creates a new signal bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes a signal to the bus.
    pub fn publish(&self, signal: GameSignal) {
        publish(&self.sender, signal);
    }

    /// Drains all pending signals.
    pub fn drain(&self) -> Vec<GameSignal> {
        self.receiver.try_iter().collect()
    }

    /// Drains pending signals into a handler.
    pub fn dispatch(&self, handler: &mut dyn SignalHandler) -> usize {
        let mut count = 0;
        while let Ok(signal) = self.receiver.try_recv() {
            handler.handle(&signal);
            count += 1;
        }
        count
    }

    /// Returns the number of pending signals.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing signals.
    #[must_use]
    pub fn sender(&self) -> Sender<GameSignal> {
        self.sender.clone()
    }
}

/// Publishes on a sender handle, dropping the signal when the bus is full.
pub(crate) fn publish(sender: &Sender<GameSignal>, signal: GameSignal) {
    let _ = sender.try_send(signal);
}

/// Observer of game signals.
pub trait SignalHandler {
    /// Handles a signal.
    fn handle(&mut self, signal: &GameSignal);
}

/// Handler that records signal names, in order.
#[derive(Debug, Default)]
pub struct SignalLog {
    names: Vec<&'static str>,
}

impl SignalLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names seen so far.
    #[must_use]
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Number of signals with `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.names.iter().filter(|n| **n == name).count()
    }
}

impl SignalHandler for SignalLog {
    fn handle(&mut self, signal: &GameSignal) {
        self.names.push(signal.name());
    }
}
