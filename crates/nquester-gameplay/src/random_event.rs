//! Timer-driven random events that modify the game for a while.
//!
//! Every `interval` seconds one event is drawn from the pool and activated.
//! Currency effects apply once, at activation, by whoever owns the player.
//! Active events are pruned once `now - started_at >= duration`. Events may
//! overlap and are never persisted.

use nquester_common::Dice;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default seconds between random events.
pub const DEFAULT_EVENT_INTERVAL: f64 = 60.0;

/// What an event does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventEffect {
    /// One-off currency bonus (positive) or penalty (negative)
    Currency(i64),
    /// Bug hunt in progress, no currency change
    BugHunt,
}

impl EventEffect {
    /// Currency delta to apply at activation.
    #[must_use]
    pub const fn currency_delta(self) -> i64 {
        match self {
            Self::Currency(delta) => delta,
            Self::BugHunt => 0,
        }
    }
}

/// Definition of a random event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEventDef {
    /// Event name
    pub name: String,
    /// Flavour text
    pub description: String,
    /// Effect
    pub effect: EventEffect,
    /// Seconds the event stays active
    pub duration_secs: f64,
}

impl RandomEventDef {
    /// Creates an event definition.
    #[must_use]
    pub fn new(name: &str, description: &str, effect: EventEffect, duration_secs: f64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            effect,
            duration_secs,
        }
    }
}

/// The built-in event pool.
#[must_use]
pub fn default_events() -> Vec<RandomEventDef> {
    vec![
        RandomEventDef::new(
            "Investor arrived",
            "An investor wants to see your project!",
            EventEffect::Currency(300),
            30.0,
        ),
        RandomEventDef::new(
            "Server crashed",
            "The server is down! Users are leaving!",
            EventEffect::Currency(-100),
            15.0,
        ),
        RandomEventDef::new(
            "Viral trend",
            "Your project went viral!",
            EventEffect::Currency(500),
            45.0,
        ),
        RandomEventDef::new(
            "Hacker attack",
            "Hackers are after your code! Find the bugs!",
            EventEffect::BugHunt,
            20.0,
        ),
        RandomEventDef::new(
            "Developer conference",
            "You were invited to speak at a conference!",
            EventEffect::Currency(400),
            60.0,
        ),
    ]
}

/// An activated event.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEvent {
    /// Definition
    pub def: RandomEventDef,
    /// Manager clock at activation
    pub started_at: f64,
}

impl ActiveEvent {
    /// Seconds left at `now`, never negative.
    #[must_use]
    pub fn remaining(&self, now: f64) -> f64 {
        (self.def.duration_secs - (now - self.started_at)).max(0.0)
    }

    /// Returns whether the event has run its course at `now`.
    #[must_use]
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.started_at >= self.def.duration_secs
    }
}

/// Drives random events off an internal clock.
#[derive(Debug, Clone)]
pub struct EventManager {
    pool: Vec<RandomEventDef>,
    active: Vec<ActiveEvent>,
    interval: f64,
    timer: f64,
    clock: f64,
    enabled: bool,
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_INTERVAL)
    }
}

impl EventManager {
    /// Creates a manager with the built-in pool.
    #[must_use]
    pub fn new(interval: f64) -> Self {
        Self {
            pool: default_events(),
            active: Vec::new(),
            interval: interval.max(f64::EPSILON),
            timer: 0.0,
            clock: 0.0,
            enabled: true,
        }
    }

    /// Replaces the event pool.
    #[must_use]
    pub fn with_pool(mut self, pool: Vec<RandomEventDef>) -> Self {
        self.pool = pool;
        self
    }

    /// Enables or disables event triggering. Active events still expire.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns whether triggering is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Seconds between events.
    #[must_use]
    pub const fn interval(&self) -> f64 {
        self.interval
    }

    /// Manager clock in seconds.
    #[must_use]
    pub const fn clock(&self) -> f64 {
        self.clock
    }

    /// Advances time by `dt` seconds.
    ///
    /// Returns the event activated this step, if any. The caller applies its
    /// currency delta.
    pub fn update(&mut self, dt: f64, dice: &mut dyn Dice) -> Option<RandomEventDef> {
        self.clock += dt.max(0.0);
        self.prune();

        if !self.enabled {
            return None;
        }

        self.timer += dt.max(0.0);
        if self.timer >= self.interval {
            self.timer = 0.0;
            return self.trigger(dice);
        }
        None
    }

    /// Activates a random event immediately.
    pub fn trigger(&mut self, dice: &mut dyn Dice) -> Option<RandomEventDef> {
        if self.pool.is_empty() {
            return None;
        }
        let def = self.pool.get(dice.pick(self.pool.len()))?.clone();
        info!("Random event: {} ({})", def.name, def.description);
        self.active.push(ActiveEvent {
            def: def.clone(),
            started_at: self.clock,
        });
        Some(def)
    }

    fn prune(&mut self) {
        let now = self.clock;
        self.active.retain(|event| {
            let expired = event.is_expired(now);
            if expired {
                debug!("Random event expired: {}", event.def.name);
            }
            !expired
        });
    }

    /// Currently active events.
    #[must_use]
    pub fn active_events(&self) -> &[ActiveEvent] {
        &self.active
    }

    /// Name and remaining seconds of each active event.
    #[must_use]
    pub fn countdown(&self) -> Vec<(&str, f64)> {
        self.active
            .iter()
            .map(|event| (event.def.name.as_str(), event.remaining(self.clock)))
            .collect()
    }

    /// Returns whether a bug hunt is running.
    #[must_use]
    pub fn bug_hunt_active(&self) -> bool {
        self.active
            .iter()
            .any(|event| event.def.effect == EventEffect::BugHunt)
    }
}
