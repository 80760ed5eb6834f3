//! Random number source abstraction.
//!
//! Reward drops, NPC flavour lines and random events all need randomness.
//! Gameplay code takes `&mut dyn Dice` so tests can script exact rolls and
//! the runtime can plug in a seeded [`fastrand::Rng`].

/// A source of uniform random values.
pub trait Dice {
    /// Returns a uniform value in `[0.0, 1.0)`.
    fn roll(&mut self) -> f32;

    /// Returns a uniform index in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl Dice for fastrand::Rng {
    fn roll(&mut self) -> f32 {
        self.f32()
    }

    fn pick(&mut self, len: usize) -> usize {
        self.usize(..len)
    }
}

/// Deterministic dice that replays a fixed sequence of rolls.
///
/// Rolls cycle when the script is exhausted. Picks are derived from the next
/// roll so both channels stay in lockstep.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: Vec<f32>,
    cursor: usize,
}

impl ScriptedDice {
    /// Creates dice that replay `rolls` in order.
    ///
    /// An empty script always rolls `0.0`.
    #[must_use]
    pub fn new(rolls: impl Into<Vec<f32>>) -> Self {
        Self {
            rolls: rolls.into(),
            cursor: 0,
        }
    }

    /// Dice that always return the same value.
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }

    fn next(&mut self) -> f32 {
        if self.rolls.is_empty() {
            return 0.0;
        }
        let value = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        value.clamp(0.0, 0.999_999)
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self) -> f32 {
        self.next()
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let idx = (self.next() * len as f32) as usize;
        idx.min(len - 1)
    }
}
