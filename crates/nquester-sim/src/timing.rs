//! Fixed timestep for the simulated update loop.
//!
//! Frames arrive with arbitrary simulated durations; the session is always
//! stepped with the same `fixed_dt` so runs are reproducible.

/// Default session tick (60 Hz).
pub const DEFAULT_FIXED_DT: f64 = 1.0 / 60.0;

/// Upper bound on catch-up steps per frame.
const MAX_UPDATES: u32 = 10;

/// Accumulator turning frame deltas into fixed steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Unconsumed time
    accumulator: f64,
    /// Step size
    fixed_dt: f64,
    /// Largest frame delta accepted
    max_dt: f64,
    /// Steps taken so far
    steps: u64,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_DT)
    }
}

impl FixedTimestep {
    /// Creates a timestep of `fixed_dt` seconds (minimum 1 ms).
    #[must_use]
    pub fn new(fixed_dt: f64) -> Self {
        let fixed_dt = fixed_dt.max(0.001);
        Self {
            accumulator: 0.0,
            fixed_dt,
            max_dt: fixed_dt * f64::from(MAX_UPDATES),
            steps: 0,
        }
    }

    /// Step size.
    #[must_use]
    pub const fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Total steps handed out.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated seconds covered by the steps handed out.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.steps() as f64 * self.fixed_dt
    }

    /// Accumulates a frame delta. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, dt: f64) -> u32 {
        // Clamp to prevent spiral of death
        self.accumulator += dt.clamp(0.0, self.max_dt);

        let mut count = 0;
        while self.accumulator >= self.fixed_dt && count < MAX_UPDATES {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.steps += u64::from(count);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_whole_steps() {
        let mut timestep = FixedTimestep::new(0.5);
        assert_eq!(timestep.accumulate(0.25), 0);
        assert_eq!(timestep.accumulate(0.25), 1);
        assert_eq!(timestep.accumulate(1.0), 2);
        assert_eq!(timestep.steps(), 3);
        assert!((timestep.elapsed() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_huge_frame_is_clamped() {
        let mut timestep = FixedTimestep::new(0.1);
        let steps = timestep.accumulate(1_000.0);
        assert!(steps <= MAX_UPDATES);
    }

    #[test]
    fn test_negative_frame_ignored() {
        let mut timestep = FixedTimestep::default();
        assert_eq!(timestep.accumulate(-1.0), 0);
        assert_eq!(timestep.steps(), 0);
    }

    #[test]
    fn test_minimum_step() {
        let timestep = FixedTimestep::new(0.0);
        assert!((timestep.fixed_dt() - 0.001).abs() < f64::EPSILON);
    }
}
