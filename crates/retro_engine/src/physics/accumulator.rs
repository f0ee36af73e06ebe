//! Fixed-timestep accumulator
//!
//! Frame time goes in, a whole number of constant simulation steps comes out.
//! The fractional remainder carries over to the next frame.

use log::warn;

/// Converts variable frame deltas into fixed simulation steps
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f64,
    max_substeps: u32,
    accumulator: f64,
}

impl FixedTimestep {
    /// `step` seconds per simulation step, at most `max_substeps` per frame
    #[must_use]
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step: f64::from(step),
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    /// Step length in seconds
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn step(&self) -> f32 {
        self.step as f32
    }

    /// Time waiting in the accumulator, always below one step after `advance`
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn remainder(&self) -> f32 {
        self.accumulator as f32
    }

    /// Fraction of a step waiting in the accumulator, for interpolation
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step) as f32
    }

    /// Add `dt` seconds and call `step_fn` once per whole step available.
    /// Returns the number of steps taken.
    pub fn advance(&mut self, dt: f32, mut step_fn: impl FnMut()) -> u32 {
        self.accumulator += f64::from(dt.max(0.0));

        let mut steps = 0;
        while self.accumulator >= self.step {
            if steps == self.max_substeps {
                let dropped = self.accumulator - self.accumulator % self.step;
                warn!(
                    "Physics fell behind: dropping {dropped:.4}s after {steps} substeps"
                );
                self.accumulator %= self.step;
                break;
            }
            step_fn();
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }
}
