//! Clamped numeric ranges and bounded random perturbation

use serde::{Deserialize, Serialize};

use crate::{PulseError, PulseResult};

/// A closed `[min, max]` range plus the width of a single perturbation step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
    /// Full width of one random delta; a draw lands in `[-step/2, step/2)`
    pub step: f64,
}

impl FieldBounds {
    /// Create bounds, rejecting non-finite values, `min > max` and negative steps
    pub fn new(field: &str, min: f64, max: f64, step: f64) -> PulseResult<Self> {
        let bounds = Self { min, max, step };
        bounds.validate(field)?;
        Ok(bounds)
    }

    /// Check that these bounds describe a usable range
    pub fn validate(&self, field: &str) -> PulseResult<()> {
        let finite = self.min.is_finite() && self.max.is_finite() && self.step.is_finite();
        if !finite || self.min > self.max || self.step < 0.0 {
            return Err(PulseError::invalid_bounds(field, self.min, self.max, self.step));
        }
        Ok(())
    }

    /// Constrain a value to `[min, max]`
    ///
    /// NaN collapses to `min` so a bad input can never escape the range.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Apply one perturbation step given a uniform sample in `[0, 1)`
    ///
    /// `new = clamp(old + (sample - 0.5) * step, min, max)`
    pub fn perturb(&self, value: f64, sample: f64) -> f64 {
        self.clamp(value + (sample - 0.5) * self.step)
    }

    /// Check that these bounds describe a usable range of `u32` counts
    ///
    /// On top of [`validate`](Self::validate), the range must be non-negative,
    /// fit in a `u32`, and contain at least one integer.
    pub fn validate_count(&self, field: &str) -> PulseResult<()> {
        self.validate(field)?;
        if self.min < 0.0 || self.max > u32::MAX as f64 || self.min.ceil() > self.max.floor() {
            return Err(PulseError::invalid_bounds(field, self.min, self.max, self.step));
        }
        Ok(())
    }

    /// Constrain a count to the integers inside `[min, max]`
    pub fn clamp_count(&self, value: f64) -> u32 {
        let low = self.min.ceil().max(0.0);
        let high = self.max.floor().min(u32::MAX as f64).max(low);
        if value.is_nan() {
            return low as u32;
        }
        value.round().clamp(low, high) as u32
    }

    /// Integer variant of [`perturb`](Self::perturb), rounding before the clamp
    pub fn perturb_count(&self, value: u32, sample: f64) -> u32 {
        self.clamp_count(value as f64 + (sample - 0.5) * self.step)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}
