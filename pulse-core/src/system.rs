//! Simulated system-wide metrics

use serde::{Deserialize, Serialize};

use crate::{FieldBounds, PulseResult};

/// Dashboard-wide metrics that drift on every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub coherence: f64,
    pub entanglement: f64,
    pub accuracy: f64,
    pub active_networks: u32,
    pub boost_enabled: bool,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            coherence: 97.5,
            entanglement: 92.0,
            accuracy: 94.2,
            active_networks: 48,
            boost_enabled: false,
        }
    }
}

impl SystemState {
    /// Return a copy with every numeric field clamped into `bounds`
    pub fn clamped(mut self, bounds: &SystemBounds) -> Self {
        self.coherence = bounds.coherence.clamp(self.coherence);
        self.entanglement = bounds.entanglement.clamp(self.entanglement);
        self.accuracy = bounds.accuracy.clamp(self.accuracy);
        self.active_networks = bounds.active_networks.clamp_count(self.active_networks as f64);
        self
    }

    pub fn is_within(&self, bounds: &SystemBounds) -> bool {
        bounds.coherence.contains(self.coherence)
            && bounds.entanglement.contains(self.entanglement)
            && bounds.accuracy.contains(self.accuracy)
            && bounds.active_networks.contains(self.active_networks as f64)
    }
}

/// Clamp ranges and step sizes for each [`SystemState`] field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemBounds {
    pub coherence: FieldBounds,
    pub entanglement: FieldBounds,
    pub accuracy: FieldBounds,
    pub active_networks: FieldBounds,
}

impl Default for SystemBounds {
    fn default() -> Self {
        Self {
            coherence: FieldBounds { min: 95.0, max: 99.99, step: 0.5 },
            entanglement: FieldBounds { min: 80.0, max: 99.9, step: 2.0 },
            accuracy: FieldBounds { min: 85.0, max: 99.5, step: 0.8 },
            active_networks: FieldBounds { min: 32.0, max: 64.0, step: 4.0 },
        }
    }
}

impl SystemBounds {
    pub fn validate(&self) -> PulseResult<()> {
        self.coherence.validate("coherence")?;
        self.entanglement.validate("entanglement")?;
        self.accuracy.validate("accuracy")?;
        self.active_networks.validate_count("active_networks")?;
        Ok(())
    }
}
