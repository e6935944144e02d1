//! Prediction records produced by the simulated feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FieldBounds;

/// Lifecycle of a prediction's (purely cosmetic) signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionState {
    Entangled,
    Coherent,
    Collapsed,
}

impl PredictionState {
    pub const ALL: [PredictionState; 3] = [
        PredictionState::Entangled,
        PredictionState::Coherent,
        PredictionState::Collapsed,
    ];

    /// Next state in the entangled -> coherent -> collapsed progression
    ///
    /// Collapsed is terminal.
    pub fn advance(self) -> Self {
        match self {
            PredictionState::Entangled => PredictionState::Coherent,
            PredictionState::Coherent | PredictionState::Collapsed => PredictionState::Collapsed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionState::Entangled => "entangled",
            PredictionState::Coherent => "coherent",
            PredictionState::Collapsed => "collapsed",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "entangled" => Some(PredictionState::Entangled),
            "coherent" => Some(PredictionState::Coherent),
            "collapsed" => Some(PredictionState::Collapsed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PredictionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bounded flavor metrics attached to every prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetadata {
    /// Risk score in [0, 1]
    pub risk: f64,
    /// Momentum in [-1, 1]
    pub momentum: f64,
    /// Historical accuracy in [0, 1]
    pub accuracy: f64,
}

impl PredictionMetadata {
    pub const RISK: FieldBounds = FieldBounds { min: 0.0, max: 1.0, step: 0.0 };
    pub const MOMENTUM: FieldBounds = FieldBounds { min: -1.0, max: 1.0, step: 0.0 };
    pub const ACCURACY: FieldBounds = FieldBounds { min: 0.0, max: 1.0, step: 0.0 };

    /// Build metadata, clamping every field into its range
    pub fn clamped(risk: f64, momentum: f64, accuracy: f64) -> Self {
        Self {
            risk: Self::RISK.clamp(risk),
            momentum: Self::MOMENTUM.clamp(momentum),
            accuracy: Self::ACCURACY.clamp(accuracy),
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        Self::RISK.contains(self.risk)
            && Self::MOMENTUM.contains(self.momentum)
            && Self::ACCURACY.contains(self.accuracy)
    }
}

/// A single simulated prediction shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Unique identifier, e.g. `pred-42`
    pub id: String,
    pub sport: String,
    pub game: String,
    pub player: String,
    /// Free-form prediction text, e.g. "Over 27.5 points"
    pub prediction: String,
    /// Confidence percentage in [0, 100]
    pub confidence: f64,
    /// Signal strength in [0, 1]
    pub signal: f64,
    pub state: PredictionState,
    pub metadata: PredictionMetadata,
    pub created_at: DateTime<Utc>,
}

impl Prediction {
    /// Drift step applied to confidence on every prediction tick
    pub const CONFIDENCE: FieldBounds = FieldBounds { min: 0.0, max: 100.0, step: 2.0 };
    /// Drift step applied to signal on every prediction tick
    pub const SIGNAL: FieldBounds = FieldBounds { min: 0.0, max: 1.0, step: 0.05 };

    /// Check the confidence, signal and metadata ranges
    pub fn is_within_bounds(&self) -> bool {
        Self::CONFIDENCE.contains(self.confidence)
            && Self::SIGNAL.contains(self.signal)
            && self.metadata.is_within_bounds()
    }

    /// Case-insensitive sport match
    pub fn is_sport(&self, sport: &str) -> bool {
        self.sport.eq_ignore_ascii_case(sport)
    }
}
