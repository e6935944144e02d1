//! Point-in-time copies of the feed handed to readers and subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Prediction, SystemState};

/// What produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCause {
    /// Delivered to a new subscriber on registration
    Initial,
    PredictionTick,
    NetworkTick,
    BoostToggled,
    /// Synchronous read, no mutation happened
    Requested,
}

/// Immutable copy of the prediction list and system state
///
/// `sequence` increases with every mutation, so consumers receiving
/// snapshots from both timers can discard stale ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sequence: u64,
    pub cause: UpdateCause,
    pub taken_at: DateTime<Utc>,
    /// Newest first
    pub predictions: Vec<Prediction>,
    pub system: SystemState,
}

impl Snapshot {
    pub fn prediction_count(&self) -> usize {
        self.predictions.len()
    }
}
