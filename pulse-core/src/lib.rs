//! Core types for the Pulse analytics feed
//!
//! This crate defines the shared data structures used across the feed,
//! including prediction records, the simulated system state, and the
//! snapshot and stream message types handed to consumers.

pub mod bounds;
pub mod error;
pub mod prediction;
pub mod snapshot;
pub mod system;
pub mod websocket;

pub use bounds::FieldBounds;
pub use error::{PulseError, PulseResult};
pub use prediction::{Prediction, PredictionMetadata, PredictionState};
pub use snapshot::{Snapshot, UpdateCause};
pub use system::{SystemBounds, SystemState};
pub use websocket::{ClientMessage, ServerMessage};
