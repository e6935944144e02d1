//! Services for the Pulse analytics feed
//!
//! This crate provides the simulated metrics broadcaster and the pieces it
//! is built from: the listener registry, the prediction generator and its
//! label catalog, query helpers, and configuration.

pub mod broadcaster;
pub mod catalog;
pub mod config;
pub mod generator;
pub mod listener;
pub mod query;

pub use broadcaster::MetricsBroadcaster;
pub use catalog::{Catalog, Matchup};
pub use config::{BroadcasterConfig, ConfigError};
pub use generator::PredictionGenerator;
pub use listener::{Listener, ListenerId, ListenerRegistry, NotifyReport, Subscription, SubscriptionGuard};
pub use query::{PredictionQuery, PredictionSummary};
