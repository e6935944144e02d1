//! Broadcaster configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use pulse_core::{PulseError, SystemBounds, SystemState};

use crate::catalog::Catalog;

/// Configuration for the metrics broadcaster
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// How often predictions are generated/pruned and the float metrics drift
    pub prediction_interval: Duration,
    /// How often the active network count drifts
    pub network_interval: Duration,
    /// Maximum number of predictions kept (oldest dropped first)
    pub max_predictions: usize,
    /// Number of predictions generated at construction
    pub initial_predictions: usize,
    /// Chance of a new prediction on each prediction tick
    pub spawn_probability: f64,
    /// Chance an existing prediction advances its state on each prediction tick
    pub state_advance_probability: f64,
    /// Fixed RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
    pub bounds: SystemBounds,
    pub initial_state: SystemState,
    pub catalog: Catalog,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            prediction_interval: Duration::from_secs(5),
            network_interval: Duration::from_secs(2),
            max_predictions: 10,
            initial_predictions: 5,
            spawn_probability: 0.3,
            state_advance_probability: 0.1,
            seed: None,
            bounds: SystemBounds::default(),
            initial_state: SystemState::default(),
            catalog: Catalog::default(),
        }
    }
}

impl BroadcasterConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// Reads:
    /// - PULSE_PREDICTION_INTERVAL_MS
    /// - PULSE_NETWORK_INTERVAL_MS
    /// - PULSE_MAX_PREDICTIONS
    /// - PULSE_INITIAL_PREDICTIONS
    /// - PULSE_SPAWN_PROBABILITY
    /// - PULSE_SEED
    /// - PULSE_CATALOG_PATH: JSON file replacing the built-in labels
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>("PULSE_PREDICTION_INTERVAL_MS")? {
            config.prediction_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>("PULSE_NETWORK_INTERVAL_MS")? {
            config.network_interval = Duration::from_millis(ms);
        }
        if let Some(max) = parse_var("PULSE_MAX_PREDICTIONS")? {
            config.max_predictions = max;
        }
        if let Some(initial) = parse_var("PULSE_INITIAL_PREDICTIONS")? {
            config.initial_predictions = initial;
        }
        if let Some(p) = parse_var("PULSE_SPAWN_PROBABILITY")? {
            config.spawn_probability = p;
        }
        config.seed = parse_var("PULSE_SEED")?;
        if let Ok(path) = env::var("PULSE_CATALOG_PATH") {
            config.catalog = Catalog::from_file(&path)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check intervals, probabilities, capacity, bounds and catalog
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prediction_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("prediction_interval"));
        }
        if self.network_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("network_interval"));
        }
        if self.max_predictions == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        check_probability("spawn_probability", self.spawn_probability)?;
        check_probability("state_advance_probability", self.state_advance_probability)?;
        self.bounds.validate()?;
        self.catalog.validate()?;
        Ok(())
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidProbability { field, value });
    }
    Ok(())
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidVar {
                name: name.to_string(),
                error: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {error}")]
    InvalidVar { name: String, error: String },

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("max_predictions must be greater than zero")]
    ZeroCapacity,

    #[error("{field} must be within [0, 1], got {value}")]
    InvalidProbability { field: &'static str, value: f64 },

    #[error(transparent)]
    Core(#[from] PulseError),
}
