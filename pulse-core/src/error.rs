//! Error types for the feed

use thiserror::Error;

/// Feed-wide error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PulseError {
    #[error("Invalid bounds for {field}: min={min}, max={max}, step={step}")]
    InvalidBounds {
        field: String,
        min: f64,
        max: f64,
        step: f64,
    },

    #[error("Invalid catalog: {0}")]
    Catalog(String),
}

impl PulseError {
    pub fn invalid_bounds(field: impl Into<String>, min: f64, max: f64, step: f64) -> Self {
        PulseError::InvalidBounds {
            field: field.into(),
            min,
            max,
            step,
        }
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        PulseError::Catalog(msg.into())
    }
}

/// Result type alias for feed operations
pub type PulseResult<T> = Result<T, PulseError>;
