//! Random prediction generation and per-tick drift

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use pulse_core::{Prediction, PredictionMetadata, PredictionState, PulseResult};
use rand::Rng;

use crate::catalog::Catalog;

/// Range new predictions draw their confidence from
const CONFIDENCE_RANGE: std::ops::RangeInclusive<f64> = 70.0..=99.0;

/// Builds predictions from catalog labels
#[derive(Debug)]
pub struct PredictionGenerator {
    catalog: Catalog,
    next_id: AtomicU64,
}

impl PredictionGenerator {
    /// Create a generator, validating the catalog up front
    pub fn new(catalog: Catalog) -> PulseResult<Self> {
        catalog.validate()?;
        Ok(Self {
            catalog,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Generate one prediction with a fresh identifier
    pub fn generate<R: Rng>(&self, rng: &mut R, now: DateTime<Utc>) -> Prediction {
        let matchup = pick(rng, &self.catalog.matchups);
        let player = pick(rng, &matchup.players);
        let text = pick(rng, &self.catalog.predictions);
        let state = *pick(rng, &PredictionState::ALL);

        let id = format!("pred-{}", self.next_id.fetch_add(1, Ordering::Relaxed));

        Prediction {
            id,
            sport: matchup.sport.clone(),
            game: matchup.game.clone(),
            player: player.clone(),
            prediction: text.clone(),
            confidence: rng.random_range(CONFIDENCE_RANGE),
            signal: rng.random::<f64>(),
            state,
            metadata: PredictionMetadata::clamped(
                rng.random::<f64>(),
                rng.random_range(-1.0..=1.0),
                rng.random::<f64>(),
            ),
            created_at: now,
        }
    }
}

/// Drift an existing prediction by one tick
///
/// Confidence and signal take one bounded random step; the state advances
/// with probability `advance_probability`.
pub fn drift<R: Rng>(prediction: &mut Prediction, rng: &mut R, advance_probability: f64) {
    prediction.confidence = Prediction::CONFIDENCE.perturb(prediction.confidence, rng.random());
    prediction.signal = Prediction::SIGNAL.perturb(prediction.signal, rng.random());
    if rng.random_bool(advance_probability) {
        prediction.state = prediction.state.advance();
    }
}

/// Uniform pick from a slice the catalog guarantees is non-empty
fn pick<'a, T, R: Rng>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}
