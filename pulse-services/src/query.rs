//! Pure query helpers over prediction snapshots

use std::collections::HashMap;

use pulse_core::{Prediction, PredictionState};
use serde::{Deserialize, Serialize};

/// Predictions for one sport (case-insensitive)
pub fn filter_by_sport(predictions: &[Prediction], sport: &str) -> Vec<Prediction> {
    predictions.iter().filter(|p| p.is_sport(sport)).cloned().collect()
}

/// Predictions at or above a confidence percentage
pub fn filter_by_min_confidence(predictions: &[Prediction], min_confidence: f64) -> Vec<Prediction> {
    predictions
        .iter()
        .filter(|p| p.confidence >= min_confidence)
        .cloned()
        .collect()
}

pub fn filter_by_state(predictions: &[Prediction], state: PredictionState) -> Vec<Prediction> {
    predictions.iter().filter(|p| p.state == state).cloned().collect()
}

/// The `n` most confident predictions, highest first
pub fn top_by_confidence(predictions: &[Prediction], n: usize) -> Vec<Prediction> {
    let mut sorted = predictions.to_vec();
    sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    sorted.truncate(n);
    sorted
}

/// Combined filter, deserializable from URL query parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub sport: Option<String>,
    pub min_confidence: Option<f64>,
    pub state: Option<PredictionState>,
    pub limit: Option<usize>,
}

impl PredictionQuery {
    pub fn matches(&self, prediction: &Prediction) -> bool {
        self.sport.as_deref().map_or(true, |s| prediction.is_sport(s))
            && self.min_confidence.map_or(true, |c| prediction.confidence >= c)
            && self.state.map_or(true, |s| prediction.state == s)
    }

    /// Filter in snapshot order (newest first), then apply `limit`
    pub fn apply(&self, predictions: &[Prediction]) -> Vec<Prediction> {
        predictions
            .iter()
            .filter(|p| self.matches(p))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

/// Aggregate view of a prediction list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub count: usize,
    pub average_confidence: f64,
    pub average_signal: f64,
    pub by_state: HashMap<PredictionState, usize>,
    pub by_sport: HashMap<String, usize>,
}

pub fn summarize(predictions: &[Prediction]) -> PredictionSummary {
    let count = predictions.len();
    let mean = |f: fn(&Prediction) -> f64| {
        if count == 0 {
            0.0
        } else {
            predictions.iter().map(f).sum::<f64>() / count as f64
        }
    };

    let mut by_state = HashMap::new();
    let mut by_sport = HashMap::new();
    for p in predictions {
        *by_state.entry(p.state).or_insert(0) += 1;
        *by_sport.entry(p.sport.clone()).or_insert(0) += 1;
    }

    PredictionSummary {
        count,
        average_confidence: mean(|p| p.confidence),
        average_signal: mean(|p| p.signal),
        by_state,
        by_sport,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_core::PredictionMetadata;

    fn prediction(id: &str, sport: &str, confidence: f64, state: PredictionState) -> Prediction {
        Prediction {
            id: id.to_string(),
            sport: sport.to_string(),
            game: "Home vs Away".to_string(),
            player: "Player".to_string(),
            prediction: "Over 1.5".to_string(),
            confidence,
            signal: 0.5,
            state,
            metadata: PredictionMetadata::clamped(0.2, 0.1, 0.8),
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Prediction> {
        vec![
            prediction("pred-3", "NBA", 91.0, PredictionState::Coherent),
            prediction("pred-2", "nfl", 75.0, PredictionState::Entangled),
            prediction("pred-1", "NBA", 82.5, PredictionState::Collapsed),
        ]
    }

    #[test]
    fn test_filter_by_sport_ignores_case() {
        let nfl = filter_by_sport(&sample(), "NFL");
        assert_eq!(nfl.len(), 1);
        assert_eq!(nfl[0].id, "pred-2");
        assert_eq!(filter_by_sport(&sample(), "nba").len(), 2);
        assert!(filter_by_sport(&sample(), "MLB").is_empty());
    }

    #[test]
    fn test_filter_by_min_confidence_is_inclusive() {
        let high = filter_by_min_confidence(&sample(), 82.5);
        let ids: Vec<&str> = high.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["pred-3", "pred-1"]);
    }

    #[test]
    fn test_filters_do_not_touch_input() {
        let predictions = sample();
        let mut filtered = filter_by_state(&predictions, PredictionState::Coherent);
        filtered[0].confidence = 0.0;
        assert_eq!(predictions[0].confidence, 91.0);
    }

    #[test]
    fn test_top_by_confidence() {
        let top = top_by_confidence(&sample(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "pred-3");
        assert_eq!(top[1].id, "pred-1");
    }

    #[test]
    fn test_combined_query() {
        let query = PredictionQuery {
            sport: Some("nba".to_string()),
            min_confidence: Some(80.0),
            state: None,
            limit: Some(1),
        };
        let result = query.apply(&sample());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "pred-3");

        assert_eq!(PredictionQuery::default().apply(&sample()).len(), 3);
    }

    #[test]
    fn test_query_from_json() {
        let query: PredictionQuery =
            serde_json::from_str(r#"{"state": "collapsed", "min_confidence": 50}"#).unwrap();
        assert_eq!(query.state, Some(PredictionState::Collapsed));
        assert_eq!(query.apply(&sample()).len(), 1);
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&sample());
        assert_eq!(summary.count, 3);
        assert!((summary.average_confidence - 82.833).abs() < 0.01);
        assert_eq!(summary.by_state[&PredictionState::Collapsed], 1);
        assert_eq!(summary.by_sport["NBA"], 2);

        let empty = summarize(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.average_confidence, 0.0);
    }
}
