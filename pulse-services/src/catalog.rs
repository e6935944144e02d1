//! Label catalog for generated predictions
//!
//! Sports, matchups, players and prediction texts are opaque display
//! strings. The built-in catalog can be replaced by a JSON file.

use std::path::Path;

use pulse_core::{PulseError, PulseResult};
use serde::{Deserialize, Serialize};

/// A game the generator can attach predictions to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub sport: String,
    pub game: String,
    pub players: Vec<String>,
}

/// Display labels the generator draws from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub matchups: Vec<Matchup>,
    pub predictions: Vec<String>,
}

impl Catalog {
    /// Parse a catalog from JSON and validate it
    pub fn from_json(json: &str) -> PulseResult<Self> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| PulseError::catalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> PulseResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PulseError::catalog(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Every list the generator samples from must be non-empty
    pub fn validate(&self) -> PulseResult<()> {
        if self.matchups.is_empty() {
            return Err(PulseError::catalog("no matchups"));
        }
        if self.predictions.is_empty() {
            return Err(PulseError::catalog("no prediction texts"));
        }
        if let Some(matchup) = self.matchups.iter().find(|m| m.players.is_empty()) {
            return Err(PulseError::catalog(format!("matchup '{}' has no players", matchup.game)));
        }
        Ok(())
    }

    /// Distinct sports, in first-seen order
    pub fn sports(&self) -> Vec<&str> {
        let mut sports: Vec<&str> = Vec::new();
        for matchup in &self.matchups {
            if !sports.iter().any(|s| s.eq_ignore_ascii_case(&matchup.sport)) {
                sports.push(&matchup.sport);
            }
        }
        sports
    }
}

fn matchup(sport: &str, game: &str, players: &[&str]) -> Matchup {
    Matchup {
        sport: sport.to_string(),
        game: game.to_string(),
        players: players.iter().map(|p| p.to_string()).collect(),
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            matchups: vec![
                matchup("NBA", "Lakers vs Warriors", &["LeBron James", "Stephen Curry", "Anthony Davis"]),
                matchup("NBA", "Celtics vs Heat", &["Jayson Tatum", "Jimmy Butler", "Jaylen Brown"]),
                matchup("NFL", "Chiefs vs Bills", &["Patrick Mahomes", "Josh Allen", "Travis Kelce"]),
                matchup("NFL", "Eagles vs Cowboys", &["Jalen Hurts", "Dak Prescott", "CeeDee Lamb"]),
                matchup("MLB", "Yankees vs Dodgers", &["Aaron Judge", "Shohei Ohtani", "Mookie Betts"]),
                matchup("NHL", "Oilers vs Panthers", &["Connor McDavid", "Leon Draisaitl", "Matthew Tkachuk"]),
            ],
            predictions: vec![
                "Over 27.5 points".to_string(),
                "Under 8.5 assists".to_string(),
                "Anytime scorer".to_string(),
                "Over 1.5 passing touchdowns".to_string(),
                "Over 0.5 home runs".to_string(),
                "Moneyline win".to_string(),
                "Cover the spread".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = Catalog::default();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.sports(), vec!["NBA", "NFL", "MLB", "NHL"]);
    }

    #[test]
    fn test_parse_catalog() {
        let json = r#"
        {
            "matchups": [
                {"sport": "Cricket", "game": "India vs Australia", "players": ["Virat Kohli"]}
            ],
            "predictions": ["Over 45.5 runs"]
        }
        "#;

        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.matchups.len(), 1);
        assert_eq!(catalog.sports(), vec!["Cricket"]);
    }

    #[test]
    fn test_rejects_empty_lists() {
        let err = Catalog::from_json(r#"{"matchups": [], "predictions": ["x"]}"#).unwrap_err();
        assert_eq!(err, PulseError::catalog("no matchups"));

        let json = r#"{"matchups": [{"sport": "NBA", "game": "A vs B", "players": []}], "predictions": ["x"]}"#;
        assert!(Catalog::from_json(json).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&Catalog::default()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let catalog = Catalog::from_file(file.path()).unwrap();
        assert_eq!(catalog, Catalog::default());

        assert!(Catalog::from_file("/nonexistent/catalog.json").is_err());
    }
}
