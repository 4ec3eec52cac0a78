//! Data-driven game rules
//!
//! Defaults come from `consts`; any subset can be overridden from JSON.
//! Changing `tile_degrees` or `spawn_probability` changes which cells hold
//! tokens, so saves are only meaningful under the rules they were made with.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::LatLng;

/// Tunable rules for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Cell edge length in degrees
    pub tile_degrees: f64,
    /// Chance that an untouched cell holds a token
    pub spawn_probability: f64,
    /// Value of freshly spawned tokens
    pub base_token_value: u32,
    /// Max Chebyshev distance for interaction (cells)
    pub interaction_radius: u32,
    /// Merge result at or above this wins
    pub win_threshold: u32,
    /// Where a new game starts
    pub origin: LatLng,
    /// Cap on cells populated for one viewport
    pub max_visible_cells: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            tile_degrees: TILE_DEGREES,
            spawn_probability: TOKEN_SPAWN_PROBABILITY,
            base_token_value: BASE_TOKEN_VALUE,
            interaction_radius: PLAYER_INTERACTION_RADIUS,
            win_threshold: WIN_THRESHOLD,
            origin: LatLng::new(CLASSROOM_LAT, CLASSROOM_LNG),
            max_visible_cells: MAX_VISIBLE_CELLS,
        }
    }
}

impl GameRules {
    /// Parse overrides; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let rules: Self = serde_json::from_str(json)?;
        Ok(rules.sanitized())
    }

    /// Clamp values into ranges the engine can work with
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.tile_degrees.is_finite() && self.tile_degrees > 0.0) {
            log::warn!("Invalid tile size {}, using default", self.tile_degrees);
            self.tile_degrees = defaults.tile_degrees;
        }
        if !self.spawn_probability.is_finite() {
            self.spawn_probability = defaults.spawn_probability;
        }
        self.spawn_probability = self.spawn_probability.clamp(0.0, 1.0);
        self.base_token_value = self.base_token_value.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let rules = GameRules::from_json(r#"{"interaction_radius": 5, "win_threshold": 64}"#).unwrap();
        assert_eq!(rules.interaction_radius, 5);
        assert_eq!(rules.win_threshold, 64);
        assert_eq!(rules.tile_degrees, TILE_DEGREES);
        assert_eq!(rules.origin, LatLng::new(CLASSROOM_LAT, CLASSROOM_LNG));
    }

    #[test]
    fn test_invalid_values_are_sanitized() {
        let rules =
            GameRules::from_json(r#"{"tile_degrees": -1.0, "spawn_probability": 3.0, "base_token_value": 0}"#)
                .unwrap();
        assert_eq!(rules.tile_degrees, TILE_DEGREES);
        assert_eq!(rules.spawn_probability, 1.0);
        assert_eq!(rules.base_token_value, 1);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(GameRules::from_json("{not json").is_err());
    }
}
