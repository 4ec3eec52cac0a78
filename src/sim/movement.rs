//! Player movement
//!
//! Two position sources: one-tile button steps, or a device geolocation
//! stream. Only the active source may move the player.

use serde::{Deserialize, Serialize};

use super::grid::LatLng;

/// Compass direction for a button step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::South => "S",
            Direction::East => "E",
            Direction::West => "W",
        }
    }

    /// Unit (lat, lng) step
    pub fn delta(&self) -> (f64, f64) {
        match self {
            Direction::North => (1.0, 0.0),
            Direction::South => (-1.0, 0.0),
            Direction::East => (0.0, 1.0),
            Direction::West => (0.0, -1.0),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "n" | "north" => Some(Direction::North),
            "s" | "south" => Some(Direction::South),
            "e" | "east" => Some(Direction::East),
            "w" | "west" => Some(Direction::West),
            _ => None,
        }
    }
}

/// Move `pos` one tile in `dir`
pub fn step(pos: LatLng, dir: Direction, tile: f64) -> LatLng {
    let (dlat, dlng) = dir.delta();
    LatLng::new(pos.lat + dlat * tile, pos.lng + dlng * tile)
}

/// Which source drives the player position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MovementMode {
    #[default]
    Buttons,
    Geolocation,
}

impl MovementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementMode::Buttons => "buttons",
            MovementMode::Geolocation => "geolocation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buttons" | "button" | "manual" => Some(MovementMode::Buttons),
            "geolocation" | "gps" => Some(MovementMode::Geolocation),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            MovementMode::Buttons => MovementMode::Geolocation,
            MovementMode::Geolocation => MovementMode::Buttons,
        }
    }
}
