//! Geo Tokens - A map-tile token collecting and merging game
//!
//! Core modules:
//! - `sim`: Deterministic game logic (grid math, cell luck, merge rules)
//! - `game`: Controller owning state, rules, storage and movement mode
//! - `platform`: Browser/native platform abstraction (storage, geolocation)
//! - `persistence`: Whole-state save/load with corruption recovery
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game rules
//! - `ui`: Cell styling and status text for the map layer

pub mod game;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use game::GameController;
pub use settings::Settings;
pub use sim::MovementMode;
pub use tuning::GameRules;

/// Game configuration constants
pub mod consts {
    /// Starting position (UCSC classroom)
    pub const CLASSROOM_LAT: f64 = 36.997936938057016;
    pub const CLASSROOM_LNG: f64 = -122.05703507501151;

    /// Map zoom level used for gameplay
    pub const GAMEPLAY_ZOOM_LEVEL: u8 = 19;

    /// Cell edge length in degrees
    pub const TILE_DEGREES: f64 = 1e-4;

    /// Chance that an untouched cell spawns a token
    pub const TOKEN_SPAWN_PROBABILITY: f64 = 0.1;
    /// Value of a freshly spawned token
    pub const BASE_TOKEN_VALUE: u32 = 1;

    /// Max Chebyshev distance (in cells) the player can reach
    pub const PLAYER_INTERACTION_RADIUS: u32 = 3;

    /// Crafting a token of at least this value wins
    pub const WIN_THRESHOLD: u32 = 32;

    /// Viewports spanning more cells than this are not populated (zoomed out too far)
    pub const MAX_VISIBLE_CELLS: usize = 20_000;
}
