//! Player settings and preferences
//!
//! Persisted separately from the game save, so "new game" keeps them.

use serde::{Deserialize, Serialize};

use crate::consts::GAMEPLAY_ZOOM_LEVEL;
use crate::platform::KeyValueStore;
use crate::sim::MovementMode;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preferred movement source (a `?movement=` query overrides it at startup)
    pub movement: MovementMode,
    /// Map zoom level
    pub zoom: u8,
    /// Re-center the map whenever the player moves
    pub auto_pan: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            movement: MovementMode::Buttons,
            zoom: GAMEPLAY_ZOOM_LEVEL,
            auto_pan: true,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "geo_tokens_settings";

    /// Movement mode to start in: query override, else the stored preference
    pub fn startup_mode(&self, query_override: Option<MovementMode>) -> MovementMode {
        query_override.unwrap_or(self.movement)
    }

    /// Load settings (defaults when missing or unreadable)
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(err) => log::warn!("Ignoring malformed settings: {}", err),
            },
            Ok(None) => {}
            Err(err) => log::warn!("Could not read settings: {}", err),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        match serde_json::to_string(self) {
            Ok(json) => match store.set(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(err) => log::error!("Failed to save settings: {}", err),
            },
            Err(err) => log::error!("Failed to encode settings: {}", err),
        }
    }
}
