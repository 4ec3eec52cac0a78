//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, files on native)
//! - Device geolocation (web only)
//! - Startup parameters (URL query on web)

#[cfg(target_arch = "wasm32")]
pub mod geolocation;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub use geolocation::GeolocationWatch;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use storage::{KeyValueStore, MemoryStorage, StorageError};

use crate::sim::MovementMode;

/// Query parameter selecting the initial movement mode
pub const MOVEMENT_QUERY_KEY: &str = "movement";

/// Movement mode requested by a `?movement=...` query string, if any
pub fn movement_mode_from_query(query: &str) -> Option<MovementMode> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == MOVEMENT_QUERY_KEY)
        .and_then(|(_, value)| {
            let mode = MovementMode::from_str(value);
            if mode.is_none() {
                log::warn!("Ignoring unknown movement mode {:?}", value);
            }
            mode
        })
}

/// `window.location.search` (wasm only)
#[cfg(target_arch = "wasm32")]
pub fn location_query() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}
