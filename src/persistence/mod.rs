//! Save/load persistence
//!
//! Features:
//! - Whole-state JSON snapshot under one storage key
//! - Flat, versionless schema (player, inventory, overridden cells)
//! - Corrupt records are discarded and the game starts fresh

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::platform::{KeyValueStore, StorageError};
use crate::sim::{CellAddress, GameState, LatLng, ParseCellKeyError, Token};

/// Storage key of the saved game
pub const SAVE_KEY: &str = "geo_tokens_save";

/// Persistence failure
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    CellKey(#[from] ParseCellKeyError),
    #[error("non-finite player position ({lat}, {lng})")]
    BadPosition { lat: f64, lng: f64 },
}

/// On-disk snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedGameState {
    pub player_lat_lng: LatLng,
    pub inventory_token: Option<Token>,
    /// `["i,j", token | null]` pairs
    pub persistent_cell_data: Vec<(String, Option<Token>)>,
}

impl PersistedGameState {
    pub fn capture(state: &GameState) -> Self {
        Self {
            player_lat_lng: state.player,
            inventory_token: state.inventory.clone(),
            persistent_cell_data: state
                .overrides()
                .iter()
                .map(|(addr, token)| (addr.key(), token.clone()))
                .collect(),
        }
    }

    pub fn restore(self) -> Result<GameState, PersistError> {
        let LatLng { lat, lng } = self.player_lat_lng;
        if !(lat.is_finite() && lng.is_finite()) {
            return Err(PersistError::BadPosition { lat, lng });
        }
        let overrides = self
            .persistent_cell_data
            .into_iter()
            .map(|(key, token)| Ok::<_, PersistError>((key.parse::<CellAddress>()?, token)))
            .collect::<Result<BTreeMap<_, _>, PersistError>>()?;
        Ok(GameState::from_parts(
            self.player_lat_lng,
            self.inventory_token,
            overrides,
        ))
    }
}

/// Write the full snapshot
pub fn save<S: KeyValueStore + ?Sized>(store: &mut S, state: &GameState) -> Result<(), PersistError> {
    let json = serde_json::to_string(&PersistedGameState::capture(state))?;
    store.set(SAVE_KEY, &json)?;
    log::debug!("Game saved ({} overridden cells)", state.overrides().len());
    Ok(())
}

/// Read the snapshot, surfacing any error
pub fn try_load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<GameState>, PersistError> {
    let Some(json) = store.get(SAVE_KEY)? else {
        return Ok(None);
    };
    let persisted: PersistedGameState = serde_json::from_str(&json)?;
    Ok(Some(persisted.restore()?))
}

/// Read the snapshot; a corrupt record is removed and treated as absent
pub fn load<S: KeyValueStore + ?Sized>(store: &mut S) -> Option<GameState> {
    match try_load(&*store) {
        Ok(Some(state)) => {
            log::info!("Loaded saved game ({} overridden cells)", state.overrides().len());
            Some(state)
        }
        Ok(None) => {
            log::info!("No saved game found, starting fresh");
            None
        }
        Err(PersistError::Storage(err)) => {
            log::error!("Could not read saved game: {}", err);
            None
        }
        Err(err) => {
            log::warn!("Discarding corrupt saved game: {}", err);
            if let Err(err) = store.remove(SAVE_KEY) {
                log::error!("Failed to remove corrupt save: {}", err);
            }
            None
        }
    }
}

/// Delete the saved game
pub fn reset<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<(), PersistError> {
    store.remove(SAVE_KEY)?;
    log::info!("Saved game cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    fn sample_state() -> GameState {
        let overrides = BTreeMap::from([
            (CellAddress::new(2, 3), None),
            (CellAddress::new(-1, 7), Some(Token::new(4))),
        ]);
        GameState::from_parts(LatLng::new(36.9979, -122.057), Some(Token::new(8)), overrides)
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = MemoryStorage::new();
        let state = sample_state();
        save(&mut store, &state).unwrap();

        let loaded = load(&mut store).expect("saved game");
        assert_eq!(loaded, state);
        assert_eq!(loaded.inventory, Some(Token::new(8)));
        assert_eq!(loaded.overrides().get(&CellAddress::new(2, 3)), Some(&None));
    }

    #[test]
    fn test_record_layout() {
        let mut store = MemoryStorage::new();
        save(&mut store, &sample_state()).unwrap();
        let json = store.get(SAVE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["playerLatLng"]["lat"], 36.9979);
        assert_eq!(value["inventoryToken"]["value"], 8);
        assert_eq!(
            value["persistentCellData"],
            serde_json::json!([["-1,7", {"value": 4}], ["2,3", null]])
        );
    }

    #[test]
    fn test_empty_inventory_is_null() {
        let mut store = MemoryStorage::new();
        save(&mut store, &GameState::new(LatLng::new(0.0, 0.0))).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&store.get(SAVE_KEY).unwrap().unwrap()).unwrap();
        assert!(value["inventoryToken"].is_null());
    }

    #[test]
    fn test_load_absent() {
        let mut store = MemoryStorage::new();
        assert!(load(&mut store).is_none());
        assert!(try_load(&store).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_json_is_discarded() {
        let mut store = MemoryStorage::new();
        store.set(SAVE_KEY, "{\"playerLatLng\": ").unwrap();

        assert!(matches!(try_load(&store), Err(PersistError::Json(_))));
        assert!(load(&mut store).is_none());
        assert_eq!(store.get(SAVE_KEY).unwrap(), None);
    }

    #[test]
    fn test_bad_cell_key_is_discarded() {
        let mut store = MemoryStorage::new();
        store
            .set(
                SAVE_KEY,
                r#"{"playerLatLng":{"lat":0,"lng":0},"inventoryToken":null,"persistentCellData":[["oops",null]]}"#,
            )
            .unwrap();

        assert!(matches!(try_load(&store), Err(PersistError::CellKey(_))));
        assert!(load(&mut store).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reset_removes_record() {
        let mut store = MemoryStorage::new();
        save(&mut store, &sample_state()).unwrap();
        reset(&mut store).unwrap();
        assert!(store.is_empty());
    }
}
