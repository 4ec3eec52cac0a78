//! Game state and core gameplay types
//!
//! Everything that must survive a reload lives in `GameState`. Untouched cells
//! are not stored; they are regenerated from `luck` on demand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::grid::{CellAddress, LatLng};
use super::luck::spawn_token;
use crate::tuning::GameRules;

/// A collectible token
///
/// Not `Copy`: a token lives in one cell or the inventory, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    value: u32,
}

impl Token {
    pub fn new(value: u32) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Merge with a token of equal value (saturates at `u32::MAX`)
    pub fn doubled(self) -> Self {
        Self {
            value: self.value.saturating_mul(2),
        }
    }
}

/// A cell as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub address: CellAddress,
    pub token: Option<Token>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.token.is_none()
    }
}

/// Events the presentation layer reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A merge reached the win threshold
    Won { value: u32 },
    /// Player moved into a different cell
    EnteredCell { address: CellAddress },
    /// Save wiped and state reinitialized
    NewGame,
}

/// Complete game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Player position
    pub player: LatLng,
    /// Single-slot inventory
    pub inventory: Option<Token>,
    /// Cells whose contents diverged from the generator (`None` = emptied)
    overrides: BTreeMap<CellAddress, Option<Token>>,
}

impl GameState {
    /// Fresh game with the player at `start`
    pub fn new(start: LatLng) -> Self {
        Self {
            player: start,
            inventory: None,
            overrides: BTreeMap::new(),
        }
    }

    /// Rebuild from persisted parts
    pub fn from_parts(
        player: LatLng,
        inventory: Option<Token>,
        overrides: BTreeMap<CellAddress, Option<Token>>,
    ) -> Self {
        Self {
            player,
            inventory,
            overrides,
        }
    }

    pub fn overrides(&self) -> &BTreeMap<CellAddress, Option<Token>> {
        &self.overrides
    }

    pub fn is_overridden(&self, address: CellAddress) -> bool {
        self.overrides.contains_key(&address)
    }

    /// Cell the player is standing in
    pub fn player_cell(&self, rules: &GameRules) -> CellAddress {
        self.player.cell(rules.tile_degrees)
    }

    /// Value of the token in a cell: override first, generator fallback
    pub fn token_value_at(&self, address: CellAddress, rules: &GameRules) -> Option<u32> {
        match self.overrides.get(&address) {
            Some(slot) => slot.as_ref().map(Token::value),
            None => spawn_token(address, rules).map(|t| t.value()),
        }
    }

    /// Current contents of a cell
    pub fn cell(&self, address: CellAddress, rules: &GameRules) -> Cell {
        let token = match self.overrides.get(&address) {
            Some(slot) => slot.clone(),
            None => spawn_token(address, rules),
        };
        Cell { address, token }
    }

    /// Remove and return a cell's token, recording the cell as emptied
    pub fn take_cell_token(&mut self, address: CellAddress, rules: &GameRules) -> Option<Token> {
        let slot = self
            .overrides
            .entry(address)
            .or_insert_with(|| spawn_token(address, rules));
        slot.take()
    }

    /// Put a token into a cell, recording the override
    pub fn put_cell_token(&mut self, address: CellAddress, token: Token) {
        self.overrides.insert(address, Some(token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::luck::has_token;

    fn token_cell(rules: &GameRules) -> CellAddress {
        (0..1000)
            .map(|j| CellAddress::new(3, j))
            .find(|&a| has_token(a, rules.spawn_probability))
            .expect("token cell")
    }

    #[test]
    fn test_cell_falls_back_to_generator() {
        let rules = GameRules::default();
        let state = GameState::new(rules.origin);
        let addr = token_cell(&rules);
        assert_eq!(state.cell(addr, &rules).token, Some(Token::new(1)));
        assert!(!state.is_overridden(addr));
    }

    #[test]
    fn test_take_records_emptied_override() {
        let rules = GameRules::default();
        let mut state = GameState::new(rules.origin);
        let addr = token_cell(&rules);

        let token = state.take_cell_token(addr, &rules);
        assert_eq!(token, Some(Token::new(1)));
        assert!(state.cell(addr, &rules).is_empty());
        assert_eq!(state.overrides().get(&addr), Some(&None));

        // A second take finds the cell empty
        assert_eq!(state.take_cell_token(addr, &rules), None);
    }

    #[test]
    fn test_put_overrides_generator() {
        let rules = GameRules::default();
        let mut state = GameState::new(rules.origin);
        let addr = CellAddress::new(-4, 9);
        state.put_cell_token(addr, Token::new(16));
        assert_eq!(state.token_value_at(addr, &rules), Some(16));
    }

    #[test]
    fn test_doubled_saturates() {
        assert_eq!(Token::new(4).doubled().value(), 8);
        assert_eq!(Token::new(u32::MAX).doubled().value(), u32::MAX);
    }
}
