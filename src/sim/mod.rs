//! Deterministic game logic
//!
//! All gameplay rules live here. This module must stay pure:
//! - Cell contents derive from the address alone (plus overrides)
//! - No storage, rendering or platform dependencies
//! - Every transition is a plain function over `GameState`

pub mod grid;
pub mod interact;
pub mod luck;
pub mod movement;
pub mod state;

pub use grid::{
    CellAddress, CellBounds, LatLng, ParseCellKeyError, cell_count, cells_in_bounds,
    chebyshev_distance, to_bounds, to_cell_address,
};
pub use interact::{InteractionOutcome, NoOpReason, interact};
pub use luck::{has_token, luck, spawn_token};
pub use movement::{Direction, MovementMode, step};
pub use state::{Cell, GameEvent, GameState, Token};
