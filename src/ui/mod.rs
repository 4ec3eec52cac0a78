//! Presentation helpers
//!
//! Turns cells and inventory into what the map layer draws: rectangle style,
//! tooltip and status text. No DOM access here.

use crate::sim::{
    Cell, CellAddress, CellBounds, GameEvent, LatLng, Token, chebyshev_distance, to_bounds,
};
use crate::tuning::GameRules;

/// Rectangle style for one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    pub color: &'static str,
    pub fill_opacity: f64,
    pub weight: f64,
}

const TOKEN_COLOR: &str = "blue";
const EMPTY_COLOR: &str = "grey";
const TOKEN_FILL_OPACITY: f64 = 0.3;
const EMPTY_FILL_OPACITY: f64 = 0.1;
const BORDER_WEIGHT: f64 = 0.5;
/// Heavier border for cells the player can reach
const REACHABLE_BORDER_WEIGHT: f64 = 1.5;

pub fn cell_style(cell: &Cell, reachable: bool) -> CellStyle {
    let weight = if reachable {
        REACHABLE_BORDER_WEIGHT
    } else {
        BORDER_WEIGHT
    };
    match cell.token {
        Some(_) => CellStyle {
            color: TOKEN_COLOR,
            fill_opacity: TOKEN_FILL_OPACITY,
            weight,
        },
        None => CellStyle {
            color: EMPTY_COLOR,
            fill_opacity: EMPTY_FILL_OPACITY,
            weight,
        },
    }
}

/// Tooltip for token cells; empty cells have none
pub fn cell_tooltip(cell: &Cell) -> Option<String> {
    cell.token
        .as_ref()
        .map(|t| format!("Token (Value: {})", t.value()))
}

/// Status panel text for the inventory
pub fn status_text(inventory: Option<&Token>) -> String {
    match inventory {
        Some(token) => format!("Holding: Token (Value: {})", token.value()),
        None => "Holding: Empty".to_string(),
    }
}

pub fn win_message(value: u32) -> String {
    format!("You crafted a token of value {}!", value)
}

/// Everything needed to draw one cell rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub key: String,
    pub address: CellAddress,
    pub bounds: CellBounds,
    pub style: CellStyle,
    pub tooltip: Option<String>,
}

impl CellView {
    pub fn new(cell: &Cell, rules: &GameRules, player_cell: CellAddress) -> Self {
        let reachable = chebyshev_distance(cell.address, player_cell) <= rules.interaction_radius;
        Self {
            key: cell.address.key(),
            address: cell.address,
            bounds: to_bounds(cell.address, rules.tile_degrees),
            style: cell_style(cell, reachable),
            tooltip: cell_tooltip(cell),
        }
    }
}

/// Map work that follows a controller call.
///
/// Built while the game is borrowed and applied after the borrow ends, since
/// moving the marker can make the map fire its view-change callback at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapUpdate {
    /// New marker position and whether the map should pan to it
    pub marker: Option<(LatLng, bool)>,
    /// Regenerate the visible cells
    pub redraw: bool,
    /// Alerts to show, in order
    pub messages: Vec<String>,
}

impl MapUpdate {
    /// `moved` is true when the player position was just set, even to the same cell
    pub fn from_events(events: &[GameEvent], player: LatLng, moved: bool, auto_pan: bool) -> Self {
        let mut update = Self::default();
        if moved {
            update.marker = Some((player, auto_pan));
            update.redraw = true;
        }
        for event in events {
            match event {
                GameEvent::Won { value } => update.messages.push(win_message(*value)),
                GameEvent::EnteredCell { .. } => update.redraw = true,
                GameEvent::NewGame => {
                    update.marker = Some((player, true));
                    update.redraw = true;
                }
            }
        }
        update
    }

    pub fn is_empty(&self) -> bool {
        self.marker.is_none() && !self.redraw && self.messages.is_empty()
    }
}
