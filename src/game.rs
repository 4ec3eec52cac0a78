//! Game controller
//!
//! Owns the rules, the state, the storage backend and the active movement
//! mode. UI callbacks (clicks, buttons, geolocation fixes) call into it and
//! it persists after every change.

use crate::persistence;
use crate::platform::KeyValueStore;
use crate::sim::{
    Cell, CellAddress, CellBounds, Direction, GameEvent, GameState, InteractionOutcome, LatLng,
    MovementMode, cell_count, cells_in_bounds, interact, step,
};
use crate::tuning::GameRules;
use crate::ui;

/// Single owner of all mutable game state
#[derive(Debug)]
pub struct GameController<S: KeyValueStore> {
    rules: GameRules,
    state: GameState,
    store: S,
    mode: MovementMode,
    events: Vec<GameEvent>,
}

impl<S: KeyValueStore> GameController<S> {
    /// Resume the saved game in `store`, or start fresh at `rules.origin`
    pub fn new(mut store: S, rules: GameRules, mode: MovementMode) -> Self {
        let state = persistence::load(&mut store).unwrap_or_else(|| GameState::new(rules.origin));
        log::info!(
            "Game ready at ({:.6}, {:.6}), movement: {}",
            state.player.lat,
            state.player.lng,
            mode.as_str()
        );
        Self {
            rules,
            state,
            store,
            mode,
            events: Vec::new(),
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn player(&self) -> LatLng {
        self.state.player
    }

    pub fn player_cell(&self) -> CellAddress {
        self.state.player_cell(&self.rules)
    }

    /// Take pending events for the presentation layer
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn persist(&mut self) {
        if let Err(err) = persistence::save(&mut self.store, &self.state) {
            log::error!("Failed to save game: {}", err);
        }
    }

    /// Player clicked a cell
    pub fn interact(&mut self, target: CellAddress) -> InteractionOutcome {
        let outcome = interact(&mut self.state, &self.rules, target);
        if outcome.is_transition() {
            self.persist();
        }
        if let InteractionOutcome::Merged { value, won: true } = outcome {
            log::info!("Win threshold reached with token {}", value);
            self.events.push(GameEvent::Won { value });
        }
        outcome
    }

    fn relocate(&mut self, pos: LatLng) -> LatLng {
        let before = self.player_cell();
        self.state.player = pos;
        let after = self.player_cell();
        if after != before {
            self.events.push(GameEvent::EnteredCell { address: after });
        }
        self.persist();
        pos
    }

    /// Movement button pressed (ignored unless in button mode)
    pub fn move_player(&mut self, dir: Direction) -> Option<LatLng> {
        if self.mode != MovementMode::Buttons {
            log::debug!("Ignoring {} button in {} mode", dir.label(), self.mode.as_str());
            return None;
        }
        let next = step(self.state.player, dir, self.rules.tile_degrees);
        Some(self.relocate(next))
    }

    /// Geolocation fix arrived (ignored unless in geolocation mode)
    pub fn update_position(&mut self, pos: LatLng) -> Option<LatLng> {
        if self.mode != MovementMode::Geolocation {
            log::debug!("Ignoring position update in {} mode", self.mode.as_str());
            return None;
        }
        if !(pos.lat.is_finite() && pos.lng.is_finite()) {
            log::warn!("Ignoring non-finite position ({}, {})", pos.lat, pos.lng);
            return None;
        }
        Some(self.relocate(pos))
    }

    pub fn set_mode(&mut self, mode: MovementMode) {
        if mode != self.mode {
            log::info!("Movement mode: {} -> {}", self.mode.as_str(), mode.as_str());
            self.mode = mode;
        }
    }

    pub fn toggle_mode(&mut self) -> MovementMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    /// Geolocation became unusable; fall back to buttons
    pub fn geolocation_failed(&mut self, reason: &str) {
        log::warn!("Geolocation failed: {}", reason);
        self.set_mode(MovementMode::Buttons);
    }

    /// Wipe the save and start over at the origin
    pub fn new_game(&mut self) {
        if let Err(err) = persistence::reset(&mut self.store) {
            log::error!("Failed to clear saved game: {}", err);
        }
        self.state = GameState::new(self.rules.origin);
        self.events.push(GameEvent::NewGame);
        log::info!("Started new game");
    }

    pub fn cell(&self, address: CellAddress) -> Cell {
        self.state.cell(address, &self.rules)
    }

    /// Cells covering a viewport (empty when zoomed out past the cap)
    pub fn cells_in_view(&self, bounds: &CellBounds) -> Vec<Cell> {
        let count = cell_count(bounds, self.rules.tile_degrees);
        if count > self.rules.max_visible_cells {
            log::warn!(
                "Viewport spans {} cells (cap {}), not drawing cells",
                count,
                self.rules.max_visible_cells
            );
            return Vec::new();
        }
        cells_in_bounds(bounds, self.rules.tile_degrees)
            .map(|addr| self.cell(addr))
            .collect()
    }

    /// Drawable views of the cells covering a viewport
    pub fn views_in(&self, bounds: &CellBounds) -> Vec<ui::CellView> {
        let player_cell = self.player_cell();
        self.cells_in_view(bounds)
            .iter()
            .map(|cell| ui::CellView::new(cell, &self.rules, player_cell))
            .collect()
    }

    pub fn view_of(&self, address: CellAddress) -> ui::CellView {
        ui::CellView::new(&self.cell(address), &self.rules, self.player_cell())
    }

    pub fn status_text(&self) -> String {
        ui::status_text(self.state.inventory.as_ref())
    }
}
