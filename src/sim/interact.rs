//! Cell interaction (pick up / merge / place)
//!
//! Pure state transition run when the player clicks a cell. Persisting the
//! result is the caller's job.

use super::grid::{CellAddress, chebyshev_distance};
use super::state::{GameState, Token};
use crate::tuning::GameRules;

/// Why an in-range interaction changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// Empty inventory, empty cell
    EmptyHanded,
    /// Held and cell tokens differ in value
    MismatchedValues { held: u32, cell: u32 },
}

/// Result of a single interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// Cell token moved into the inventory
    PickedUp { value: u32 },
    /// Cell token merged into the held one, doubling it
    Merged { value: u32, won: bool },
    /// Held token dropped into an empty cell
    Placed { value: u32 },
    /// In range, but nothing to do
    Unchanged(NoOpReason),
    /// Cell is beyond the interaction radius
    OutOfRange { distance: u32 },
}

impl InteractionOutcome {
    /// Whether state changed (and must be persisted)
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            Self::PickedUp { .. } | Self::Merged { .. } | Self::Placed { .. }
        )
    }

    pub fn won(&self) -> bool {
        matches!(self, Self::Merged { won: true, .. })
    }
}

/// Apply a player interaction on `target`
pub fn interact(state: &mut GameState, rules: &GameRules, target: CellAddress) -> InteractionOutcome {
    let distance = chebyshev_distance(state.player_cell(rules), target);
    if distance > rules.interaction_radius {
        log::debug!("Cell {} is too far away ({} > {})", target, distance, rules.interaction_radius);
        return InteractionOutcome::OutOfRange { distance };
    }

    let held = state.inventory.as_ref().map(|t| t.value());
    let in_cell = state.token_value_at(target, rules);

    match (held, in_cell) {
        (None, None) => InteractionOutcome::Unchanged(NoOpReason::EmptyHanded),
        (None, Some(value)) => {
            state.inventory = state.take_cell_token(target, rules);
            log::info!("Picked up token {} from {}", value, target);
            InteractionOutcome::PickedUp { value }
        }
        (Some(held), Some(cell)) if held == cell => {
            // The cell token is consumed; the held one doubles in place
            drop(state.take_cell_token(target, rules));
            state.inventory = state.inventory.take().map(Token::doubled);
            let value = held.saturating_mul(2);
            let won = value >= rules.win_threshold;
            log::info!("Merged at {} into token {}", target, value);
            InteractionOutcome::Merged { value, won }
        }
        (Some(held), Some(cell)) => {
            InteractionOutcome::Unchanged(NoOpReason::MismatchedValues { held, cell })
        }
        (Some(_), None) => match state.inventory.take() {
            Some(token) => {
                let value = token.value();
                state.put_cell_token(target, token);
                log::info!("Placed token {} at {}", value, target);
                InteractionOutcome::Placed { value }
            }
            None => InteractionOutcome::Unchanged(NoOpReason::EmptyHanded),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::to_bounds;

    fn rules() -> GameRules {
        GameRules {
            tile_degrees: 1.0,
            ..GameRules::default()
        }
    }

    /// State with the player standing in cell (0,0)
    fn state_at_origin(rules: &GameRules) -> GameState {
        GameState::new(to_bounds(CellAddress::new(0, 0), rules.tile_degrees).center())
    }

    #[test]
    fn test_pickup() {
        let rules = rules();
        let mut state = state_at_origin(&rules);
        let target = CellAddress::new(1, 1);
        state.put_cell_token(target, Token::new(4));

        let outcome = interact(&mut state, &rules, target);
        assert_eq!(outcome, InteractionOutcome::PickedUp { value: 4 });
        assert_eq!(state.inventory, Some(Token::new(4)));
        assert_eq!(state.token_value_at(target, &rules), None);
    }

    #[test]
    fn test_merge_equal_values() {
        let rules = rules();
        let mut state = state_at_origin(&rules);
        let target = CellAddress::new(-2, 3);
        state.inventory = Some(Token::new(4));
        state.put_cell_token(target, Token::new(4));

        let outcome = interact(&mut state, &rules, target);
        assert_eq!(outcome, InteractionOutcome::Merged { value: 8, won: false });
        assert_eq!(state.inventory, Some(Token::new(8)));
        assert_eq!(state.token_value_at(target, &rules), None);
    }

    #[test]
    fn test_mismatched_values_no_op() {
        let rules = rules();
        let mut state = state_at_origin(&rules);
        let target = CellAddress::new(0, 1);
        state.inventory = Some(Token::new(4));
        state.put_cell_token(target, Token::new(8));

        let outcome = interact(&mut state, &rules, target);
        assert_eq!(
            outcome,
            InteractionOutcome::Unchanged(NoOpReason::MismatchedValues { held: 4, cell: 8 })
        );
        assert!(!outcome.is_transition());
        assert_eq!(state.inventory, Some(Token::new(4)));
        assert_eq!(state.token_value_at(target, &rules), Some(8));
    }

    #[test]
    fn test_place_into_empty_cell() {
        let rules = rules();
        let mut state = state_at_origin(&rules);
        let target = CellAddress::new(3, -3);
        state.take_cell_token(target, &rules);
        state.inventory = Some(Token::new(2));

        let outcome = interact(&mut state, &rules, target);
        assert_eq!(outcome, InteractionOutcome::Placed { value: 2 });
        assert_eq!(state.inventory, None);
        assert_eq!(state.token_value_at(target, &rules), Some(2));
    }

    #[test]
    fn test_empty_handed_on_empty_cell() {
        let rules = rules();
        let mut state = state_at_origin(&rules);
        let target = CellAddress::new(1, 0);
        state.take_cell_token(target, &rules);
        let before = state.clone();

        let outcome = interact(&mut state, &rules, target);
        assert_eq!(outcome, InteractionOutcome::Unchanged(NoOpReason::EmptyHanded));
        assert_eq!(state, before);
    }

    #[test]
    fn test_out_of_range_ignores_tokens() {
        let rules = rules();
        let mut state = state_at_origin(&rules);
        let target = CellAddress::new(5, 5);
        state.put_cell_token(target, Token::new(1));
        state.inventory = Some(Token::new(1));
        let before = state.clone();

        let outcome = interact(&mut state, &rules, target);
        assert_eq!(outcome, InteractionOutcome::OutOfRange { distance: 5 });
        assert_eq!(state, before);
    }

    #[test]
    fn test_radius_edge_is_reachable() {
        let rules = rules();
        let mut state = state_at_origin(&rules);
        let target = CellAddress::new(-3, 3);
        state.put_cell_token(target, Token::new(1));
        assert!(interact(&mut state, &rules, target).is_transition());
    }

    #[test]
    fn test_single_win_on_reaching_threshold() {
        let rules = rules();
        let mut state = state_at_origin(&rules);
        state.inventory = Some(Token::new(1));

        let mut wins = Vec::new();
        for (n, value) in [1u32, 2, 4, 8, 16].into_iter().enumerate() {
            let target = CellAddress::new(0, n as i32 - 2);
            state.put_cell_token(target, Token::new(value));
            let outcome = interact(&mut state, &rules, target);
            assert_eq!(outcome, InteractionOutcome::Merged { value: value * 2, won: value * 2 >= 32 });
            if outcome.won() {
                wins.push(value * 2);
            }
        }
        assert_eq!(wins, vec![32]);
        assert_eq!(state.inventory, Some(Token::new(32)));
    }
}
