// Ghost behaviour models
//
// The same models drive the ghosts inside simulated rollouts and the real
// ghosts in the game runner.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;

use crate::game::GameState;
use crate::types::Direction;

/// Probability that a directional ghost takes its preferred move
const DIRECTIONAL_BIAS: f64 = 0.8;

/// How ghosts are assumed to move
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdversaryModel {
    /// Uniformly random legal move
    Random,
    /// Approaches pacman (or flees while scared) most of the time, random otherwise
    Directional,
    /// Never moves
    Stationary,
}

impl AdversaryModel {
    /// Picks a move for ghost `agent`, or `None` when the ghost stays put
    /// (stationary model, or no legal move).
    pub fn choose<S: GameState, R: Rng + ?Sized>(
        &self,
        state: &S,
        agent: usize,
        rng: &mut R,
    ) -> Option<Direction> {
        if *self == AdversaryModel::Stationary {
            return None;
        }
        let legal = state.legal_actions(agent);
        if legal.is_empty() {
            return None;
        }

        if *self == AdversaryModel::Directional && rng.random_bool(DIRECTIONAL_BIAS) {
            let ghost = state.ghost_states().get(agent - 1).copied()?;
            let pacman = state.pacman_position();
            let distances = legal
                .iter()
                .map(|d| (*d, d.apply(&ghost.position).manhattan(pacman)));
            let preferred = if ghost.is_edible() {
                distances.max_by_key(|(_, dist)| *dist)
            } else {
                distances.min_by_key(|(_, dist)| *dist)
            };
            return preferred.map(|(d, _)| d);
        }

        legal.choose(rng).copied()
    }
}
