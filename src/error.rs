// Errors surfaced by a decision

use thiserror::Error;

use crate::game::GameError;
use crate::layout::LayoutError;
use crate::types::{Direction, Position};

#[derive(Debug, Error)]
pub enum SearchError {
    /// A simulated transition was rejected by the game engine. Always a bug in
    /// the search, so the decision is abandoned instead of skewing statistics.
    #[error("simulated transition failed for agent {agent} moving {action} at {position}: {source}")]
    Transition {
        agent: usize,
        action: Direction,
        position: Position,
        remaining: Vec<Direction>,
        legal: Vec<Direction>,
        #[source]
        source: GameError,
    },
    #[error("pacman has no legal move at {0}")]
    NoLegalActions(Position),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
