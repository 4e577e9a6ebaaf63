// Query interface between the search core and a game engine
//
// The search never inspects engine internals. Everything it needs about the
// world goes through `GameState`, so any engine implementing this trait can be
// driven by the agent. `classic::ClassicGame` is the bundled implementation.

use std::fmt;
use thiserror::Error;

use crate::layout::Walls;
use crate::types::{Direction, Position};

/// Agent index of pacman; ghosts occupy indices 1..num_agents
pub const PACMAN: usize = 0;

/// Errors raised by a game engine when asked for an impossible transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("agent {agent} cannot move {action} from {position}")]
    IllegalAction {
        agent: usize,
        action: Direction,
        position: Position,
    },
    #[error("agent index {0} is out of range")]
    UnknownAgent(usize),
    #[error("the game is already over")]
    GameOver,
}

/// Observable state of one ghost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostState {
    pub position: Position,
    pub direction: Option<Direction>,
    /// Moves left before the ghost stops being edible; zero when dangerous
    pub scared_timer: u32,
}

impl GhostState {
    pub fn is_edible(&self) -> bool {
        self.scared_timer > 0
    }
}

/// A snapshot of the game that can be queried and advanced immutably
pub trait GameState: Clone + fmt::Debug {
    /// Static wall map of the maze
    fn walls(&self) -> &Walls;

    fn pacman_position(&self) -> Position;

    /// Direction of pacman's most recent move, if any
    fn pacman_direction(&self) -> Option<Direction>;

    /// Pacman plus ghosts
    fn num_agents(&self) -> usize;

    /// Moves agent `agent` may take right now. Empty once the game is over.
    fn legal_actions(&self, agent: usize) -> Vec<Direction>;

    /// The state after `agent` takes `action`
    fn generate_successor(&self, agent: usize, action: Direction) -> Result<Self, GameError>;

    fn is_win(&self) -> bool;

    fn is_lose(&self) -> bool;

    fn food_count(&self) -> usize;

    fn food_positions(&self) -> Vec<Position>;

    fn has_food(&self, position: Position) -> bool;

    /// Remaining power capsules
    fn capsules(&self) -> Vec<Position>;

    fn ghost_states(&self) -> Vec<GhostState>;

    /// Number of ghosts pacman has eaten since the game started
    fn ghosts_eaten(&self) -> u32;

    fn score(&self) -> i32;

    fn is_terminal(&self) -> bool {
        self.is_win() || self.is_lose()
    }
}
