// Reference game engine with the classic Pac-Man rules
//
// Pacman moves first each round, then every ghost in index order. Ghosts may
// not reverse unless a dead end forces them to. Eating a capsule frightens all
// ghosts; a frightened ghost that touches pacman is sent home, any other ghost
// ends the game.

use std::sync::Arc;

use crate::game::{GameError, GameState, GhostState, PACMAN};
use crate::layout::{Layout, Walls};
use crate::types::{Direction, Position};

/// Moves a ghost stays edible after a capsule is eaten
pub const SCARED_TIME: u32 = 40;
const FOOD_SCORE: i32 = 10;
const TIME_PENALTY: i32 = 1;
const WIN_SCORE: i32 = 500;
const LOSE_PENALTY: i32 = 500;
const GHOST_SCORE: i32 = 200;

/// Full game state. Cloning is cheap enough for simulation: the wall map is
/// shared and food is a flat bitmap.
#[derive(Debug, Clone)]
pub struct ClassicGame {
    walls: Arc<Walls>,
    food: Vec<bool>,
    food_left: usize,
    capsules: Vec<Position>,
    pacman: Position,
    pacman_direction: Option<Direction>,
    ghosts: Vec<GhostState>,
    ghost_starts: Vec<Position>,
    ghosts_eaten: u32,
    score: i32,
    win: bool,
    lose: bool,
}

impl ClassicGame {
    /// Sets up a new game from a layout
    pub fn new(layout: &Layout) -> Self {
        let walls = Arc::new(layout.walls.clone());
        let mut food = vec![false; walls.width() * walls.height()];
        let mut food_left = 0;
        for pos in &layout.food {
            if let Some(idx) = Self::cell_index(&walls, *pos) {
                if !food[idx] {
                    food[idx] = true;
                    food_left += 1;
                }
            }
        }

        let ghosts = layout
            .ghost_starts
            .iter()
            .map(|&position| GhostState {
                position,
                direction: None,
                scared_timer: 0,
            })
            .collect();

        ClassicGame {
            walls,
            food,
            food_left,
            capsules: layout.capsules.clone(),
            pacman: layout.pacman_start,
            pacman_direction: None,
            ghosts,
            ghost_starts: layout.ghost_starts.clone(),
            ghosts_eaten: 0,
            score: 0,
            win: food_left == 0,
            lose: false,
        }
    }

    fn cell_index(walls: &Walls, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x >= walls.width() || y >= walls.height() {
            return None;
        }
        Some(y * walls.width() + x)
    }

    fn open_moves(&self, from: Position) -> Vec<Direction> {
        Direction::all()
            .iter()
            .copied()
            .filter(|dir| !self.walls.is_wall(dir.apply(&from)))
            .collect()
    }

    fn ghost_legal_actions(&self, ghost: &GhostState) -> Vec<Direction> {
        let moves = self.open_moves(ghost.position);
        let reverse = match ghost.direction {
            Some(dir) => dir.opposite(),
            None => return moves,
        };
        let forward: Vec<Direction> = moves.iter().copied().filter(|d| *d != reverse).collect();
        if forward.is_empty() {
            moves
        } else {
            forward
        }
    }

    fn move_pacman(&mut self, action: Direction) {
        self.pacman = action.apply(&self.pacman);
        self.pacman_direction = Some(action);
        self.score -= TIME_PENALTY;

        if let Some(idx) = Self::cell_index(&self.walls, self.pacman) {
            if self.food[idx] {
                self.food[idx] = false;
                self.food_left -= 1;
                self.score += FOOD_SCORE;
                if self.food_left == 0 {
                    self.score += WIN_SCORE;
                    self.win = true;
                }
            }
        }

        if let Some(i) = self.capsules.iter().position(|c| *c == self.pacman) {
            self.capsules.swap_remove(i);
            for ghost in &mut self.ghosts {
                ghost.scared_timer = SCARED_TIME;
            }
        }

        for i in 0..self.ghosts.len() {
            self.check_collision(i);
        }
    }

    fn move_ghost(&mut self, index: usize, action: Direction) {
        let ghost = &mut self.ghosts[index];
        ghost.position = action.apply(&ghost.position);
        ghost.direction = Some(action);
        ghost.scared_timer = ghost.scared_timer.saturating_sub(1);
        self.check_collision(index);
    }

    fn check_collision(&mut self, index: usize) {
        if self.win || self.lose || self.ghosts[index].position != self.pacman {
            return;
        }
        if self.ghosts[index].is_edible() {
            self.score += GHOST_SCORE;
            self.ghosts_eaten += 1;
            self.ghosts[index] = GhostState {
                position: self.ghost_starts[index],
                direction: None,
                scared_timer: 0,
            };
        } else {
            self.score -= LOSE_PENALTY;
            self.lose = true;
        }
    }
}

impl GameState for ClassicGame {
    fn walls(&self) -> &Walls {
        &self.walls
    }

    fn pacman_position(&self) -> Position {
        self.pacman
    }

    fn pacman_direction(&self) -> Option<Direction> {
        self.pacman_direction
    }

    fn num_agents(&self) -> usize {
        1 + self.ghosts.len()
    }

    fn legal_actions(&self, agent: usize) -> Vec<Direction> {
        if self.win || self.lose {
            return Vec::new();
        }
        if agent == PACMAN {
            return self.open_moves(self.pacman);
        }
        match self.ghosts.get(agent - 1) {
            Some(ghost) => self.ghost_legal_actions(ghost),
            None => Vec::new(),
        }
    }

    fn generate_successor(&self, agent: usize, action: Direction) -> Result<Self, GameError> {
        if self.win || self.lose {
            return Err(GameError::GameOver);
        }
        if agent >= self.num_agents() {
            return Err(GameError::UnknownAgent(agent));
        }
        if !self.legal_actions(agent).contains(&action) {
            let position = if agent == PACMAN {
                self.pacman
            } else {
                self.ghosts[agent - 1].position
            };
            return Err(GameError::IllegalAction {
                agent,
                action,
                position,
            });
        }

        let mut next = self.clone();
        if agent == PACMAN {
            next.move_pacman(action);
        } else {
            next.move_ghost(agent - 1, action);
        }
        Ok(next)
    }

    fn is_win(&self) -> bool {
        self.win
    }

    fn is_lose(&self) -> bool {
        self.lose
    }

    fn food_count(&self) -> usize {
        self.food_left
    }

    fn food_positions(&self) -> Vec<Position> {
        let width = self.walls.width();
        self.food
            .iter()
            .enumerate()
            .filter(|(_, has)| **has)
            .map(|(idx, _)| Position::new((idx % width) as i32, (idx / width) as i32))
            .collect()
    }

    fn has_food(&self, position: Position) -> bool {
        Self::cell_index(&self.walls, position)
            .map(|idx| self.food[idx])
            .unwrap_or(false)
    }

    fn capsules(&self) -> Vec<Position> {
        self.capsules.clone()
    }

    fn ghost_states(&self) -> Vec<GhostState> {
        self.ghosts.clone()
    }

    fn ghosts_eaten(&self) -> u32 {
        self.ghosts_eaten
    }

    fn score(&self) -> i32 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(text: &str) -> ClassicGame {
        ClassicGame::new(&Layout::parse(text).expect("layout should parse"))
    }

    #[test]
    fn test_eating_last_food_wins() {
        let state = game("%%%%\n%P.%\n%%%%\n");
        let next = state.generate_successor(PACMAN, Direction::East).unwrap();
        assert!(next.is_win());
        assert_eq!(next.food_count(), 0);
        assert_eq!(next.score(), FOOD_SCORE - TIME_PENALTY + WIN_SCORE);
        assert!(next.legal_actions(PACMAN).is_empty());
    }

    #[test]
    fn test_walking_into_ghost_loses() {
        let state = game("%%%%%\n%PG.%\n%%%%%\n");
        let next = state.generate_successor(PACMAN, Direction::East).unwrap();
        assert!(next.is_lose());
        assert!(matches!(
            next.generate_successor(PACMAN, Direction::West),
            Err(GameError::GameOver)
        ));
    }

    #[test]
    fn test_capsule_scares_ghosts_and_ghost_is_eaten() {
        let state = game("%%%%%%\n%PoG.%\n%%%%%%\n");
        let scared = state.generate_successor(PACMAN, Direction::East).unwrap();
        assert!(scared.ghost_states().iter().all(|g| g.scared_timer == SCARED_TIME));
        assert!(scared.capsules().is_empty());

        let eaten = scared.generate_successor(PACMAN, Direction::East).unwrap();
        assert!(!eaten.is_lose());
        assert_eq!(eaten.ghosts_eaten(), 1);
        assert_eq!(eaten.ghost_states()[0].position, Position::new(3, 1));
        assert_eq!(eaten.ghost_states()[0].scared_timer, 0);
    }

    #[test]
    fn test_illegal_move_is_an_error() {
        let state = game("%%%%\n%P.%\n%%%%\n");
        let result = state.generate_successor(PACMAN, Direction::North);
        assert_eq!(
            result.unwrap_err(),
            GameError::IllegalAction {
                agent: PACMAN,
                action: Direction::North,
                position: Position::new(1, 1),
            }
        );
    }

    #[test]
    fn test_ghost_cannot_reverse_unless_forced() {
        let state = game("%%%%%%%\n%P.G. %\n%%%%%%%\n");
        let moved = state.generate_successor(1, Direction::East).unwrap();
        assert_eq!(moved.legal_actions(1), vec![Direction::East]);

        let dead_end = moved.generate_successor(1, Direction::East).unwrap();
        assert_eq!(dead_end.legal_actions(1), vec![Direction::West]);
    }

    #[test]
    fn test_scared_timer_ticks_on_ghost_moves() {
        let state = game("%%%%%%%\n%Po. G%\n%%%%%%%\n");
        let scared = state.generate_successor(PACMAN, Direction::East).unwrap();
        let ticked = scared.generate_successor(1, Direction::West).unwrap();
        assert_eq!(ticked.ghost_states()[0].scared_timer, SCARED_TIME - 1);
    }
}
