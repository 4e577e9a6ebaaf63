// Core value types shared by the maze topology, the search tree and the engine
//
// Coordinates follow the layout convention: x grows east, y grows north, and the
// first text row of a layout is the northernmost row.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell in the maze grid
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Grid distance ignoring walls
    pub fn manhattan(&self, other: Position) -> usize {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four primitive moves available to every agent
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }

    /// Converts direction to its lowercase name, as used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    /// The move that undoes this one
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Calculates the next position when moving in this direction
    pub fn apply(&self, position: &Position) -> Position {
        match self {
            Direction::North => Position { x: position.x, y: position.y + 1 },
            Direction::South => Position { x: position.x, y: position.y - 1 },
            Direction::East => Position { x: position.x + 1, y: position.y },
            Direction::West => Position { x: position.x - 1, y: position.y },
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lens through which accumulated rewards are read when choosing a move
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tactic {
    Survival,
    Pill,
    Ghost,
}

impl Tactic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tactic::Survival => "survival",
            Tactic::Pill => "pill",
            Tactic::Ghost => "ghost",
        }
    }

    /// Order in which tactics are tried at action selection: the current one
    /// first, then ghost, pill and survival, without repeats.
    pub fn priority_order(current: Tactic) -> Vec<Tactic> {
        let mut order = vec![current];
        for tactic in [Tactic::Ghost, Tactic::Pill, Tactic::Survival] {
            if !order.contains(&tactic) {
                order.push(tactic);
            }
        }
        order
    }
}

impl fmt::Display for Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished game, seen from pacman's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
}
