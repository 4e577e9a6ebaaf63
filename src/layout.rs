// Maze layouts in the classic text format
//
//   %  wall        .  food        o  capsule
//   P  pacman      G  ghost          (space) empty corridor
//
// The first line of the text is the top row of the maze, so it maps to the
// largest y coordinate.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::Position;

/// Errors raised while reading a layout
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout file: {0}")]
    Io(#[from] std::io::Error),
    #[error("layout is empty")]
    Empty,
    #[error("layout row {row} has width {found}, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("layout has no pacman start ('P')")]
    MissingPacman,
    #[error("unknown layout glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph { glyph: char, row: usize, column: usize },
}

/// Static wall map. Anything outside the grid reads as a wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walls {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Walls {
    /// Creates an open grid with no walls
    pub fn new(width: usize, height: usize) -> Self {
        Walls {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        let (x, y) = (position.x as usize, position.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn is_wall(&self, position: Position) -> bool {
        match self.index(position) {
            Some(idx) => self.cells[idx],
            None => true,
        }
    }

    pub fn set_wall(&mut self, position: Position, wall: bool) {
        if let Some(idx) = self.index(position) {
            self.cells[idx] = wall;
        }
    }

    /// Iterates over every open (non-wall) cell
    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| {
                let pos = Position::new(x as i32, y as i32);
                if self.is_wall(pos) {
                    None
                } else {
                    Some(pos)
                }
            })
        })
    }
}

/// A parsed maze with its initial pieces
#[derive(Debug, Clone)]
pub struct Layout {
    pub walls: Walls,
    pub food: Vec<Position>,
    pub capsules: Vec<Position>,
    pub pacman_start: Position,
    pub ghost_starts: Vec<Position>,
}

impl Layout {
    /// Parses a layout from its text form
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .collect();

        if rows.is_empty() {
            return Err(LayoutError::Empty);
        }

        let width = rows[0].chars().count();
        let height = rows.len();
        let mut walls = Walls::new(width, height);
        let mut food = Vec::new();
        let mut capsules = Vec::new();
        let mut pacman_start = None;
        let mut ghost_starts = Vec::new();

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }

            let y = (height - 1 - row) as i32;
            for (column, glyph) in line.chars().enumerate() {
                let pos = Position::new(column as i32, y);
                match glyph {
                    '%' => walls.set_wall(pos, true),
                    '.' => food.push(pos),
                    'o' => capsules.push(pos),
                    'P' => pacman_start = Some(pos),
                    'G' => ghost_starts.push(pos),
                    ' ' => {}
                    _ => return Err(LayoutError::UnknownGlyph { glyph, row, column }),
                }
            }
        }

        Ok(Layout {
            walls,
            food,
            capsules,
            pacman_start: pacman_start.ok_or(LayoutError::MissingPacman)?,
            ghost_starts,
        })
    }

    /// Reads and parses a layout file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }
}
