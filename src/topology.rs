// Maze topology cache
//
// Everything here is a pure function of the static wall map, so results are
// memoised for the lifetime of a game. Caches use interior mutability because
// topology queries happen while the search holds shared borrows of the tree.
// A topology is owned by exactly one search tree and never crosses threads.

use log::trace;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::rc::Rc;

use crate::layout::Walls;
use crate::types::{Direction, Position};

/// Cost reported for unreachable targets
pub const UNREACHABLE: usize = usize::MAX;

/// A corridor walked from a cell to the next junction or dead end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroEdge {
    pub destination: Position,
    pub actions: Vec<Direction>,
}

impl MacroEdge {
    /// First primitive move of the edge
    pub fn first_action(&self) -> Direction {
        self.actions[0]
    }

    /// Cells visited along the edge, excluding the origin and including the destination
    pub fn cells(&self, origin: Position) -> Vec<Position> {
        let mut cells = Vec::with_capacity(self.actions.len());
        let mut pos = origin;
        for action in &self.actions {
            pos = action.apply(&pos);
            cells.push(pos);
        }
        cells
    }
}

/// Shortest path between two cells. `cost == UNREACHABLE` with no actions when
/// the target cannot be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub cost: usize,
    pub actions: Rc<[Direction]>,
}

impl Route {
    fn unreachable() -> Self {
        Route {
            cost: UNREACHABLE,
            actions: Rc::from(Vec::new()),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.cost != UNREACHABLE
    }

    /// Reversed path with every move mirrored
    fn reversed(&self) -> Self {
        let actions: Vec<Direction> = self.actions.iter().rev().map(|a| a.opposite()).collect();
        Route {
            cost: self.cost,
            actions: Rc::from(actions),
        }
    }
}

/// Frontier entry for the A* search; ordered so the heap pops the lowest estimate
#[derive(Debug, PartialEq, Eq)]
struct Frontier {
    estimate: usize,
    cost: usize,
    position: Position,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Junction, legal-move, macro-successor and shortest-path lookups over a wall map
#[derive(Debug)]
pub struct MazeTopology {
    walls: Walls,
    junctions: RefCell<HashMap<Position, bool>>,
    legal: RefCell<HashMap<Position, Vec<Direction>>>,
    successors: RefCell<HashMap<Position, Rc<[MacroEdge]>>>,
    paths: RefCell<HashMap<(Position, Position), Route>>,
}

impl MazeTopology {
    pub fn new(walls: Walls) -> Self {
        MazeTopology {
            walls,
            junctions: RefCell::new(HashMap::new()),
            legal: RefCell::new(HashMap::new()),
            successors: RefCell::new(HashMap::new()),
            paths: RefCell::new(HashMap::new()),
        }
    }

    pub fn walls(&self) -> &Walls {
        &self.walls
    }

    pub fn is_wall(&self, position: Position) -> bool {
        self.walls.is_wall(position)
    }

    /// True iff the cell is open and has more than two open neighbours
    pub fn is_junction(&self, position: Position) -> bool {
        if let Some(&cached) = self.junctions.borrow().get(&position) {
            return cached;
        }
        let junction = !self.walls.is_wall(position) && self.legal_moves(position).len() > 2;
        self.junctions.borrow_mut().insert(position, junction);
        junction
    }

    /// Directions leading to an open neighbour. Empty for walls.
    pub fn legal_moves(&self, position: Position) -> Vec<Direction> {
        if let Some(cached) = self.legal.borrow().get(&position) {
            return cached.clone();
        }
        let moves: Vec<Direction> = if self.walls.is_wall(position) {
            Vec::new()
        } else {
            Direction::all()
                .iter()
                .copied()
                .filter(|dir| !self.walls.is_wall(dir.apply(&position)))
                .collect()
        };
        self.legal.borrow_mut().insert(position, moves.clone());
        moves
    }

    /// One macro-edge per legal move from `position`, each following the corridor
    /// until a junction or a dead end. Computed on first request.
    pub fn macro_successors(&self, position: Position) -> Rc<[MacroEdge]> {
        if let Some(cached) = self.successors.borrow().get(&position) {
            return Rc::clone(cached);
        }

        let edges: Vec<MacroEdge> = self
            .legal_moves(position)
            .into_iter()
            .map(|action| self.walk_corridor(position, action))
            .collect();
        let edges: Rc<[MacroEdge]> = Rc::from(edges);
        self.successors
            .borrow_mut()
            .insert(position, Rc::clone(&edges));
        edges
    }

    /// The macro-edge leaving `position` with first move `action`, if that move is legal
    pub fn edge_towards(&self, position: Position, action: Direction) -> Option<MacroEdge> {
        self.macro_successors(position)
            .iter()
            .find(|edge| edge.first_action() == action)
            .cloned()
    }

    fn walk_corridor(&self, origin: Position, first: Direction) -> MacroEdge {
        let mut actions = vec![first];
        let mut pos = first.apply(&origin);

        // A ring corridor without junctions would otherwise walk forever
        while pos != origin && !self.is_junction(pos) {
            let moves = self.legal_moves(pos);
            if moves.len() <= 1 {
                break;
            }
            let last = actions[actions.len() - 1];
            let next = match moves.into_iter().find(|m| *m != last.opposite()) {
                Some(next) => next,
                None => break,
            };
            actions.push(next);
            pos = next.apply(&pos);
        }

        MacroEdge {
            destination: pos,
            actions,
        }
    }

    /// Shortest path over primitive moves. The reverse route is cached alongside.
    pub fn shortest_path(&self, from: Position, to: Position) -> Route {
        if from == to {
            return Route {
                cost: 0,
                actions: Rc::from(Vec::new()),
            };
        }
        if let Some(route) = self.paths.borrow().get(&(from, to)) {
            return route.clone();
        }

        let route = self.a_star(from, to);
        trace!("path {} -> {} costs {}", from, to, route.cost);

        let mut paths = self.paths.borrow_mut();
        paths.insert((to, from), route.reversed());
        paths.insert((from, to), route.clone());
        route
    }

    /// Maze distance, or `None` when unreachable
    pub fn distance(&self, from: Position, to: Position) -> Option<usize> {
        let route = self.shortest_path(from, to);
        if route.is_reachable() {
            Some(route.cost)
        } else {
            None
        }
    }

    fn a_star(&self, from: Position, to: Position) -> Route {
        if self.walls.is_wall(from) || self.walls.is_wall(to) {
            return Route::unreachable();
        }

        let mut heap = BinaryHeap::new();
        let mut best: HashMap<Position, usize> = HashMap::new();
        let mut came_from: HashMap<Position, (Position, Direction)> = HashMap::new();
        let mut closed: HashSet<Position> = HashSet::new();

        best.insert(from, 0);
        heap.push(Frontier {
            estimate: from.manhattan(to),
            cost: 0,
            position: from,
        });

        while let Some(Frontier { cost, position, .. }) = heap.pop() {
            if position == to {
                return Route {
                    cost,
                    actions: Rc::from(Self::rebuild(&came_from, from, to)),
                };
            }
            if !closed.insert(position) {
                continue;
            }

            for action in self.legal_moves(position) {
                let next = action.apply(&position);
                let next_cost = cost + 1;
                if best.get(&next).map_or(true, |&known| next_cost < known) {
                    best.insert(next, next_cost);
                    came_from.insert(next, (position, action));
                    heap.push(Frontier {
                        estimate: next_cost + next.manhattan(to),
                        cost: next_cost,
                        position: next,
                    });
                }
            }
        }

        Route::unreachable()
    }

    fn rebuild(
        came_from: &HashMap<Position, (Position, Direction)>,
        from: Position,
        to: Position,
    ) -> Vec<Direction> {
        let mut actions = Vec::new();
        let mut pos = to;
        while pos != from {
            match came_from.get(&pos) {
                Some(&(prev, action)) => {
                    actions.push(action);
                    pos = prev;
                }
                None => break,
            }
        }
        actions.reverse();
        actions
    }
}
