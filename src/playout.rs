// Heuristic rollout policy for pacman
//
// Used whenever a simulation runs out of predetermined moves. Decisions are
// made per macro-edge at junctions; inside a corridor pacman keeps its heading
// and turns back at most once per segment.

use log::trace;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::game::{GameState, GhostState, PACMAN};
use crate::topology::{MacroEdge, MazeTopology};
use crate::types::{Direction, Position};

pub struct PlayoutPolicy<'a> {
    topology: &'a MazeTopology,
    collision_tolerance: usize,
    /// Set once pacman has turned back in the current corridor segment
    reversed: bool,
}

impl<'a> PlayoutPolicy<'a> {
    pub fn new(topology: &'a MazeTopology, collision_tolerance: usize) -> Self {
        PlayoutPolicy {
            topology,
            collision_tolerance,
            reversed: false,
        }
    }

    /// Next move for pacman. `just_ate_capsule` marks the step right after a
    /// capsule was eaten. Returns `None` only when pacman has no legal move.
    pub fn choose<S: GameState, R: Rng + ?Sized>(
        &mut self,
        state: &S,
        just_ate_capsule: bool,
        rng: &mut R,
    ) -> Option<Direction> {
        let position = state.pacman_position();
        let legal = state.legal_actions(PACMAN);
        if legal.len() <= 1 {
            return legal.first().copied();
        }

        let forward = state
            .pacman_direction()
            .and_then(|heading| legal.iter().copied().find(|d| *d != heading.opposite()));

        match forward {
            Some(forward) if !self.topology.is_junction(position) => {
                Some(self.in_corridor(state, position, forward, just_ate_capsule))
            }
            _ => {
                self.reversed = false;
                self.at_junction(state, position, &legal, rng)
            }
        }
    }

    fn at_junction<S: GameState, R: Rng + ?Sized>(
        &self,
        state: &S,
        position: Position,
        legal: &[Direction],
        rng: &mut R,
    ) -> Option<Direction> {
        let ghosts = state.ghost_states();
        let edges = self.topology.macro_successors(position);
        let safe: Vec<&MacroEdge> = edges
            .iter()
            .filter(|edge| self.edge_is_safe(position, edge, &ghosts))
            .collect();

        let safe_moves: Vec<Direction> = safe.iter().map(|edge| edge.first_action()).collect();
        if let Some(action) = self.chase_direction(position, &ghosts, &safe_moves) {
            trace!("playout at {} chasing {}", position, action);
            return Some(action);
        }

        let capsules = state.capsules();
        let with_food: Vec<&MacroEdge> = safe
            .iter()
            .copied()
            .filter(|edge| {
                edge.cells(position)
                    .iter()
                    .any(|cell| state.has_food(*cell) || capsules.contains(cell))
            })
            .collect();
        if let Some(edge) = with_food.choose(rng) {
            return Some(edge.first_action());
        }

        let useful: Vec<&MacroEdge> = safe
            .iter()
            .copied()
            .filter(|edge| self.topology.is_junction(edge.destination))
            .collect();
        if let Some(edge) = useful.choose(rng) {
            return Some(edge.first_action());
        }

        if let Some(edge) = safe.choose(rng) {
            return Some(edge.first_action());
        }

        legal.choose(rng).copied()
    }

    fn in_corridor<S: GameState>(
        &mut self,
        state: &S,
        position: Position,
        forward: Direction,
        just_ate_capsule: bool,
    ) -> Direction {
        if self.reversed {
            return forward;
        }

        let backward = match state.pacman_direction() {
            Some(heading) => heading.opposite(),
            None => return forward,
        };
        let ghosts = state.ghost_states();
        let ahead = forward.apply(&position);
        let behind = backward.apply(&position);

        // Only ghosts coming down the corridor towards pacman count as a threat
        let threatened = self.topology.edge_towards(position, forward).map_or(false, |edge| {
            ghosts.iter().any(|ghost| {
                self.approaches_through(ghost, position, ahead)
                    && !self.edge_is_safe(position, &edge, std::slice::from_ref(ghost))
            })
        });
        let diverted = just_ate_capsule
            && self.chase_direction(position, &ghosts, &[forward, backward]) == Some(backward);
        let blocked = ghosts.iter().any(|ghost| {
            ghost.scared_timer <= 1
                && self
                    .topology
                    .distance(ghost.position, behind)
                    .map_or(false, |d| d <= 1)
        });

        if (threatened || diverted) && !blocked {
            self.reversed = true;
            backward
        } else {
            forward
        }
    }

    /// An edge is unsafe when a ghost that is dangerous by then can reach one
    /// of its cells no later than pacman, or reach the destination within the
    /// collision tolerance of pacman's arrival.
    fn edge_is_safe(&self, origin: Position, edge: &MacroEdge, ghosts: &[GhostState]) -> bool {
        let cells = edge.cells(origin);
        let arrival = cells.len();

        for ghost in ghosts {
            let dangerous_at = |step: usize| ghost.scared_timer as usize <= step;

            for (i, cell) in cells.iter().enumerate() {
                let step = i + 1;
                if !dangerous_at(step) {
                    continue;
                }
                if let Some(d) = self.topology.distance(ghost.position, *cell) {
                    if d <= step {
                        return false;
                    }
                }
            }

            if dangerous_at(arrival) {
                if let Some(d) = self.topology.distance(ghost.position, edge.destination) {
                    if d <= arrival + self.collision_tolerance {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// True when the ghost's shortest way to `position` runs through `neighbour`
    fn approaches_through(&self, ghost: &GhostState, position: Position, neighbour: Position) -> bool {
        match (
            self.topology.distance(ghost.position, neighbour),
            self.topology.distance(ghost.position, position),
        ) {
            (Some(via), Some(direct)) => via < direct,
            _ => false,
        }
    }

    /// First move towards the nearest edible ghost that can be caught before
    /// its scared timer runs out, among the moves in `allowed`
    fn chase_direction(&self, position: Position, ghosts: &[GhostState], allowed: &[Direction]) -> Option<Direction> {
        ghosts
            .iter()
            .filter(|ghost| ghost.is_edible())
            .filter_map(|ghost| {
                let route = self.topology.shortest_path(position, ghost.position);
                if route.is_reachable() && route.cost > 0 && (ghost.scared_timer as usize) > route.cost {
                    Some((route.cost, route.actions[0]))
                } else {
                    None
                }
            })
            .filter(|(_, action)| allowed.contains(action))
            .min_by_key(|(cost, _)| *cost)
            .map(|(_, action)| action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classic::ClassicGame;
    use crate::layout::Layout;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(text: &str) -> (ClassicGame, MazeTopology) {
        let layout = Layout::parse(text).unwrap();
        let topology = MazeTopology::new(layout.walls.clone());
        (ClassicGame::new(&layout), topology)
    }

    #[test]
    fn test_avoids_edge_with_ghost_in_it() {
        // Pacman at the junction (3, 2); a ghost waits in the eastern corridor
        let (state, topology) = setup(
            "\
%%%%%%%%%
%%%.%%%%%
%. P  G.%
%%%.%%%%%
%%%%%%%%%
",
        );
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..30 {
            let mut policy = PlayoutPolicy::new(&topology, 1);
            let action = policy.choose(&state, false, &mut rng).unwrap();
            assert_ne!(action, Direction::East);
        }
    }

    #[test]
    fn test_prefers_edge_with_food() {
        let (state, topology) = setup(
            "\
%%%%%%%
%%% %%%
%  P .%
%%% %%%
%%%%%%%
",
        );
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let mut policy = PlayoutPolicy::new(&topology, 1);
            assert_eq!(policy.choose(&state, false, &mut rng), Some(Direction::East));
        }
    }

    #[test]
    fn test_falls_back_to_legal_move_when_nothing_is_safe() {
        let (state, topology) = setup(
            "\
%%%%%
%G%G%
%.P.%
%%%%%
",
        );
        let legal = state.legal_actions(PACMAN);
        let mut rng = StdRng::seed_from_u64(9);
        let mut policy = PlayoutPolicy::new(&topology, 1);
        let action = policy.choose(&state, false, &mut rng).unwrap();
        assert!(legal.contains(&action));
    }

    #[test]
    fn test_keeps_heading_in_corridor() {
        let (state, topology) = setup(
            "\
%%%%%%%%
%P    .%
%%%%%%%%
",
        );
        let state = state.generate_successor(PACMAN, Direction::East).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut policy = PlayoutPolicy::new(&topology, 1);
        assert_eq!(policy.choose(&state, false, &mut rng), Some(Direction::East));
    }

    #[test]
    fn test_reverses_once_when_ghost_ahead() {
        let (state, topology) = setup(
            "\
%%%%%%%%%%
%P     G.%
%%%%%%%%%%
",
        );
        let mut state = state.generate_successor(PACMAN, Direction::East).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let mut policy = PlayoutPolicy::new(&topology, 1);
        assert_eq!(policy.choose(&state, false, &mut rng), Some(Direction::West));

        // Already turned back in this segment: no second reversal
        state = state.generate_successor(PACMAN, Direction::West).unwrap();
        state = state.generate_successor(PACMAN, Direction::East).unwrap();
        assert_eq!(policy.choose(&state, false, &mut rng), Some(Direction::East));
    }

    #[test]
    fn test_ghost_following_behind_does_not_turn_pacman_around() {
        // Junction at (8, 2); the ghost trails one cell behind pacman
        let (state, topology) = setup(
            "\
%%%%%%%%%%
%%%%%%%%.%
%GP      %
%%%%%%%%.%
%%%%%%%%%%
",
        );
        let state = state.generate_successor(PACMAN, Direction::East).unwrap();
        let state = state.generate_successor(1, Direction::East).unwrap();
        assert_eq!(state.pacman_position(), Position::new(3, 2));
        assert_eq!(state.ghost_states()[0].position, Position::new(2, 2));

        let mut rng = StdRng::seed_from_u64(6);
        let mut policy = PlayoutPolicy::new(&topology, 1);
        assert_eq!(policy.choose(&state, false, &mut rng), Some(Direction::East));
    }

    #[test]
    fn test_no_reversal_into_ghost_behind() {
        // One ghost comes up the corridor ahead, the other sits right behind
        let (state, topology) = setup(
            "\
%%%%%%%%%%
%GP   G.%%
%%%%%%%%%%
",
        );
        let state = state.generate_successor(PACMAN, Direction::East).unwrap();
        let state = state.generate_successor(1, Direction::East).unwrap();
        assert_eq!(state.ghost_states()[0].position, Position::new(2, 1));

        let mut rng = StdRng::seed_from_u64(6);
        let mut policy = PlayoutPolicy::new(&topology, 1);
        assert_eq!(policy.choose(&state, false, &mut rng), Some(Direction::East));
    }

    #[test]
    fn test_turns_back_for_edible_ghost_after_capsule() {
        let (state, topology) = setup(
            "\
%%%%%%%%%%
%G.Po    %
%%%%%%%%%%
",
        );
        let state = state.generate_successor(PACMAN, Direction::East).unwrap();
        assert!(state.ghost_states()[0].is_edible());

        let mut rng = StdRng::seed_from_u64(12);
        let mut policy = PlayoutPolicy::new(&topology, 1);
        assert_eq!(policy.choose(&state, false, &mut rng), Some(Direction::East));
        assert_eq!(policy.choose(&state, true, &mut rng), Some(Direction::West));
    }

    #[test]
    fn test_chase_skips_ghosts_behind_disallowed_moves() {
        let (_, topology) = setup(
            "\
%%%%%%%%%%%
%P        %
%%%%%%%%%%%
",
        );
        let policy = PlayoutPolicy::new(&topology, 1);
        let ghost = |x, scared_timer| GhostState {
            position: Position::new(x, 1),
            direction: None,
            scared_timer,
        };
        let ghosts = [ghost(3, 20), ghost(9, 20)];
        let here = Position::new(5, 1);

        let both = [Direction::East, Direction::West];
        assert_eq!(policy.chase_direction(here, &ghosts, &both), Some(Direction::West));
        assert_eq!(policy.chase_direction(here, &ghosts, &[Direction::East]), Some(Direction::East));

        // Out of time for the far ghost
        let ghosts = [ghost(3, 20), ghost(9, 4)];
        assert_eq!(policy.chase_direction(here, &ghosts, &[Direction::East]), None);
    }

    #[test]
    fn test_chases_edible_ghost() {
        // Capsule eaten at (2, 2); the scared ghost sits north of the junction
        let (state, topology) = setup(
            "\
%%%%%%%
%%%G%%%
%%% %%%
%Po .%%
%%% %%%
%%%%%%%
",
        );
        let state = state.generate_successor(PACMAN, Direction::East).unwrap();
        let state = state.generate_successor(PACMAN, Direction::East).unwrap();
        assert!(state.ghost_states()[0].is_edible());
        let mut rng = StdRng::seed_from_u64(8);
        let mut policy = PlayoutPolicy::new(&topology, 1);
        assert_eq!(policy.choose(&state, true, &mut rng), Some(Direction::North));
    }
}
