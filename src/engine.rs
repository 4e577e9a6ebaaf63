// Monte Carlo tree search over macro-edges
//
// One decision runs Select -> Expand -> Simulate -> Backpropagate cycles until
// the deadline, then picks a root child through the tactic ladder. Simulated
// time is counted from the real state, so the steps replayed while descending
// the tree count towards the horizon.

use log::{debug, error, trace};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::time::Instant;

use crate::adversary::AdversaryModel;
use crate::config::{Config, EvaluationConfig, PlayoutConfig, SearchConfig, TacticsConfig};
use crate::error::SearchError;
use crate::game::{GameState, PACMAN};
use crate::node::{NodeId, Rewards};
use crate::playout::PlayoutPolicy;
use crate::topology::{MacroEdge, MazeTopology};
use crate::tree::SearchTree;
use crate::types::{Direction, Outcome, Tactic};

/// Counters for one call to `search`
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStats {
    pub iterations: u64,
    pub terminal_selections: u64,
    pub expansions: u64,
    pub max_depth: usize,
    pub elapsed_ms: u64,
}

/// How a descent ended
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// The game was decided while replaying the path; no simulation needed
    Terminal { outcome: Outcome, node: NodeId },
    /// A node to simulate from, with the edge moves still to be played
    Expanded {
        node: NodeId,
        predetermined: Vec<Direction>,
    },
}

/// A simulated game advanced from the real decision state, with everything
/// the evaluation needs
#[derive(Debug, Clone)]
pub struct Rollout<S> {
    state: S,
    steps: usize,
    start_food: usize,
    capture_value: f64,
    capsule_eaten: bool,
    just_ate_capsule: bool,
    stopped: bool,
}

impl<S: GameState> Rollout<S> {
    pub fn new(state: &S) -> Self {
        Rollout {
            state: state.clone(),
            steps: 0,
            start_food: state.food_count(),
            capture_value: 0.0,
            capsule_eaten: false,
            just_ate_capsule: false,
            stopped: false,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Food eaten since the decision state
    pub fn food_eaten(&self) -> usize {
        self.start_food.saturating_sub(self.state.food_count())
    }

    /// Sum of scared time left on ghosts at the moment they were eaten
    pub fn capture_value(&self) -> f64 {
        self.capture_value
    }

    pub fn capsule_eaten(&self) -> bool {
        self.capsule_eaten
    }

    fn is_finished(&self, horizon: usize) -> bool {
        self.stopped || self.steps >= horizon || self.state.is_terminal()
    }

    fn outcome(&self) -> Option<Outcome> {
        if self.state.is_win() {
            Some(Outcome::Win)
        } else if self.state.is_lose() {
            Some(Outcome::Lose)
        } else {
            None
        }
    }

    /// One timestep: pacman moves, then every ghost under `model`
    fn advance<R: Rng + ?Sized>(
        &mut self,
        action: Direction,
        remaining: &[Direction],
        model: AdversaryModel,
        rng: &mut R,
    ) -> Result<(), SearchError> {
        let capsules = self.state.capsules().len();
        self.apply(PACMAN, action, remaining)?;
        self.just_ate_capsule = self.state.capsules().len() < capsules;
        if self.just_ate_capsule {
            self.capsule_eaten = true;
        }

        for agent in 1..self.state.num_agents() {
            if self.state.is_terminal() {
                break;
            }
            if let Some(ghost_action) = model.choose(&self.state, agent, rng) {
                self.apply(agent, ghost_action, remaining)?;
            }
        }
        self.steps += 1;
        Ok(())
    }

    fn apply(&mut self, agent: usize, action: Direction, remaining: &[Direction]) -> Result<(), SearchError> {
        let before = self.state.ghost_states();
        let eaten = self.state.ghosts_eaten();
        let next = transition(&self.state, agent, action, remaining)?;

        let captured = next.ghosts_eaten().saturating_sub(eaten) as usize;
        if captured > 0 {
            let after = next.ghost_states();
            let mut residual: Vec<u32> = before
                .iter()
                .zip(after.iter())
                .filter(|(b, a)| b.scared_timer > 0 && a.scared_timer == 0)
                .map(|(b, _)| b.scared_timer)
                .collect();
            residual.sort_unstable_by(|a, b| b.cmp(a));
            self.capture_value += residual.iter().take(captured).map(|t| *t as f64).sum::<f64>();

            // The capsule has paid off; nothing left to learn from this rollout
            if self.capsule_eaten {
                self.stopped = true;
            }
        }

        self.state = next;
        Ok(())
    }
}

/// Applies one simulated move, logging everything needed to reproduce a failure
fn transition<S: GameState>(
    state: &S,
    agent: usize,
    action: Direction,
    remaining: &[Direction],
) -> Result<S, SearchError> {
    state.generate_successor(agent, action).map_err(|source| {
        let legal = state.legal_actions(agent);
        let position = if agent == PACMAN {
            state.pacman_position()
        } else {
            state
                .ghost_states()
                .get(agent - 1)
                .map(|g| g.position)
                .unwrap_or_else(|| state.pacman_position())
        };
        error!(
            "Simulated transition failed: agent {} action {} at {} remaining {:?} legal {:?}: {}\nstate: {:?}",
            agent, action, position, remaining, legal, source, state
        );
        SearchError::Transition {
            agent,
            action,
            position,
            remaining: remaining.to_vec(),
            legal,
            source,
        }
    })
}

fn compare(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Search driver. Holds the tunables, the RNG and the tactic carried between
/// decisions; the tree itself is owned by the caller.
pub struct MctsEngine {
    search: SearchConfig,
    tactics: TacticsConfig,
    evaluation: EvaluationConfig,
    playout: PlayoutConfig,
    rng: StdRng,
    tactic: Tactic,
    initial_food: usize,
}

impl MctsEngine {
    pub fn new(config: &Config) -> Self {
        let rng = match config.search.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        MctsEngine {
            search: config.search.clone(),
            tactics: config.tactics.clone(),
            evaluation: config.evaluation.clone(),
            playout: config.playout.clone(),
            rng,
            tactic: Tactic::Survival,
            initial_food: 0,
        }
    }

    /// Forgets per-game state. `food` is the food count of the opening position.
    pub fn start_game(&mut self, food: usize) {
        self.tactic = Tactic::Survival;
        self.initial_food = food;
    }

    /// Tactic locked in by the last decision
    pub fn current_tactic(&self) -> Tactic {
        self.tactic
    }

    fn uct_tactic(&self) -> Tactic {
        if self.tactics.enabled {
            self.tactic
        } else {
            Tactic::Pill
        }
    }

    /// Runs search cycles on `tree` until `deadline` or the iteration cap.
    /// The deadline is checked between cycles only.
    pub fn search<S: GameState>(
        &mut self,
        tree: &mut SearchTree,
        state: &S,
        deadline: Instant,
    ) -> Result<SearchStats, SearchError> {
        let started = Instant::now();
        let mut stats = SearchStats::default();
        self.initial_food = self.initial_food.max(state.food_count());
        let tactic = self.uct_tactic();

        while Instant::now() < deadline
            && (self.search.max_iterations == 0 || stats.iterations < self.search.max_iterations)
        {
            let (selected, mut rollout) = self.select(tree, state, tactic)?;
            match selected {
                SelectOutcome::Terminal { outcome, node } => {
                    stats.terminal_selections += 1;
                    let delta = match outcome {
                        Outcome::Win => Rewards::new(0.0, self.evaluation.terminal_bonus, 0.0),
                        Outcome::Lose => Rewards::new(-self.evaluation.terminal_penalty, 0.0, 0.0),
                    };
                    tree.perturb(node, delta);
                    let rewards = self.evaluate(&rollout);
                    self.backpropagate(tree, node, rewards);
                }
                SelectOutcome::Expanded { node, predetermined } => {
                    if !predetermined.is_empty() {
                        stats.expansions += 1;
                    }
                    self.simulate(tree.topology(), &mut rollout, predetermined)?;
                    let rewards = self.evaluate(&rollout);
                    self.backpropagate(tree, node, rewards);
                }
            }
            stats.iterations += 1;
        }

        stats.max_depth = tree.depth();
        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(
            "Search: {} iterations, {} expansions, {} terminal, depth {}, {} nodes in {}ms",
            stats.iterations,
            stats.expansions,
            stats.terminal_selections,
            stats.max_depth,
            tree.len(),
            stats.elapsed_ms
        );
        Ok(stats)
    }

    /// Descends from the root, replaying each traversed edge on a copy of the
    /// real state. Stops at the first expandable node, a dead end, the horizon,
    /// or a decided game.
    pub fn select<S: GameState>(
        &mut self,
        tree: &mut SearchTree,
        state: &S,
        tactic: Tactic,
    ) -> Result<(SelectOutcome, Rollout<S>), SearchError> {
        let mut rollout = Rollout::new(state);
        let mut current = tree.root();

        loop {
            if rollout.is_finished(self.search.horizon) {
                return Ok((Self::leaf(current), rollout));
            }

            let candidates = self.candidate_edges(tree, current);
            if candidates.is_empty() {
                return Ok((Self::leaf(current), rollout));
            }

            let unexpanded: Vec<&MacroEdge> = candidates
                .iter()
                .filter(|edge| tree.child_by_action(current, edge.first_action()).is_none())
                .collect();
            if let Some(edge) = unexpanded.choose(&mut self.rng) {
                let edge = (*edge).clone();
                let child = self.expand(tree, current, &edge);
                let selected = SelectOutcome::Expanded {
                    node: child,
                    predetermined: edge.actions,
                };
                return Ok((selected, rollout));
            }

            let children: Vec<NodeId> = candidates
                .iter()
                .filter_map(|edge| tree.child_by_action(current, edge.first_action()))
                .collect();
            let next = self.pick_child(tree, &children, tactic);

            let actions = tree.node(next).actions().to_vec();
            for (i, action) in actions.iter().enumerate() {
                rollout.advance(*action, &actions[i + 1..], self.search.adversary_model, &mut self.rng)?;
                if let Some(outcome) = rollout.outcome() {
                    return Ok((SelectOutcome::Terminal { outcome, node: next }, rollout));
                }
                if rollout.is_finished(self.search.horizon) {
                    return Ok((Self::leaf(next), rollout));
                }
            }
            current = next;
        }
    }

    fn leaf(node: NodeId) -> SelectOutcome {
        SelectOutcome::Expanded {
            node,
            predetermined: Vec::new(),
        }
    }

    /// Macro-edges out of a node, minus the way back except at the root
    fn candidate_edges(&self, tree: &SearchTree, id: NodeId) -> Vec<MacroEdge> {
        let node = tree.node(id);
        let edges = tree.topology().macro_successors(node.position());
        let back = if id == tree.root() {
            None
        } else {
            node.last_action().map(|a| a.opposite())
        };
        edges
            .iter()
            .filter(|edge| Some(edge.first_action()) != back)
            .cloned()
            .collect()
    }

    /// Random child still under the visit threshold, else the best UCT score
    fn pick_child(&mut self, tree: &SearchTree, children: &[NodeId], tactic: Tactic) -> NodeId {
        let cold: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|&c| tree.node(c).visits() < self.search.visit_threshold)
            .collect();
        if let Some(&child) = cold.choose(&mut self.rng) {
            return child;
        }

        let exploration = self.search.exploration_constant;
        children
            .iter()
            .copied()
            .max_by(|&a, &b| {
                compare(
                    tree.uct_score(a, tactic, exploration),
                    tree.uct_score(b, tactic, exploration),
                )
            })
            .unwrap_or(children[0])
    }

    /// Adds the child reached through `edge`
    pub fn expand(&self, tree: &mut SearchTree, parent: NodeId, edge: &MacroEdge) -> NodeId {
        trace!(
            "Expanding {} -> {} via {:?}",
            tree.node(parent).position(),
            edge.destination,
            edge.actions
        );
        tree.add_child(parent, edge.destination, edge.actions.clone())
    }

    /// Plays the predetermined moves, then the playout policy, until the
    /// horizon or the end of the game
    pub fn simulate<S: GameState>(
        &mut self,
        topology: &MazeTopology,
        rollout: &mut Rollout<S>,
        predetermined: Vec<Direction>,
    ) -> Result<(), SearchError> {
        let mut policy = PlayoutPolicy::new(topology, self.playout.collision_tolerance);
        let mut queue: VecDeque<Direction> = predetermined.into();

        while !rollout.is_finished(self.search.horizon) {
            let legal = rollout.state.legal_actions(PACMAN);
            let planned = queue.front().copied().filter(|a| legal.contains(a));
            let action = match planned {
                Some(_) => queue.pop_front(),
                None => {
                    queue.clear();
                    policy.choose(&rollout.state, rollout.just_ate_capsule, &mut self.rng)
                }
            };
            let action = match action {
                Some(action) => action,
                None => break,
            };
            let remaining: Vec<Direction> = queue.iter().copied().collect();
            rollout.advance(action, &remaining, self.search.adversary_model, &mut self.rng)?;
        }
        Ok(())
    }

    /// Maps a finished rollout onto the three reward channels
    pub fn evaluate<S: GameState>(&self, rollout: &Rollout<S>) -> Rewards {
        let survival = if rollout.state.is_lose() { 0.0 } else { 1.0 };
        let mut pill = if self.initial_food > 0 {
            rollout.food_eaten() as f64 / self.initial_food as f64
        } else {
            0.0
        };
        let ghost = if self.evaluation.max_ghost_value > 0.0 {
            (rollout.capture_value / self.evaluation.max_ghost_value).min(1.0)
        } else {
            0.0
        };

        if self.evaluation.long_term_goal_enabled && rollout.capsule_eaten {
            if ghost >= self.evaluation.strong_payoff_threshold {
                pill += ghost;
            } else {
                pill = 0.0;
            }
        }

        Rewards::new(survival, pill, ghost)
    }

    pub fn backpropagate(&self, tree: &mut SearchTree, node: NodeId, rewards: Rewards) {
        tree.backpropagate(node, rewards);
    }

    /// Tactic for the coming choice: survival by default, pill once the root
    /// survives often enough, ghost when an edible ghost can be reached in time
    pub fn compute_tactic<S: GameState>(&self, tree: &SearchTree, state: &S) -> Tactic {
        let survival_rate = tree.root_node().mean(Tactic::Survival);
        if survival_rate < self.tactics.pill_survival_threshold {
            return Tactic::Survival;
        }

        let position = state.pacman_position();
        let reachable = state.ghost_states().iter().any(|ghost| {
            ghost.is_edible()
                && tree
                    .topology()
                    .distance(position, ghost.position)
                    .map_or(false, |d| d < ghost.scared_timer as usize)
        });
        if reachable {
            Tactic::Ghost
        } else {
            Tactic::Pill
        }
    }

    /// Picks the first action of the best root child, or `None` when the
    /// root has no visited children
    pub fn select_action<S: GameState>(&mut self, tree: &SearchTree, state: &S) -> Option<Direction> {
        let root = tree.root();
        let children: Vec<NodeId> = tree
            .children(root)
            .iter()
            .copied()
            .filter(|&c| tree.node(c).visits() > 0.0)
            .collect();
        if children.is_empty() {
            return None;
        }

        if !self.tactics.enabled {
            let best = children.iter().copied().max_by(|&a, &b| {
                compare(tree.tactic_value(a, Tactic::Pill), tree.tactic_value(b, Tactic::Pill)).then(
                    compare(
                        tree.tactic_value(a, Tactic::Survival),
                        tree.tactic_value(b, Tactic::Survival),
                    ),
                )
            })?;
            return tree.node(best).first_action();
        }

        let computed = self.compute_tactic(tree, state);
        for tactic in Tactic::priority_order(computed) {
            let best = children
                .iter()
                .copied()
                .filter(|&c| {
                    tree.tactic_value(c, Tactic::Survival) > self.tactics.safety_threshold
                        && tree.tactic_value(c, tactic) > 0.0
                })
                .max_by(|&a, &b| compare(tree.tactic_value(a, tactic), tree.tactic_value(b, tactic)));
            if let Some(best) = best {
                self.tactic = tactic;
                return tree.node(best).first_action();
            }
        }

        debug!("No child clears the safety threshold, maximising survival");
        self.tactic = Tactic::Survival;
        let best = children.iter().copied().max_by(|&a, &b| {
            compare(
                tree.tactic_value(a, Tactic::Survival),
                tree.tactic_value(b, Tactic::Survival),
            )
        })?;
        tree.node(best).first_action()
    }

    /// What the rollout policy would do right now. Used when the search
    /// produced nothing to choose from.
    pub fn playout_recommendation<S: GameState>(&mut self, topology: &MazeTopology, state: &S) -> Option<Direction> {
        let mut policy = PlayoutPolicy::new(topology, self.playout.collision_tolerance);
        policy.choose(state, false, &mut self.rng)
    }
}
