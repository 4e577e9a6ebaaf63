// Decision entry point
//
// One agent plays one game at a time. The search tree survives between calls
// and is re-rooted on the new position when reuse is enabled.

use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::{DecisionLogger, DecisionRecord};
use crate::engine::MctsEngine;
use crate::error::SearchError;
use crate::game::{GameState, PACMAN};
use crate::tree::SearchTree;
use crate::types::Direction;

/// MCTS Pac-Man agent with OOP-style API
/// Takes static configuration and keeps the search tree between decisions
pub struct MctsAgent {
    config: Config,
    engine: MctsEngine,
    tree: Option<SearchTree>,
    logger: DecisionLogger,
    turn: u32,
}

impl MctsAgent {
    /// Creates a new agent with the given configuration
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the agent's lifetime
    pub fn new(config: Config) -> Self {
        let logger = DecisionLogger::new(config.debug.enabled, &config.debug.log_file_path);
        MctsAgent {
            engine: MctsEngine::new(&config),
            config,
            tree: None,
            logger,
            turn: 0,
        }
    }

    /// Same agent with a decision logger supplied by the caller
    pub fn with_logger(config: Config, logger: DecisionLogger) -> Self {
        MctsAgent {
            engine: MctsEngine::new(&config),
            config,
            tree: None,
            logger,
            turn: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The persistent search tree, once a decision has been made
    pub fn tree(&self) -> Option<&SearchTree> {
        self.tree.as_ref()
    }

    /// Called when a game starts: builds a fresh tree for the maze
    pub fn start_game<S: GameState>(&mut self, state: &S) {
        info!("GAME START at {} with {} food", state.pacman_position(), state.food_count());
        self.turn = 0;
        self.engine.start_game(state.food_count());
        self.tree = Some(SearchTree::new(state.walls().clone(), state.pacman_position()));
    }

    /// Called when a game ends
    pub fn end_game<S: GameState>(&mut self, state: &S) {
        info!(
            "GAME OVER after {} turns: {} (score {})",
            self.turn,
            if state.is_win() { "won" } else { "lost" },
            state.score()
        );
        self.tree = None;
    }

    /// Computes the next move within the configured time budget
    ///
    /// The previous tree is re-rooted on the current position (or rebuilt),
    /// searched until the deadline, and the best root child's first move is
    /// returned. Without any search data the rollout policy's move is used.
    ///
    /// # Returns
    /// * `Result<Direction, SearchError>` - A legal move, or the failure that aborted the search
    pub fn choose_action<S: GameState>(&mut self, state: &S) -> Result<Direction, SearchError> {
        let start_time = Instant::now();
        let deadline = start_time + Duration::from_millis(self.config.timing.effective_budget_ms());
        self.turn += 1;

        let position = state.pacman_position();
        let legal = state.legal_actions(PACMAN);
        if legal.is_empty() {
            return Err(SearchError::NoLegalActions(position));
        }

        let tree = match self.tree.take() {
            Some(mut tree) if tree.topology().walls() == state.walls() => {
                if self.config.reuse.enabled {
                    let reuse = tree.update(state, self.config.reuse.discount_factor);
                    debug!("Turn {}: tree reuse {:?}", self.turn, reuse);
                } else {
                    tree.reset(position);
                }
                tree
            }
            _ => SearchTree::new(state.walls().clone(), position),
        };
        let tree = self.tree.insert(tree);

        let stats = self.engine.search(tree, state, deadline)?;

        let (action, fallback) = match self.engine.select_action(tree, state) {
            Some(action) if legal.contains(&action) => (action, false),
            other => {
                warn!(
                    "Turn {}: no usable search result ({:?}), falling back to rollout policy",
                    self.turn, other
                );
                let action = self
                    .engine
                    .playout_recommendation(tree.topology(), state)
                    .ok_or(SearchError::NoLegalActions(position))?;
                (action, true)
            }
        };

        info!(
            "Turn {}: Chose {} at {} (tactic: {}, iterations: {}, nodes: {}, time: {}ms)",
            self.turn,
            action.as_str(),
            position,
            self.engine.current_tactic().as_str(),
            stats.iterations,
            tree.len(),
            start_time.elapsed().as_millis()
        );

        if self.logger.is_enabled() {
            let record = DecisionRecord {
                turn: self.turn,
                position,
                chosen_move: action,
                tactic: self.engine.current_tactic(),
                fallback,
                root_visits: tree.root_node().visits(),
                tree_size: tree.len(),
                children: tree.summary(),
                stats,
            };
            self.logger.log_decision(&record);
        }

        Ok(action)
    }
}
