// Game runner for playing full games against the bundled engine
//
// This module provides functionality to:
// 1. Play one complete game with an MCTS agent against modelled ghosts
// 2. Play a batch of independent games in parallel
// 3. Summarise wins, scores and timings

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::time::Instant;

use crate::adversary::AdversaryModel;
use crate::agent::MctsAgent;
use crate::classic::ClassicGame;
use crate::config::Config;
use crate::debug_logger::DecisionLogger;
use crate::error::SearchError;
use crate::game::{GameState, PACMAN};
use crate::layout::Layout;

/// Outcome of one complete game
#[derive(Debug, Clone)]
pub struct GameResult {
    pub won: bool,
    pub score: i32,
    pub moves: u32,
    pub food_eaten: usize,
    pub duration_ms: u128,
}

/// Statistics for a batch of games
#[derive(Debug, Default)]
pub struct RunStats {
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub average_score: f64,
    pub average_moves: f64,
}

/// Plays games between an `MctsAgent` and ghosts driven by an adversary model
pub struct GameRunner {
    config: Config,
    ghost_model: AdversaryModel,
    move_limit: u32,
}

impl GameRunner {
    /// Creates a new runner. `move_limit` caps the number of pacman moves per game.
    pub fn new(config: Config, ghost_model: AdversaryModel, move_limit: u32) -> Self {
        GameRunner {
            config,
            ghost_model,
            move_limit,
        }
    }

    /// Plays one game to completion or to the move limit
    pub fn play(&self, layout: &Layout, seed: u64) -> Result<GameResult, SearchError> {
        self.play_with(MctsAgent::new(self.config.clone()), layout, seed)
    }

    fn play_with(&self, mut agent: MctsAgent, layout: &Layout, seed: u64) -> Result<GameResult, SearchError> {
        let start_time = Instant::now();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = ClassicGame::new(layout);
        let starting_food = state.food_count();
        let mut moves = 0;

        agent.start_game(&state);
        while !state.is_terminal() && moves < self.move_limit {
            let action = agent.choose_action(&state)?;
            state = state.generate_successor(PACMAN, action)?;
            moves += 1;

            for ghost in 1..state.num_agents() {
                if state.is_terminal() {
                    break;
                }
                if let Some(ghost_action) = self.ghost_model.choose(&state, ghost, &mut rng) {
                    state = state.generate_successor(ghost, ghost_action)?;
                }
            }
        }
        agent.end_game(&state);

        if !state.is_terminal() {
            warn!("Game stopped at the move limit ({})", self.move_limit);
        }

        Ok(GameResult {
            won: state.is_win(),
            score: state.score(),
            moves,
            food_eaten: starting_food - state.food_count(),
            duration_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Plays `games` independent games in parallel. Each worker owns its own
    /// agent, search tree and topology cache; decision logs are disabled.
    pub fn run_many(&self, layout: &Layout, games: usize) -> Vec<Result<GameResult, SearchError>> {
        let base_seed = self.config.search.seed.unwrap_or(0);
        (0..games)
            .into_par_iter()
            .map(|game| {
                let mut config = self.config.clone();
                config.search.seed = Some(base_seed.wrapping_add(game as u64));
                let agent = MctsAgent::with_logger(config, DecisionLogger::disabled());
                let result = self.play_with(agent, layout, base_seed.wrapping_add(1_000 + game as u64));
                match &result {
                    Ok(r) => info!(
                        "Game {}: {} with score {} in {} moves",
                        game,
                        if r.won { "won" } else { "lost" },
                        r.score,
                        r.moves
                    ),
                    Err(e) => warn!("Game {} aborted: {}", game, e),
                }
                result
            })
            .collect()
    }

    /// Generates statistics from game results
    pub fn generate_stats(results: &[GameResult]) -> RunStats {
        let games = results.len();
        if games == 0 {
            return RunStats::default();
        }
        let wins = results.iter().filter(|r| r.won).count();

        RunStats {
            games,
            wins,
            win_rate: (wins as f64 / games as f64) * 100.0,
            average_score: results.iter().map(|r| r.score as f64).sum::<f64>() / games as f64,
            average_moves: results.iter().map(|r| r.moves as f64).sum::<f64>() / games as f64,
        }
    }

    /// Prints a summary of a batch
    pub fn print_report(results: &[GameResult]) {
        let stats = Self::generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                      RUN REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Games:          {}", stats.games);
        println!("Wins:           {} ({:.1}%)", stats.wins, stats.win_rate);
        println!("Average Score:  {:.1}", stats.average_score);
        println!("Average Moves:  {:.1}", stats.average_moves);
        println!("═══════════════════════════════════════════════════════════\n");
    }
}
