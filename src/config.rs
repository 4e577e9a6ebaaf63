// Configuration module for reading Pacman.toml
// Every tunable of the search, the reuse protocol and the rollout lives here

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::adversary::AdversaryModel;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub search: SearchConfig,
    pub reuse: ReuseConfig,
    pub tactics: TacticsConfig,
    pub evaluation: EvaluationConfig,
    pub playout: PlayoutConfig,
    pub debug: DebugConfig,
}

/// Wall-clock budget per decision
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub time_budget_ms: u64,
    /// Reserved for tree update, action selection and logging
    pub safety_margin_ms: u64,
}

impl TimingConfig {
    /// Computes the time left for search iterations
    pub fn effective_budget_ms(&self) -> u64 {
        self.time_budget_ms.saturating_sub(self.safety_margin_ms)
    }
}

/// Select / expand / simulate parameters
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Simulated timesteps counted from the real state
    pub horizon: usize,
    /// Visits each child gets before UCT takes over
    pub visit_threshold: f64,
    pub exploration_constant: f64,
    /// Iteration cap per decision, 0 for none
    pub max_iterations: u64,
    pub adversary_model: AdversaryModel,
    /// Fixed RNG seed for reproducible searches
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Tree reuse across decisions
#[derive(Debug, Deserialize, Clone)]
pub struct ReuseConfig {
    pub enabled: bool,
    pub discount_factor: f64,
}

/// Tactic-based action selection
#[derive(Debug, Deserialize, Clone)]
pub struct TacticsConfig {
    pub enabled: bool,
    /// Minimum survival value a child needs to be chosen
    pub safety_threshold: f64,
    /// Root survival rate at which pill collection takes over
    pub pill_survival_threshold: f64,
}

/// Reward channel parameters
#[derive(Debug, Deserialize, Clone)]
pub struct EvaluationConfig {
    pub long_term_goal_enabled: bool,
    /// Ghost reward above which a capsule is considered to have paid off
    pub strong_payoff_threshold: f64,
    /// Normaliser for residual capture value
    pub max_ghost_value: f64,
    pub terminal_bonus: f64,
    pub terminal_penalty: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlayoutConfig {
    /// Extra steps a ghost may take to the destination and still count as a threat
    pub collision_tolerance: usize,
}

/// JSONL decision log
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Pacman.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Pacman.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Pacman.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Pacman.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                time_budget_ms: 200,
                safety_margin_ms: 20,
            },
            search: SearchConfig {
                horizon: 40,
                visit_threshold: 3.0,
                exploration_constant: std::f64::consts::SQRT_2,
                max_iterations: 0,
                adversary_model: AdversaryModel::Directional,
                seed: None,
            },
            reuse: ReuseConfig {
                enabled: true,
                discount_factor: 0.5,
            },
            tactics: TacticsConfig {
                enabled: true,
                safety_threshold: 0.5,
                pill_survival_threshold: 0.7,
            },
            evaluation: EvaluationConfig {
                long_term_goal_enabled: true,
                strong_payoff_threshold: 0.25,
                max_ghost_value: 160.0,
                terminal_bonus: 1.0,
                terminal_penalty: 1.0,
            },
            playout: PlayoutConfig {
                collision_tolerance: 1,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "pacman_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default()
            .unwrap_or_else(|e| {
                log::warn!("Could not load Pacman.toml ({}), using hardcoded defaults", e);
                Self::default_hardcoded()
            })
    }
}
