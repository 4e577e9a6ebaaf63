// Library exports for the Pac-Man MCTS agent
// The batch driver and the integration tests use the agent through this crate

pub mod adversary;
pub mod agent;
pub mod classic;
pub mod config;
pub mod debug_logger;
pub mod engine;
pub mod error;
pub mod game;
pub mod layout;
pub mod node;
pub mod playout;
pub mod runner;
pub mod topology;
pub mod tree;
pub mod types;
