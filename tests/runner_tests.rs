// Full games through the runner, plus the decision log written along the way

use std::fs;

use pacman_mcts::adversary::AdversaryModel;
use pacman_mcts::agent::MctsAgent;
use pacman_mcts::classic::ClassicGame;
use pacman_mcts::config::Config;
use pacman_mcts::game::{GameState, PACMAN};
use pacman_mcts::layout::Layout;
use pacman_mcts::runner::{GameResult, GameRunner};

fn fast_config() -> Config {
    let mut config = Config::default_hardcoded();
    config.timing.time_budget_ms = 2_000;
    config.timing.safety_margin_ms = 0;
    config.search.max_iterations = 40;
    config.search.horizon = 15;
    config.search.seed = Some(5);
    config
}

fn load(name: &str) -> Layout {
    Layout::from_file(format!("layouts/{}.lay", name)).expect("bundled layout should load")
}

#[test]
fn test_bundled_layouts_parse() {
    for name in ["small_classic", "test_classic", "open_room"] {
        let layout = load(name);
        assert!(!layout.food.is_empty(), "{} has no food", name);
    }
}

#[test]
fn test_plays_a_full_game_against_stationary_ghosts() {
    let layout = load("test_classic");
    let runner = GameRunner::new(fast_config(), AdversaryModel::Stationary, 200);
    let result = runner.play(&layout, 1).expect("game should not abort");

    assert!(result.moves > 0);
    assert!(result.moves <= 200);
    assert!(result.food_eaten <= layout.food.len());
    if result.won {
        assert_eq!(result.food_eaten, layout.food.len());
    }
}

#[test]
fn test_run_many_plays_independent_games() {
    let layout = load("open_room");
    let runner = GameRunner::new(fast_config(), AdversaryModel::Random, 100);
    let results = runner.run_many(&layout, 3);
    assert_eq!(results.len(), 3);

    let finished: Vec<GameResult> = results.into_iter().map(|r| r.unwrap()).collect();
    let stats = GameRunner::generate_stats(&finished);
    assert_eq!(stats.games, 3);
    assert!(stats.wins <= 3);
    assert!(stats.win_rate >= 0.0 && stats.win_rate <= 100.0);
}

#[test]
fn test_empty_batch_has_zero_stats() {
    let stats = GameRunner::generate_stats(&[]);
    assert_eq!(stats.games, 0);
    assert_eq!(stats.win_rate, 0.0);
}

#[test]
fn test_decision_log_has_one_line_per_move() {
    let path = std::env::temp_dir().join(format!("pacman_runner_log_{}.jsonl", std::process::id()));
    let mut config = fast_config();
    config.debug.enabled = true;
    config.debug.log_file_path = path.to_string_lossy().to_string();

    let mut state = ClassicGame::new(&load("test_classic"));
    {
        let mut agent = MctsAgent::new(config);
        agent.start_game(&state);
        for _ in 0..3 {
            let action = agent.choose_action(&state).unwrap();
            state = state.generate_successor(PACMAN, action).unwrap();
        }
    }

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["turn"], (i + 1) as u64);
        assert!(line["stats"]["iterations"].as_u64().unwrap() > 0);
        assert!(line["children"].is_array());
    }
    let _ = fs::remove_file(&path);
}
