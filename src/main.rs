// Batch driver: pacman-mcts [layout] [games]
//
// Plays a number of games on a layout with the agent configured by
// Pacman.toml and prints a summary.

use log::{error, info};
use std::env;
use std::process;

use pacman_mcts::config::Config;
use pacman_mcts::layout::Layout;
use pacman_mcts::runner::GameRunner;

const DEFAULT_LAYOUT: &str = "layouts/small_classic.lay";
const MOVE_LIMIT: u32 = 1_000;

fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let layout_path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_LAYOUT);
    let games = match args.get(2).map(|s| s.parse::<usize>()) {
        None => 1,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            error!("Invalid game count '{}': {}", args[2], e);
            process::exit(2);
        }
    };

    let layout = match Layout::from_file(layout_path) {
        Ok(layout) => layout,
        Err(e) => {
            error!("Failed to load layout '{}': {}", layout_path, e);
            process::exit(1);
        }
    };

    // Load configuration once at startup
    let config = Config::load_or_default();
    let ghost_model = config.search.adversary_model;
    info!("Playing {} game(s) on {}", games, layout_path);

    let runner = GameRunner::new(config, ghost_model, MOVE_LIMIT);
    let results: Vec<_> = runner
        .run_many(&layout, games)
        .into_iter()
        .filter_map(|result| match result {
            Ok(result) => Some(result),
            Err(e) => {
                error!("Game aborted: {}", e);
                None
            }
        })
        .collect();

    GameRunner::print_report(&results);
}
