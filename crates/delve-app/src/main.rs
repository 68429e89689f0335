//! `delve`: compute a route through a generated cave world.
//!
//! Loads `config.ron` (creating it on first run), applies command-line
//! overrides, generates terrain on demand and logs a summary of the route.
//!
//! Run with: `cargo run -p delve-app -- --start 0,40,0 --goal 300,60,40`

mod route;

use std::process::ExitCode;

use clap::Parser;
use delve_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    let (mut config, load_error) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(&args);

    delve_log::init_logging(
        config.debug.log_dir.as_deref(),
        cfg!(debug_assertions),
        Some(&config),
    );
    if let Some(e) = load_error {
        warn!(dir = %config_dir.display(), error = %e, "falling back to default config");
    }

    info!(
        seed = config.world.seed,
        mode = ?config.search.mode,
        "delve {}",
        env!("CARGO_PKG_VERSION")
    );

    match route::run(&config) {
        Ok(Some(path)) => {
            route::log_summary(&path, config.debug.log_waypoints);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            warn!("start is buried with no air nearby");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = %e, "route search failed");
            ExitCode::FAILURE
        }
    }
}
