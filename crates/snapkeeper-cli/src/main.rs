mod commands;
mod logging;
mod progress;

use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use progress::CliReporter;
use snapkeeper_core::{config, provider, SnapshotEngine};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    dotenv().ok();

    // Invalid periods are rejected here, before any configuration or provider work.
    let args = Cli::parse();
    let period = args.period;

    let config = match config::load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} Error loading configuration: {}", "error:".red().bold(), err);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init_logger(&config.log_file) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{} Error opening log file: {}", "error:".red().bold(), err);
            return ExitCode::FAILURE;
        }
    };

    let backend = match provider::connect(&config) {
        Ok(backend) => backend,
        Err(err) => {
            error!("Error connecting to the provider: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let engine = SnapshotEngine::from_config(&config, backend);
    let result = engine.run(period, &CliReporter);

    if result.has_errors() {
        error!(
            "Run finished with errors ({} of {} volumes failed)",
            result.count_errors, result.count_total
        );
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
