use clap::Parser;
use snapkeeper_core::Period;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "snapkeeper")]
#[command(
    about = "For a specified period, take snapshots of all tagged volumes and prune old ones",
    long_about = None
)]
pub struct Cli {
    /// Period of the snapshots: hour, four_hours, day, week or month
    #[arg(value_name = "PERIOD", value_parser = parse_period)]
    pub period: Period,

    /// Configuration file (defaults to ./Config.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn parse_period(token: &str) -> Result<Period, String> {
    token.parse::<Period>().map_err(|e| e.to_string())
}
