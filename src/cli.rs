//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Replay a panel navigation scenario and print the resulting layer stacks
#[derive(Parser, Debug)]
#[command(name = "panelnav", version)]
pub struct Cli {
    /// Scenario file with `[[steps]]` to replay
    #[arg(value_name = "SCENARIO")]
    pub scenario: PathBuf,

    /// Configuration file (defaults to the XDG config, created on first run)
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}
