//! Sync binary
//!
//! Logs in, fetches the user list and the signed profile, and writes the
//! snapshot to disk. Credentials come from `USER_NAME` and `PASSWORD`; the
//! signing identity from `API_USER`, `USER_ID`, `OPEN_ID` and `OPERATE_ID`.
//!
//! # Usage
//!
//! ```bash
//! sunvoy-sync --output users.json
//! ```

use clap::Parser;
use std::path::PathBuf;

use sunvoy_sync::{
    cli::{SyncArgs, run_sync_mode},
    utils::VERSION,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "sunvoy-sync")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Snapshot output file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Show the browser window during login
    #[arg(long)]
    headful: bool,

    /// Show version information
    #[arg(long)]
    version: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

impl From<Cli> for SyncArgs {
    fn from(cli: Cli) -> Self {
        Self {
            config: cli.config,
            output: cli.output,
            headful: cli.headful,
            verbose: cli.verbose,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", VERSION);
        return Ok(());
    }

    match run_sync_mode(cli.into()).await {
        Ok(outcome) => {
            println!(
                "Wrote {} records to {}",
                outcome.records,
                outcome.path.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sync failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
