//! SlicerX CLI entry point
//!
//! # Usage
//!
//! ```bash
//! slicerx segment --input video.mp4 --segments segments.json --out-dir clips
//! slicerx batch --file batch.json --out-dir clips --concurrency 2
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use slicerx_cli::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Segment(args) => {
            info!("Executing segment command");
            commands::execute_segment(args).await?;
        }
        Commands::Batch(args) => {
            info!("Executing batch command");
            commands::execute_batch(args).await?;
        }
    }

    info!("SlicerX completed successfully");
    Ok(())
}
