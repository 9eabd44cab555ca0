mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::commands::run_command;

/// Command-line arguments for rss-merge
#[derive(Parser, Debug)]
#[command(name = "rss-merge", version)]
#[command(about = "Merge RSS/Atom feeds into one deduplicated RSS 2.0 feed")]
pub struct Cli {
    /// File with one feed URL per line (overrides config)
    #[arg(short = 'i', long = "feeds", value_name = "FILE")]
    pub feeds: Option<PathBuf>,

    /// Where to write the merged feed (overrides config)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of feeds fetched at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Skip feeds that fail instead of aborting the run
    #[arg(long)]
    pub skip_failed: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logs go to stderr so `--json` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = rss_merge::config::load_config(cli.config.as_deref())?;

    run_command(cli, cfg).await
}
