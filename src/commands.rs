use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use rss_merge::config::{Config, FailurePolicy};
use rss_merge::feeds_file::load_feed_urls;
use rss_merge::{FileSink, HttpSource, Pipeline, RunReport};

use crate::Cli;

pub async fn run_command(cli: Cli, cfg: Config) -> Result<()> {
    let cfg = apply_overrides(&cli, cfg);
    cfg.validate()?;

    let urls = load_feed_urls(&cfg.feeds_path)?;
    if urls.is_empty() {
        tracing::warn!(path = %cfg.feeds_path.display(), "Feed list is empty");
    }

    let source = HttpSource::new(&cfg.user_agent, cfg.timeout)
        .context("Failed to build HTTP client")?;
    let sink = FileSink::new(&cfg.output_path);

    let report = Pipeline::from_config(source, sink, &cfg).run(&urls).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &cfg.output_path);
    }

    Ok(())
}

/// Command-line flags win over the config file
fn apply_overrides(cli: &Cli, mut cfg: Config) -> Config {
    if let Some(feeds) = &cli.feeds {
        cfg.feeds_path = feeds.clone();
    }
    if let Some(output) = &cli.output {
        cfg.output_path = output.clone();
    }
    if let Some(n) = cli.concurrency {
        cfg.concurrency = n;
    }
    if cli.skip_failed {
        cfg.on_fetch_error = FailurePolicy::Skip;
    }
    cfg
}

fn print_summary(report: &RunReport, output: &Path) {
    println!("Fetched {} total entries", report.fetched.to_string().bold());
    println!(
        "{} unique entries after deduplication",
        report.unique.to_string().bold()
    );

    if !report.failed.is_empty() {
        eprintln!();
        eprintln!("Warning: {} feed(s) were skipped:", report.skipped());
        for f in &report.failed {
            eprintln!("- {} ({})", f.url, f.error);
        }
    }

    println!(
        "{} Merged RSS saved to {}",
        "✓".green(),
        output.display().to_string().blue()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "rss-merge",
            "-i",
            "mine.txt",
            "-o",
            "out/all.xml",
            "-j",
            "4",
            "--skip-failed",
        ]);
        let cfg = apply_overrides(&cli, Config::default());

        assert_eq!(cfg.feeds_path, PathBuf::from("mine.txt"));
        assert_eq!(cfg.output_path, PathBuf::from("out/all.xml"));
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.on_fetch_error, FailurePolicy::Skip);
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::parse_from(["rss-merge"]);
        let cfg = apply_overrides(&cli, Config::default());

        assert_eq!(cfg.feeds_path, PathBuf::from("feed_urls.txt"));
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.on_fetch_error, FailurePolicy::Abort);
    }
}
