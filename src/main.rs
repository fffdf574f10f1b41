//! Sitewatch main entry point
//!
//! This is the command-line interface for the Sitewatch change monitor.
//! It is meant to be invoked by an external scheduler (cron, a systemd timer).

use anyhow::Context;
use clap::Parser;
use sitewatch::config::{load_config_with_hash, Config};
use sitewatch::crawler::{crawl_all, open_orchestrator, BatchSummary};
use sitewatch::output::{load_statistics, print_statistics};
use sitewatch::storage::open_storage;
use sitewatch::SiteEvent;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sitewatch: a change monitor for web pages and PDF documents
///
/// Re-fetches every tracked site, stores a new version whenever its content
/// changed, and records the outcome as the site's status.
#[derive(Parser, Debug)]
#[command(name = "sitewatch")]
#[command(version)]
#[command(about = "A change monitor for web pages and PDF documents", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl only the site with this id
    #[arg(long, value_name = "ID", conflicts_with_all = ["check", "stats", "dry_run"])]
    site: Option<i64>,

    /// Acknowledge the diff or failure of the site with this id
    #[arg(long, value_name = "ID", conflicts_with_all = ["site", "stats", "dry_run"])]
    check: Option<i64>,

    /// Show site statistics from the database and exit
    #[arg(long, conflicts_with_all = ["site", "check", "dry_run"])]
    stats: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["site", "check", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(site_id) = cli.check {
        handle_check(&config, site_id).await?;
    } else {
        handle_crawl(&config, cli.site).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitewatch=info,warn"),
            1 => EnvFilter::new("sitewatch=debug,info"),
            2 => EnvFilter::new("sitewatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the configuration that would be used
fn handle_dry_run(config: &Config) {
    println!("=== Sitewatch Dry Run ===\n");

    println!("Fetcher:");
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Connect timeout: {}s", config.fetcher.connect_timeout_secs);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nCrawler:");
    println!(
        "  Max concurrent crawls: {}",
        config.crawler.max_concurrent_crawls
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nConfigured sites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} <{}>", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))
        .context("failed to open database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --check mode: operator acknowledgment of one site
async fn handle_check(config: &Config, site_id: i64) -> anyhow::Result<()> {
    let orchestrator = open_orchestrator(config)?;
    let status = orchestrator
        .acknowledge(site_id)
        .await
        .with_context(|| format!("failed to acknowledge site {}", site_id))?;

    println!("✓ Site {} is now {}", site_id, status);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, only: Option<i64>) -> anyhow::Result<()> {
    let orchestrator = Arc::new(open_orchestrator(config)?);

    let recovered = orchestrator.recover_interrupted().await?;
    if !recovered.is_empty() {
        tracing::warn!("Recovered {} sites left running", recovered.len());
    }

    // Downstream notifiers hook in here; the CLI just logs diffs
    let mut changes = orchestrator.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            if change.event == SiteEvent::FoundDiff {
                tracing::info!("Diff found for site {}", change.site_id);
            }
        }
    });

    let site_ids = match only {
        Some(id) => vec![id],
        None => orchestrator.site_ids()?,
    };
    tracing::info!("Crawling {} sites", site_ids.len());

    let results = crawl_all(
        Arc::clone(&orchestrator),
        site_ids,
        config.crawler.max_concurrent_crawls as usize,
    )
    .await;

    for result in &results {
        if let Err(e) = &result.result {
            tracing::error!("Site {}: {}", result.site_id, e);
        }
    }

    // Closing the channel ends the listener
    drop(orchestrator);
    let _ = listener.await;

    let summary = BatchSummary::from_results(&results);
    println!(
        "✓ {} sites crawled: {} changed, {} unchanged, {} failed",
        summary.total(),
        summary.changed,
        summary.unchanged,
        summary.failed
    );

    Ok(())
}
