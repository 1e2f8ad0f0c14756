//! Crate-Digger main entry point
//!
//! This is the command-line interface for the quota-aware music catalog
//! builder.

use clap::Parser;
use crate_digger::config::load_config_with_hash;
use crate_digger::pipeline::Pipeline;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Crate-Digger: a quota-aware music catalog builder
///
/// Resolves a whitelist of artist names to channels, walks each channel's
/// uploads playlist, and fetches per-video metadata under a hard daily
/// quota budget. Interrupted runs resume where they left off.
#[derive(Parser, Debug)]
#[command(name = "crate-digger")]
#[command(version = "1.0.0")]
#[command(about = "A quota-aware music catalog builder", long_about = None)]
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

    /// Only resolve pending seeds, then exit
    #[arg(long, conflicts_with_all = ["crawl_only", "metadata_only"])]
    resolve_only: bool,

    /// Only crawl uploads of already-resolved channels, then exit
    #[arg(long, conflicts_with_all = ["resolve_only", "metadata_only"])]
    crawl_only: bool,

    /// Only fetch metadata for already-discovered videos, then exit
    #[arg(long, conflicts_with_all = ["resolve_only", "crawl_only"])]
    metadata_only: bool,

    /// Flip failed seeds back to pending before resolving
    #[arg(long)]
    reset_failed: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Validate config and show what would run without calling the API
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.stats {
        handle_stats(&config)?;
        return Ok(());
    }

    handle_run(config, &config_hash, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crate_digger=info,warn"),
            1 => EnvFilter::new("crate_digger=debug,info"),
            2 => EnvFilter::new("crate_digger=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &crate_digger::config::Config) {
    println!("=== Crate-Digger Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Daily quota budget: {} units", config.api.daily_quota_budget);
    println!("  Safety buffer: {} units", config.api.quota_safety_buffer);
    println!("  Request spacing: {}ms", config.api.request_spacing_ms);
    println!(
        "  Retries: up to {} attempts, {}ms base delay",
        config.api.max_retries, config.api.retry_base_delay_ms
    );

    println!("\nResolver:");
    println!("  Max search results: {}", config.resolver.max_search_results);

    println!("\nCrawler:");
    if config.crawler.max_pages_per_run == 0 {
        println!("  Pages per playlist per run: unlimited");
    } else {
        println!(
            "  Pages per playlist per run: {}",
            config.crawler.max_pages_per_run
        );
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nSeeds ({}):", config.seeds.names.len());
    for name in &config.seeds.names {
        println!("  - {}", name);
    }

    println!("\nOverrides ({}):", config.overrides.len());
    for entry in &config.overrides {
        println!("  - {} -> {}", entry.seed, entry.channel_id);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &crate_digger::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use crate_digger::output::{load_statistics, print_statistics};
    use crate_digger::quota::CostLedger;
    use crate_digger::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let ledger = CostLedger::new(config.api.daily_quota_budget, config.api.quota_safety_buffer);

    let stats = load_statistics(&storage, &ledger)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles a catalog run (full pipeline or a single stage)
async fn handle_run(
    config: crate_digger::config::Config,
    config_hash: &str,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(config, config_hash)?;

    if cli.reset_failed {
        pipeline.reset_failed_seeds()?;
    }

    let quota_exhausted = if cli.resolve_only {
        let summary = match pipeline.run_resolution().await {
            Ok(s) => s,
            Err(e) => {
                pipeline.finish_failed()?;
                return Err(e.into());
            }
        };
        println!(
            "Resolved {}, failed {}, skipped {}",
            summary.resolved, summary.failed, summary.skipped
        );
        summary.quota_exhausted
    } else if cli.crawl_only {
        let (playlists, discovered, quota) = match pipeline.run_crawl().await {
            Ok(r) => r,
            Err(e) => {
                pipeline.finish_failed()?;
                return Err(e.into());
            }
        };
        println!(
            "Crawled {} playlists, discovered {} new videos",
            playlists, discovered
        );
        quota
    } else if cli.metadata_only {
        let summary = match pipeline.run_metadata().await {
            Ok(s) => s,
            Err(e) => {
                pipeline.finish_failed()?;
                return Err(e.into());
            }
        };
        println!(
            "Fetched metadata for {} videos, {} failed",
            summary.fetched, summary.failed
        );
        summary.quota_exhausted
    } else {
        let summary = match pipeline.run_all().await {
            Ok(s) => s,
            Err(e) => {
                pipeline.finish_failed()?;
                return Err(e.into());
            }
        };
        println!(
            "Resolved {} seeds ({} failed, {} skipped); crawled {} playlists, {} new videos; metadata fetched for {} ({} failed)",
            summary.resolution.resolved,
            summary.resolution.failed,
            summary.resolution.skipped,
            summary.playlists_crawled,
            summary.videos_discovered,
            summary.metadata.fetched,
            summary.metadata.failed
        );
        summary.quota_exhausted
    };

    pipeline.finish(quota_exhausted)?;

    if quota_exhausted {
        println!(
            "Daily quota exhausted ({} units left); run again tomorrow to continue",
            pipeline.remaining_budget()?
        );
    } else {
        tracing::info!("Run completed");
    }

    Ok(())
}
