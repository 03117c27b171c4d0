//! Sumi-Crawl main entry point
//!
//! This is the command-line interface for the Sumi-Crawl site crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_crawl::config::{load_config_with_hash, validate, Config};
use sumi_crawl::crawler::crawl;
use sumi_crawl::output::{print_statistics, CrawlStatistics, PrinterKind};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Crawl: a concurrent single-host site crawler
///
/// Sumi-Crawl visits every page reachable from a base address on the same
/// host and lists each page together with the page that linked to it.
#[derive(Parser, Debug)]
#[command(name = "sumi-crawl")]
#[command(version)]
#[command(about = "A concurrent single-host site crawler", long_about = None)]
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

    /// Override the base address to crawl
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Override the output format (raw or json)
    #[arg(long, value_name = "FORMAT")]
    printer: Option<PrinterKind>,

    /// Also write the output to a file in the output directory
    #[arg(long)]
    persist: bool,

    /// Clear pages left in the SQLite store by a previous run
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_crawl=info,warn"),
            1 => EnvFilter::new("sumi_crawl=debug,info"),
            2 => EnvFilter::new("sumi_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Applies command-line overrides and validates the result again
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(base_url) = &cli.base_url {
        config.crawler.base_url = base_url.clone();
    }
    if let Some(printer) = cli.printer {
        config.output.printer = printer;
    }
    if cli.persist {
        config.output.persist = true;
    }

    validate(config).context("invalid command-line override")?;
    Ok(())
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  HTTP timeout: {}ms", config.crawler.http_timeout);
    println!("  Idle timeout: {}ms", config.crawler.idle_timeout);
    if config.crawler.max_in_flight == 0 {
        println!("  Max in flight: unbounded");
    } else {
        println!("  Max in flight: {}", config.crawler.max_in_flight);
    }
    println!("  Completion: {:?}", config.crawler.completion);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Printer: {}", config.output.printer);
    if config.output.persist {
        println!(
            "  Persist to: {}",
            config
                .output
                .directory
                .join(config.output.printer.printer().file_name())
                .display()
        );
    }

    println!("\nStorage:");
    println!("  Backend: {}", config.storage.backend);
    println!("  Database: {}", config.storage.database_path.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing up");
            interrupt.cancel();
        }
    });

    let report = crawl(&config, fresh, cancel)
        .await
        .context("crawl could not be started")?;

    if let Some(errors) = &report.error {
        tracing::warn!("Crawl finished with partial results: {}", errors);
    }

    let printer = config.output.printer.printer();
    let rendered = printer
        .render(&report.pages)
        .context("failed to render output")?;
    println!("{}", rendered);

    if config.output.persist {
        let path = printer
            .persist(&rendered, &config.output.directory)
            .context("failed to persist output")?;
        tracing::info!("Output written to {}", path.display());
    }

    print_statistics(&CrawlStatistics::from_report(&report));

    Ok(())
}
