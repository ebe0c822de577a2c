//! Veilleur main entry point
//!
//! This is the command-line interface for the veilleur prefecture crawler.

use clap::Parser;
use std::path::PathBuf;
use veilleur::config::{config_from_env, load_config};
use veilleur::crawler::{build_work_units, CardExtractor, Orchestrator};
use veilleur::ledger::JobStatus;
use veilleur::session::ResilientSession;
use veilleur::{InMemoryLedger, InMemoryStore, SiteRegistry, StaticRegistry};
use tracing_subscriber::EnvFilter;

/// Veilleur: a resilient keyword crawler for prefecture websites
///
/// Veilleur searches each prefecture website for each requested keyword,
/// pacing and disguising its requests, and reports what it found per site
/// and per keyword.
#[derive(Parser, Debug)]
#[command(name = "veilleur")]
#[command(version = "0.2.0")]
#[command(about = "A resilient keyword crawler for prefecture websites", long_about = None)]
struct Cli {
    /// Keywords to search for
    #[arg(
        value_name = "KEYWORD",
        default_values_t = [
            "bovin".to_string(),
            "porcin".to_string(),
            "volaille".to_string(),
            "poules".to_string(),
            "pondeuses".to_string(),
            "poulets".to_string(),
        ]
    )]
    keywords: Vec<String>,

    /// Only crawl sites in this region
    #[arg(long, value_name = "REGION")]
    region: Option<String>,

    /// Only crawl this site
    #[arg(long, value_name = "SITE")]
    site: Option<String>,

    /// Path to TOML configuration file (environment overrides still apply)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// List known regions and exit
    #[arg(long, conflicts_with = "dry_run")]
    list_regions: bool,

    /// Show what would be crawled without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => config_from_env()?,
    };

    let registry = StaticRegistry::new();

    if cli.list_regions {
        for region in registry.list_regions()? {
            println!("{}", region);
        }
        return Ok(());
    }

    let sites = registry.list_sites(cli.region.as_deref(), cli.site.as_deref())?;
    let units = build_work_units(&sites, &cli.keywords);

    if cli.dry_run {
        println!("=== Veilleur Dry Run ===\n");
        println!("Sites ({}):", sites.len());
        for site in &sites {
            println!("  - {} [{}] {}", site.name, site.code, site.domain);
        }
        println!("\nKeywords ({}):", cli.keywords.len());
        for keyword in &cli.keywords {
            println!("  - {}", keyword);
        }
        println!("\n✓ Would crawl {} work units", units.len());
        return Ok(());
    }

    tracing::info!(
        "Crawling {} sites x {} keywords = {} work units",
        sites.len(),
        cli.keywords.len(),
        units.len()
    );

    let session = ResilientSession::new(&config.crawl, &config.throttle)?;
    let ledger = InMemoryLedger::new();
    let store = InMemoryStore::new();
    let extractor = CardExtractor::new();

    let job_id = format!("veilleur-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S"));
    let orchestrator = Orchestrator::new(
        job_id.clone(),
        session,
        config.crawl.clone(),
        units,
        &ledger,
        &store,
        &extractor,
    );

    let outcome = orchestrator.run().await;

    println!("\n=== Job {} ({:?}) ===", job_id, outcome.status);
    println!("Items found: {}", outcome.items_found);
    println!("\nPer site:");
    for (site, count) in &outcome.per_site_counts {
        println!("  {}: {}", site, count);
    }
    println!("\nPer keyword:");
    for (keyword, count) in &outcome.per_keyword_counts {
        println!("  {}: {}", keyword, count);
    }
    if !outcome.failed_units.is_empty() {
        println!("\nFailed units:");
        for (site, keyword) in &outcome.failed_units {
            println!("  {} / {}", site, keyword);
        }
    }

    if outcome.status == JobStatus::Failed {
        anyhow::bail!(
            "Job failed: {}",
            outcome.error.as_deref().unwrap_or("unknown defect")
        );
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("veilleur=info,warn"),
            1 => EnvFilter::new("veilleur=debug,info"),
            2 => EnvFilter::new("veilleur=trace,debug"),
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
