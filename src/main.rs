//! Guide-Harvest main entry point
//!
//! This is the command-line interface for crawling tenant websites, running
//! the sweep scheduler, querying the cache and searching sites.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use guide_harvest::config::{load_config_with_hash, Config};
use guide_harvest::crawler::{CrawlRequest, Fetcher, Harvester};
use guide_harvest::output::{
    print_cache_listing, print_crawl_outcome, print_run_stats, print_search_hits,
};
use guide_harvest::schedule::{Scheduler, StaticDirectory};
use guide_harvest::search::site_search;
use guide_harvest::storage::{CacheStore, FileCacheStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Guide-Harvest: website crawling and caching for guide tenants
///
/// Guide-Harvest crawls a tenant's website while respecting robots.txt,
/// classifies the pages it finds and keeps the result in a TTL'd cache.
#[derive(Parser, Debug)]
#[command(name = "guide-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Website crawling and caching for guide tenants", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "guide-harvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Output format; crawl, search and cache lookups default to JSON,
    /// everything else to a text report
    #[arg(long, value_enum, global = true)]
    format: Option<Format>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

impl Format {
    fn is_json(format: Option<Format>, default: Format) -> bool {
        format.unwrap_or(default) == Format::Json
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and show the effective settings
    Check,

    /// Crawl one website and print the harvested pages
    Crawl {
        /// Website URL to crawl
        url: String,

        #[arg(long)]
        max_pages: Option<usize>,

        #[arg(long)]
        max_depth: Option<u32>,

        #[arg(long)]
        max_concurrency: Option<usize>,

        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long)]
        max_html_bytes: Option<usize>,

        /// Only follow discovered links matching this regex (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Never follow discovered links matching this regex (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Crawl even when robots.txt disallows everything
        #[arg(long)]
        ignore_robots: bool,

        /// Store the result in the cache under this guide slug
        #[arg(long, value_name = "SLUG")]
        guide: Option<String>,
    },

    /// Find the pages of a site most relevant to a query
    Search {
        /// Website URL to search
        base: String,

        /// Free-text query
        query: String,
    },

    /// Sweep every active tenant once
    Sweep,

    /// Crawl and cache one tenant
    Refresh {
        /// Guide slug
        slug: String,

        /// Website URL, overriding the configured one
        #[arg(long)]
        url: Option<String>,
    },

    /// Run periodic sweeps until interrupted
    Schedule,

    /// Inspect or clean the cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List every persisted snapshot
    List,

    /// Print a guide's valid snapshot
    Show { slug: String },

    /// Print the valid snapshot for a domain
    Domain { domain: String },

    /// Delete expired snapshots
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let app = App::build(config)?;

    match cli.command {
        Command::Check => handle_check(&app.config),
        Command::Crawl {
            url,
            max_pages,
            max_depth,
            max_concurrency,
            timeout_ms,
            max_html_bytes,
            include,
            exclude,
            ignore_robots,
            guide,
        } => {
            let request = CrawlRequest {
                max_pages,
                max_depth,
                max_concurrency,
                timeout_ms,
                max_html_bytes,
                include_patterns: include,
                exclude_patterns: exclude,
                respect_robots_txt: ignore_robots.then_some(false),
                ..CrawlRequest::new(url)
            };
            let json = Format::is_json(cli.format, Format::Json);
            handle_crawl(&app, request, guide.as_deref(), json).await
        }
        Command::Search { base, query } => {
            let response = site_search(app.harvester.fetcher(), &base, &query, &app.config.search)
                .await
                .context("site search failed")?;
            if Format::is_json(cli.format, Format::Json) {
                print_json(&response)
            } else {
                print_search_hits(&response);
                Ok(())
            }
        }
        Command::Sweep => {
            let stats = app.scheduler.run().await.context("sweep failed")?;
            let stats = stats.read().await.clone();
            if Format::is_json(cli.format, Format::Text) {
                print_json(&stats)
            } else {
                print_run_stats(&stats);
                Ok(())
            }
        }
        Command::Refresh { slug, url } => {
            let detail = app
                .scheduler
                .run_for_guide(&slug, url.as_deref())
                .await
                .with_context(|| format!("refresh of '{}' failed", slug))?;
            print_json(&detail)
        }
        Command::Schedule => handle_schedule(&app).await,
        Command::Cache { action } => {
            let json = Format::is_json(cli.format, Format::Text);
            handle_cache(&app, action, json).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("guide_harvest=info,warn"),
            1 => EnvFilter::new("guide_harvest=debug,info"),
            2 => EnvFilter::new("guide_harvest=trace,debug"),
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

/// Components wired from one configuration
struct App {
    config: Config,
    harvester: Arc<Harvester>,
    cache: Arc<FileCacheStore>,
    scheduler: Scheduler,
}

impl App {
    fn build(config: Config) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(&config.user_agent).context("failed to build HTTP client")?;
        let harvester = Arc::new(Harvester::new(fetcher, config.crawler.clone()));
        let cache = Arc::new(FileCacheStore::from_config(&config.cache));
        let directory = Arc::new(StaticDirectory::from_config(&config.tenants));
        let scheduler = Scheduler::new(
            Arc::clone(&harvester),
            cache.clone(),
            directory,
            config.scheduler.clone(),
        );

        Ok(Self {
            config,
            harvester,
            cache,
            scheduler,
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handles `check`: shows the effective configuration
fn handle_check(config: &Config) -> anyhow::Result<()> {
    println!("=== Guide-Harvest Configuration ===\n");

    println!("Crawler Defaults:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!("  Timeout: {}ms", config.crawler.timeout_ms);
    println!("  Max HTML bytes: {}", config.crawler.max_html_bytes);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);
    println!("  Recent-crawl window: {}s", config.crawler.recent_window_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nCache:");
    println!("  Directory: {}", config.cache.directory);
    println!("  TTL: {}h", config.cache.ttl_hours);

    println!("\nScheduler:");
    println!("  Interval: {}h", config.scheduler.interval_hours);
    println!("  Tenant concurrency: {}", config.scheduler.tenant_concurrency);
    println!(
        "  Crawl bounds: {} pages, depth {}, {} workers",
        config.scheduler.max_pages, config.scheduler.max_depth, config.scheduler.max_concurrency
    );

    let active = config.tenants.iter().filter(|t| t.active).count();
    println!("\nTenants ({} active of {}):", active, config.tenants.len());
    for tenant in &config.tenants {
        println!(
            "  - {} {}{}",
            tenant.slug,
            tenant.website_url.as_deref().unwrap_or("(no website)"),
            if tenant.active { "" } else { " [inactive]" }
        );
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles `crawl`: one on-demand crawl, optionally cached under a slug
async fn handle_crawl(
    app: &App,
    request: CrawlRequest,
    guide: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = app
        .harvester
        .crawl(&request)
        .await
        .with_context(|| format!("crawl of {} failed", request.website_url))?;

    if let Some(slug) = guide {
        if outcome.pages.is_empty() {
            tracing::warn!("Nothing harvested, cache for '{}' left unchanged", slug);
        } else {
            app.cache
                .save(slug, &request.website_url, outcome.pages.clone())
                .await
                .context("failed to save crawl to cache")?;
        }
    }

    if json {
        print_json(&outcome)
    } else {
        print_crawl_outcome(&outcome);
        Ok(())
    }
}

/// Handles `schedule`: runs the timer until ctrl-c
async fn handle_schedule(app: &App) -> anyhow::Result<()> {
    app.scheduler.start().await;
    tracing::info!("Press ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    app.scheduler.stop().await;
    let status = app.scheduler.status().await;
    if status.running {
        tracing::info!("A sweep is still running; exiting without waiting for it");
    }
    if let Some(stats) = status.last_stats {
        print_run_stats(&stats);
    }
    Ok(())
}

/// Handles `cache` subcommands
async fn handle_cache(app: &App, action: CacheAction, json: bool) -> anyhow::Result<()> {
    match action {
        CacheAction::List => {
            let entries = app.cache.list().await?;
            if json {
                print_json(&entries)
            } else {
                print_cache_listing(&entries);
                Ok(())
            }
        }
        CacheAction::Show { slug } => match app.cache.get_valid_by_guide(&slug).await? {
            Some(document) => print_json(&document),
            None => anyhow::bail!("no valid snapshot for guide '{}'", slug),
        },
        CacheAction::Domain { domain } => match app.cache.get_valid_by_domain(&domain).await? {
            Some(document) => print_json(&document),
            None => anyhow::bail!("no valid snapshot for domain '{}'", domain),
        },
        CacheAction::Cleanup => {
            let removed = app.cache.cleanup_expired().await?;
            println!("✓ Removed {} expired snapshots", removed);
            Ok(())
        }
    }
}
