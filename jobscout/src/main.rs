//! jobscout - collect remote tech job listings on a schedule
//!
//! Fetches listing sites, keeps the technology-related postings in a local
//! SQLite database, and lets you bookmark the ones worth a second look.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/jobscout/jobs.db (~/.local/share/jobscout/jobs.db)
//! - Logs: $XDG_STATE_HOME/jobscout/jobscout.log (~/.local/state/jobscout/jobscout.log)
//! - Config: $XDG_CONFIG_HOME/jobscout/config.toml (~/.config/jobscout/config.toml)

mod process_lock;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobscout_core::ingest::sources::{self, BUILTIN_SOURCES};
use jobscout_core::ingest::IngestPipeline;
use jobscout_core::{Config, IngestionRun, JobBoard, Scheduler, SourceStatus, Store};
use process_lock::acquire_ingest_guard;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(about = "Collect remote tech job listings and bookmark the good ones")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest on a schedule until Ctrl+C
    Run,
    /// Run one ingestion pass and print a summary
    Sync {
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recently fetched listings
    List {
        /// Number of listings to show (defaults to store.listing_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Bookmark a listing by id
    Save { id: String },
    /// Remove a bookmark by id
    Unsave { id: String },
    /// Show configured sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        jobscout_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("jobscout starting");

    match args.command {
        Command::Run => run_scheduler(&config).await,
        Command::Sync { json } => run_single_sync(&config, json).await,
        Command::List { limit } => list_listings(&config, limit),
        Command::Save { id } => {
            let ack = open_board(&config)?.save_bookmark(&id);
            println!("{}", ack.as_str());
            if !ack.is_ok() {
                anyhow::bail!("failed to save bookmark {}", id);
            }
            Ok(())
        }
        Command::Unsave { id } => {
            let ack = open_board(&config)?.remove_bookmark(&id);
            println!("{}", ack.as_str());
            if !ack.is_ok() {
                anyhow::bail!("failed to remove bookmark {}", id);
            }
            Ok(())
        }
        Command::Sources => {
            print_sources(&config);
            Ok(())
        }
    }
}

/// Open and migrate the store at its XDG path.
fn open_store() -> Result<Arc<Store>> {
    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let store = Store::open(&db_path).context("failed to open database")?;
    store.migrate().context("failed to run database migrations")?;
    Ok(Arc::new(store))
}

fn open_board(config: &Config) -> Result<JobBoard> {
    Ok(JobBoard::new(open_store()?, config.store.listing_limit))
}

fn build_pipeline(config: &Config, store: Arc<Store>) -> Result<IngestPipeline> {
    let sources = sources::create_all_sources(config).context("failed to create sources")?;
    Ok(IngestPipeline::new(store, sources).with_fetch_timeout(config.fetch.timeout()))
}

async fn run_single_sync(config: &Config, json: bool) -> Result<()> {
    let db_path = Config::database_path();
    let _ingest_guard = acquire_ingest_guard(&db_path).context("failed to acquire process lock")?;

    let store = open_store()?;
    let pipeline = build_pipeline(config, store)?;
    let run = pipeline.run().await;

    if json {
        println!("{}", run.to_json().context("failed to encode run summary")?);
    } else {
        println!("Database: {}", db_path.display());
        println!("Logs:     {}", Config::state_dir().display());
        print_run_summary(&run);
    }
    Ok(())
}

async fn run_scheduler(config: &Config) -> Result<()> {
    let db_path = Config::database_path();
    let _ingest_guard = acquire_ingest_guard(&db_path).context("failed to acquire process lock")?;

    let store = open_store()?;
    let pipeline = Arc::new(build_pipeline(config, store)?);
    let source_count = pipeline.sources().count();

    let handle = Scheduler::new(pipeline, &config.scheduler).start();

    println!(
        "Scheduler active: {} source(s), every {}h. Press Ctrl+C to stop.",
        source_count, config.scheduler.interval_hours
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    eprintln!("\nShutting down...");
    let stats = handle.scheduler().stats();
    handle.shutdown().await;

    println!(
        "Scheduler stopped after {} run(s) ({} skipped tick(s)).",
        stats.runs_completed, stats.ticks_skipped
    );
    tracing::info!(
        runs_started = stats.runs_started,
        runs_completed = stats.runs_completed,
        ticks_skipped = stats.ticks_skipped,
        "jobscout scheduler stopped"
    );

    Ok(())
}

fn list_listings(config: &Config, limit: Option<usize>) -> Result<()> {
    let board = open_board(config)?;
    let listings = board.recent_listings(limit.unwrap_or_else(|| board.default_limit()));

    if listings.is_empty() {
        println!("No listings yet. Run `jobscout sync` to fetch some.");
        return Ok(());
    }

    for entry in &listings {
        let listing = &entry.listing;
        let marker = if entry.saved { "*" } else { " " };
        println!(
            "{} {}  {} | {} | {} | {}",
            marker, listing.id, listing.title, listing.company, listing.location, listing.posted_date
        );
        println!(
            "    {} via {} (fetched {})",
            listing.url,
            listing.source,
            listing
                .fetched_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

fn print_sources(config: &Config) {
    println!("Built-in sources:");
    for name in BUILTIN_SOURCES {
        let state = if config.sources.is_disabled(name) {
            "disabled"
        } else {
            "enabled"
        };
        println!("  {:<16} {}", name, state);
    }

    if !config.sources.custom.is_empty() {
        println!("\nCustom sources:");
        for custom in &config.sources.custom {
            let state = if config.sources.is_disabled(&custom.name) {
                "disabled"
            } else {
                "enabled"
            };
            println!("  {:<16} {} {}", custom.name, state, custom.url);
        }
    }
}

/// Print ingestion run summary
fn print_run_summary(run: &IngestionRun) {
    println!("\nSync complete:");
    println!("  Sources succeeded: {}", run.succeeded_count());
    println!("  Sources failed:    {}", run.failed_count());
    println!("  Listings written:  {}", run.listings_written);
    if run.listings_failed > 0 {
        println!("  Listings failed:   {}", run.listings_failed);
    }
    if run.used_fallback {
        println!("  No listings found; placeholder listings were loaded");
    }

    if !run.sources.is_empty() {
        println!("\nSources:");
        for outcome in &run.sources {
            match &outcome.status {
                SourceStatus::Succeeded {
                    candidates,
                    accepted,
                } => println!(
                    "  {}: {} of {} candidate(s) kept",
                    outcome.source, accepted, candidates
                ),
                SourceStatus::Failed { error } => println!("  {}: failed ({})", outcome.source, error),
            }
        }
    }

    tracing::info!(
        listings_written = run.listings_written,
        used_fallback = run.used_fallback,
        "jobscout sync complete"
    );
}
