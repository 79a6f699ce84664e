//! Ingestion layer for fetching listing sites into the store
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │  Listing sites  │ ──► │  IngestPipeline  │ ──► │      Store      │
//! │ (Indeed, WWR..) │     │                  │     │ (listings, ...) │
//! └─────────────────┘     └──────────────────┘     └─────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────────┐
//!                    │  SourceAdapter       │
//!                    │  ├─ Indeed           │
//!                    │  ├─ WeWorkRemotely   │
//!                    │  └─ custom HTML      │
//!                    └──────────────────────┘
//! ```
//!
//! A run fetches every source concurrently, normalizes what came back,
//! substitutes placeholder listings if nothing survived, and upserts each
//! listing on its own. No step is fatal: failures are recorded in the
//! returned [`IngestionRun`] and logged.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jobscout_core::{Config, Store};
//! use jobscout_core::ingest::{sources, IngestPipeline};
//!
//! let store = Arc::new(Store::open(&Config::database_path())?);
//! let pipeline = IngestPipeline::new(store, sources::create_all_sources(&config)?);
//!
//! let run = pipeline.run().await;
//! println!("Wrote {} listings from {} sources", run.listings_written, run.succeeded_count());
//! ```

mod fallback;
pub mod filter;
pub mod normalize;
mod source;
pub mod sources;

pub use fallback::{placeholder_listings, PLACEHOLDER_SOURCE};
pub use filter::is_relevant;
pub use normalize::{listing_id, normalize};
pub use source::{extract_candidates, http_client, HtmlLayout, HtmlSource, SourceAdapter};

use crate::db::Store;
use crate::error::{Error, Result};
use crate::types::{IngestionRun, Listing, RawCandidate, SourceOutcome, SourceStatus};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Orchestrates one ingestion run across all registered sources.
///
/// The pipeline is responsible for:
/// - Fetching every source with a per-fetch timeout
/// - Normalizing and filtering candidates
/// - Falling back to placeholder data when a run yields nothing
/// - Writing listings to the [`Store`] one row at a time
pub struct IngestPipeline {
    store: Arc<Store>,
    sources: Vec<Box<dyn SourceAdapter>>,
    fetch_timeout: Duration,
}

impl IngestPipeline {
    pub fn new(store: Arc<Store>, sources: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self {
            store,
            sources,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Override the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn SourceAdapter> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// Run one full ingestion pass.
    pub async fn run(&self) -> IngestionRun {
        let started_at = Utc::now();
        tracing::info!(sources = self.sources.len(), "Starting ingestion run");

        let fetched = join_all(self.sources.iter().map(|s| self.fetch_source(s.as_ref()))).await;

        let mut outcomes = Vec::with_capacity(self.sources.len());
        let mut listings = Vec::new();

        for (source, result) in self.sources.iter().zip(fetched) {
            let status = match result {
                Ok(candidates) => {
                    let before = listings.len();
                    listings.extend(
                        candidates
                            .iter()
                            .filter_map(|c| normalize(c, source.name(), source.base_url())),
                    );
                    let accepted = listings.len() - before;
                    tracing::info!(
                        source = %source.name(),
                        candidates = candidates.len(),
                        accepted,
                        "Source fetched"
                    );
                    SourceStatus::Succeeded {
                        candidates: candidates.len(),
                        accepted,
                    }
                }
                Err(e) => {
                    tracing::error!(source = %source.name(), error = %e, "Source fetch failed");
                    SourceStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(SourceOutcome {
                source: source.name().to_string(),
                status,
            });
        }

        let used_fallback = listings.is_empty();
        if used_fallback {
            tracing::warn!("No listings found from any source, loading placeholder listings");
            listings = placeholder_listings();
        }

        let listings = collapse_duplicates(listings);
        let (listings_written, listings_failed) = self.write_listings(listings).await;

        let run = IngestionRun {
            started_at,
            finished_at: Utc::now(),
            sources: outcomes,
            listings_written,
            listings_failed,
            used_fallback,
        };

        tracing::info!(
            sources_ok = run.succeeded_count(),
            sources_failed = run.failed_count(),
            listings_written = run.listings_written,
            listings_failed = run.listings_failed,
            used_fallback = run.used_fallback,
            duration_ms = run.duration().num_milliseconds(),
            "Ingestion run complete"
        );

        run
    }

    /// Fetch one source, converting a timeout into a fetch error.
    async fn fetch_source(&self, source: &dyn SourceAdapter) -> Result<Vec<RawCandidate>> {
        match tokio::time::timeout(self.fetch_timeout, source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(Error::fetch(
                source.name(),
                format!("timed out after {}s", self.fetch_timeout.as_secs_f64()),
            )),
        }
    }

    /// Upsert each listing independently, stamping `fetched_at` at write time.
    ///
    /// Runs on the blocking pool so SQLite work never stalls the runtime.
    /// Returns `(written, failed)`.
    async fn write_listings(&self, listings: Vec<Listing>) -> (usize, usize) {
        let store = Arc::clone(&self.store);
        let total = listings.len();

        let joined = tokio::task::spawn_blocking(move || {
            let mut written = 0;
            let mut failed = 0;
            for mut listing in listings {
                listing.fetched_at = Utc::now();
                match store.upsert(&listing) {
                    Ok(()) => written += 1,
                    Err(e) => {
                        failed += 1;
                        tracing::error!(id = %listing.id, error = %e, "Failed to save listing");
                    }
                }
            }
            (written, failed)
        })
        .await;

        match joined {
            Ok(counts) => counts,
            Err(e) => {
                tracing::error!(error = %e, "Listing writer task failed");
                (0, total)
            }
        }
    }
}

/// Keep one listing per id, the last one seen, at the position of the first.
fn collapse_duplicates(listings: Vec<Listing>) -> Vec<Listing> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(listings.len());
    let mut unique: Vec<Listing> = Vec::with_capacity(listings.len());

    for listing in listings {
        match positions.get(&listing.id) {
            Some(&index) => unique[index] = listing,
            None => {
                positions.insert(listing.id.clone(), unique.len());
                unique.push(listing);
            }
        }
    }

    unique
}
