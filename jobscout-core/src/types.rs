//! Core domain types for jobscout
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Source** | One external listing site (Indeed, WeWorkRemotely, ...) |
//! | **RawCandidate** | Text scraped from one listing card, before normalization |
//! | **Listing** | A normalized job posting with a stable identity |
//! | **Bookmark** | A saved listing id; may outlive the listing it points to |
//! | **IngestionRun** | Summary of one pipeline run, logged and discarded |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used for any listing field a source did not provide.
pub const UNKNOWN: &str = "Unknown";

// ============================================
// Listings
// ============================================

/// Raw text fields extracted from one listing card.
///
/// Every field is optional because markup drifts; the normalizer decides
/// what a missing value becomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub posted_date: Option<String>,
    /// Link as it appeared in the markup (may be relative)
    pub href: Option<String>,
}

/// A discovered job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Stable identity derived from `(source, url)`
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted_date: String,
    /// Absolute, canonical URL of the posting
    pub url: String,
    /// Name of the source that produced it
    pub source: String,
    /// When this listing was last written to the store
    pub fetched_at: DateTime<Utc>,
}

/// A listing annotated with its bookmark state, as shown to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedListing {
    pub listing: Listing,
    pub saved: bool,
}

// ============================================
// Ingestion runs
// ============================================

/// Outcome of fetching one source during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Page fetched; `candidates` cards extracted, `accepted` survived normalization
    Succeeded { candidates: usize, accepted: usize },
    /// Fetch or extraction failed; the source contributed nothing this run
    Failed { error: String },
}

impl SourceStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceStatus::Succeeded { .. })
    }
}

/// Per-source entry in an [`IngestionRun`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// Summary of one pipeline run. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per registered source, in registration order
    pub sources: Vec<SourceOutcome>,
    /// Listings successfully upserted
    pub listings_written: usize,
    /// Listings whose upsert failed
    pub listings_failed: usize,
    /// Whether placeholder data was substituted for an empty result
    pub used_fallback: bool,
}

impl IngestionRun {
    /// Names of every source attempted, in order.
    pub fn sources_attempted(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.source.as_str()).collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.sources.iter().filter(|s| s.status.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.sources.len() - self.succeeded_count()
    }

    /// Outcome for a named source, if it was attempted.
    pub fn outcome(&self, source: &str) -> Option<&SourceStatus> {
        self.sources
            .iter()
            .find(|s| s.source == source)
            .map(|s| &s.status)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Pretty JSON summary for machine consumers.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(statuses: Vec<(&str, SourceStatus)>) -> IngestionRun {
        let now = Utc::now();
        IngestionRun {
            started_at: now,
            finished_at: now,
            sources: statuses
                .into_iter()
                .map(|(source, status)| SourceOutcome {
                    source: source.to_string(),
                    status,
                })
                .collect(),
            listings_written: 0,
            listings_failed: 0,
            used_fallback: false,
        }
    }

    #[test]
    fn test_run_counts() {
        let run = run_with(vec![
            (
                "Indeed",
                SourceStatus::Failed {
                    error: "timeout".to_string(),
                },
            ),
            (
                "WeWorkRemotely",
                SourceStatus::Succeeded {
                    candidates: 10,
                    accepted: 4,
                },
            ),
        ]);

        assert_eq!(run.sources_attempted(), vec!["Indeed", "WeWorkRemotely"]);
        assert_eq!(run.succeeded_count(), 1);
        assert_eq!(run.failed_count(), 1);
        assert!(!run.outcome("Indeed").unwrap().is_success());
        assert!(run.outcome("Missing").is_none());
    }

    #[test]
    fn test_source_outcome_serializes_flat() {
        let outcome = SourceOutcome {
            source: "Indeed".to_string(),
            status: SourceStatus::Failed {
                error: "HTTP 403".to_string(),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["source"], "Indeed");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "HTTP 403");
    }

    #[test]
    fn test_run_json_summary() {
        let mut run = run_with(vec![(
            "WeWorkRemotely",
            SourceStatus::Succeeded {
                candidates: 3,
                accepted: 2,
            },
        )]);
        run.listings_written = 2;

        let json: serde_json::Value = serde_json::from_str(&run.to_json().unwrap()).unwrap();
        assert_eq!(json["listings_written"], 2);
        assert_eq!(json["used_fallback"], false);
        assert_eq!(json["sources"][0]["status"], "succeeded");
        assert_eq!(json["sources"][0]["accepted"], 2);
    }
}
