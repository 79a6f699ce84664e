//! Read and bookmark surface for the serving layer
//!
//! [`JobBoard`] is what a web route or CLI command calls. It never returns
//! storage errors: reads degrade to an empty list and writes report a
//! generic [`Ack::Failed`], with the cause logged.

use crate::db::Store;
use crate::types::SavedListing;
use serde::Serialize;
use std::sync::Arc;

/// Acknowledgement for a bookmark change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ack {
    Ok,
    Failed,
}

impl Ack {
    pub fn is_ok(&self) -> bool {
        matches!(self, Ack::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ack::Ok => "success",
            Ack::Failed => "error",
        }
    }
}

/// Facade over the [`Store`] for readers.
#[derive(Clone)]
pub struct JobBoard {
    store: Arc<Store>,
    default_limit: usize,
}

impl JobBoard {
    pub fn new(store: Arc<Store>, default_limit: usize) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// The `limit` most recently fetched listings with bookmark flags.
    pub fn recent_listings(&self, limit: usize) -> Vec<SavedListing> {
        match self.store.list_recent(limit) {
            Ok(listings) => listings,
            Err(e) => {
                tracing::error!(error = %e, "Error retrieving listings");
                Vec::new()
            }
        }
    }

    /// Recent listings using the configured page size.
    pub fn front_page(&self) -> Vec<SavedListing> {
        self.recent_listings(self.default_limit)
    }

    pub fn save_bookmark(&self, id: &str) -> Ack {
        match self.store.bookmark(id) {
            Ok(()) => {
                tracing::info!(id, "Saved bookmark");
                Ack::Ok
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Error saving bookmark");
                Ack::Failed
            }
        }
    }

    pub fn remove_bookmark(&self, id: &str) -> Ack {
        match self.store.unbookmark(id) {
            Ok(()) => {
                tracing::info!(id, "Removed bookmark");
                Ack::Ok
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Error removing bookmark");
                Ack::Failed
            }
        }
    }
}
