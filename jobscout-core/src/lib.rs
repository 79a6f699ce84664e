//! # jobscout-core
//!
//! Core library for jobscout - a scheduled collector of remote tech job listings.
//!
//! This library provides:
//! - Domain types for listings and ingestion runs
//! - Source adapters for listing sites and a relevance filter
//! - An ingestion pipeline and the scheduler that drives it
//! - SQLite storage for listings and bookmarks
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Two activities share one [`Store`]:
//! - **Ingestion:** [`Scheduler`] → [`IngestPipeline`] → sources → normalizer → `Store::upsert`
//! - **Serving:** [`JobBoard`] → `Store::list_recent` / `bookmark` / `unbookmark`
//!
//! ## Example
//!
//! ```rust,no_run
//! use jobscout_core::{Config, Store};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let store = Store::open(&Config::database_path()).expect("failed to open database");
//! store.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use board::{Ack, JobBoard};
pub use config::Config;
pub use db::Store;
pub use error::{Error, Result};
pub use ingest::IngestPipeline;
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerState};
pub use types::*;

// Public modules
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod scheduler;
pub mod types;
