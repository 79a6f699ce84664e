//! Database layer for jobscout
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - A concurrency-safe [`Store`] for listings and bookmarks

pub mod repo;
pub mod schema;

pub use repo::Store;
