//! Database repository layer
//!
//! Provides the listing table and bookmark set behind a single connection.
//! Every operation takes the connection lock for its own duration only, so
//! readers and the background ingester can share one [`Store`] through an
//! `Arc` without any locking of their own.

use crate::error::{Error, Result};
use crate::types::{Listing, SavedListing};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Listing and bookmark storage (single connection for now)
pub struct Store {
    conn: Mutex<Connection>,
}

/// Timestamps are stored with fixed precision and a `Z` suffix so that
/// string order matches chronological order.
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Store {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets the CLI read while a scheduler process is writing
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        super::schema::run_migrations(&conn)
    }

    /// A panic while holding the lock cannot leave a half-applied statement
    /// behind, so a poisoned lock is still safe to use.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================
    // Listing operations
    // ============================================

    /// Insert a listing or overwrite every field of the existing row with the same id.
    pub fn upsert(&self, listing: &Listing) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO listings (id, title, company, location, posted_date, url, source, fetched_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                company = excluded.company,
                location = excluded.location,
                posted_date = excluded.posted_date,
                url = excluded.url,
                source = excluded.source,
                fetched_at = excluded.fetched_at
            "#,
            params![
                listing.id,
                listing.title,
                listing.company,
                listing.location,
                listing.posted_date,
                listing.url,
                listing.source,
                format_ts(&listing.fetched_at),
            ],
        )?;
        Ok(())
    }

    /// Most recently fetched listings, newest first, each with its bookmark state.
    ///
    /// Ties on `fetched_at` are ordered by id so repeated calls agree.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<SavedListing>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT l.*, b.listing_id IS NOT NULL AS saved
            FROM listings l
            LEFT JOIN bookmarks b ON b.listing_id = l.id
            ORDER BY l.fetched_at DESC, l.id ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(SavedListing {
                    listing: Self::row_to_listing(row)?,
                    saved: row.get("saved")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!(count = rows.len(), limit, "Retrieved recent listings");
        Ok(rows)
    }

    /// Get a listing by ID
    pub fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM listings WHERE id = ?",
            [id],
            Self::row_to_listing,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Delete a listing. Bookmarks pointing at it are left in place.
    ///
    /// Returns whether a row was removed.
    pub fn delete_listing(&self, id: &str) -> Result<bool> {
        let conn = self.conn();
        let removed = conn.execute("DELETE FROM listings WHERE id = ?", [id])?;
        Ok(removed > 0)
    }

    pub fn count_listings(&self) -> Result<i64> {
        let conn = self.conn();
        let count = conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count)
    }

    /// An unparseable `fetched_at` is logged and read as the Unix epoch, so
    /// one bad row never empties the listing page.
    fn row_to_listing(row: &Row) -> rusqlite::Result<Listing> {
        let id: String = row.get("id")?;
        let fetched_at_str: String = row.get("fetched_at")?;
        let fetched_at = match DateTime::parse_from_rfc3339(&fetched_at_str) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(
                    id = %id,
                    fetched_at = %fetched_at_str,
                    error = %e,
                    "Unreadable fetched_at, treating as oldest"
                );
                DateTime::<Utc>::UNIX_EPOCH
            }
        };

        Ok(Listing {
            id,
            title: row.get("title")?,
            company: row.get("company")?,
            location: row.get("location")?,
            posted_date: row.get("posted_date")?,
            url: row.get("url")?,
            source: row.get("source")?,
            fetched_at,
        })
    }

    // ============================================
    // Bookmark operations
    // ============================================

    /// Add an id to the bookmark set. Idempotent; the id need not exist in listings.
    pub fn bookmark(&self, id: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO bookmarks (listing_id, created_at) VALUES (?1, ?2)",
            params![id, format_ts(&Utc::now())],
        )?;
        Ok(())
    }

    /// Remove an id from the bookmark set. Removing an absent id is not an error.
    pub fn unbookmark(&self, id: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM bookmarks WHERE listing_id = ?", [id])?;
        Ok(())
    }

    pub fn is_bookmarked(&self, id: &str) -> Result<bool> {
        let conn = self.conn();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM bookmarks WHERE listing_id = ?",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All bookmarked ids, including orphans, in id order.
    pub fn bookmarked_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT listing_id FROM bookmarks ORDER BY listing_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}
