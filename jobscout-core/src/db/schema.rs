//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: listings + bookmarks
    r#"
    CREATE TABLE IF NOT EXISTS listings (
        id               TEXT PRIMARY KEY,
        title            TEXT NOT NULL,
        company          TEXT NOT NULL,
        location         TEXT NOT NULL,
        posted_date      TEXT NOT NULL,
        url              TEXT NOT NULL,
        source           TEXT NOT NULL,
        fetched_at       TEXT NOT NULL
    );

    -- No foreign key: a bookmark may outlive its listing.
    CREATE TABLE IF NOT EXISTS bookmarks (
        listing_id       TEXT PRIMARY KEY,
        created_at       TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_listings_fetched_at ON listings(fetched_at DESC, id);
    CREATE INDEX IF NOT EXISTS idx_listings_source ON listings(source);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
