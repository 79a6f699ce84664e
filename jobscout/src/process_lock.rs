//! Process-level lock so only one jobscout process ingests into a database.
//!
//! `jobscout run` and `jobscout sync` both write listings. The lock is an
//! advisory OS file lock (flock) scoped to the database path and held for
//! the life of the guard. Readers (`list`, `save`, `unsave`) never take it.

use anyhow::{Context, Result};
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{self, Seek, SeekFrom, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

const INGEST_LOCK_FILE: &str = "jobscout-ingest.lock";

/// Held by the process that owns ingestion for a database.
pub struct IngestGuard {
    file: File,
    path: PathBuf,
}

// The lock file stays on disk. Unlinking it would let a waiter lock the
// orphaned inode while a newcomer locks a fresh file at the same path.
impl Drop for IngestGuard {
    fn drop(&mut self) {
        let _ = unlock_file(&self.file);
        tracing::debug!(path = %self.path.display(), "Released ingest lock");
    }
}

/// Acquire the ingest lock for `db_path`.
///
/// Fails if another `run` or `sync` already holds it.
pub fn acquire_ingest_guard(db_path: &Path) -> Result<IngestGuard> {
    acquire_in(&lock_dir(), db_path)?.with_context(|| {
        format!(
            "another jobscout ingest process is already running for {}",
            db_path.display()
        )
    })
}

fn acquire_in(dir: &Path, db_path: &Path) -> Result<Option<IngestGuard>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create runtime lock directory: {}", dir.display()))?;

    let path = dir.join(scoped_lock_filename(db_path));
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("failed to open lock file: {}", path.display()))?;

    match lock_file_nonblocking(&file) {
        Ok(()) => {
            // Owner pid, for debugging stale locks
            let _ = file.set_len(0);
            let _ = file.seek(SeekFrom::Start(0));
            let _ = writeln!(file, "pid={}", std::process::id());
            let _ = file.flush();

            Ok(Some(IngestGuard { file, path }))
        }
        Err(e) if is_lock_busy(&e) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to lock file: {}", path.display())),
    }
}

fn lock_dir() -> PathBuf {
    let mut dir = match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir(),
    };
    dir.push("jobscout");
    dir
}

fn scoped_lock_filename(db_path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    db_path.to_string_lossy().hash(&mut hasher);
    format!("{INGEST_LOCK_FILE}.{:016x}", hasher.finish())
}

fn is_lock_busy(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock)
        || matches!(error.raw_os_error(), Some(11) | Some(35))
}

#[cfg(unix)]
fn lock_file_nonblocking(file: &File) -> io::Result<()> {
    const LOCK_EX: i32 = 2;
    const LOCK_NB: i32 = 4;
    // SAFETY: flock is called with a valid file descriptor and constant flags.
    let rc = unsafe { flock(file.as_raw_fd(), LOCK_EX | LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn unlock_file(file: &File) -> io::Result<()> {
    const LOCK_UN: i32 = 8;
    // SAFETY: flock is called with a valid file descriptor and constant flags.
    let rc = unsafe { flock(file.as_raw_fd(), LOCK_UN) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
extern "C" {
    fn flock(fd: i32, operation: i32) -> i32;
}

#[cfg(not(unix))]
compile_error!("jobscout process locks currently require Unix (macOS/Linux)");
