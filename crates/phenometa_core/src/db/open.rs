//! Read-only connection bootstrap for the metadata store.
//!
//! # Invariants
//! - Connections are opened with `SQLITE_OPEN_READ_ONLY` and `query_only=ON`.
//! - Connections are opened without SQLite's internal mutex; callers keep
//!   each connection on a single thread.
//! - Paths are always plain filenames. Relative paths are anchored at `./`
//!   because the bundled SQLite parses any name starting with `file:` as a
//!   URI, flag or not.

use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::borrow::Cow;
use std::path::Path;
use std::time::{Duration, Instant};

/// Tables the metadata lookups select from.
pub const REQUIRED_TABLES: &[&str] = &["dataset", "trait"];

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the metadata store at `path` for read-only use.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
///
/// # Errors
/// - `DbError::Sqlite` when the file is absent or not a SQLite database.
/// - `DbError::MissingTable` when a table from [`REQUIRED_TABLES`] is absent.
pub fn open_metadata_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=read_only path={}",
        path.display()
    );

    let conn = match Connection::open_with_flags(plain_filename(path), read_only_flags()) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=read_only duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode=read_only duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=read_only duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn read_only_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

fn plain_filename(path: &Path) -> Cow<'_, Path> {
    if path.is_relative() {
        Cow::Owned(Path::new(".").join(path))
    } else {
        Cow::Borrowed(path)
    }
}

fn bootstrap_connection(conn: &Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA query_only = ON;")?;
    for table in REQUIRED_TABLES.iter().copied() {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
