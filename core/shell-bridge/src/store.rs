//! In-memory status cache for the shell extension.
//!
//! Two tables: `status` maps a path to its last-known sync status, `visited`
//! records when we last asked the engine about a path. The database lives in
//! process memory only; after a restart the cache is rebuilt from engine
//! pushes, which is why cache operations are best-effort and never surface
//! errors to the file-browser callbacks.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::warn;

use harbor_shell_protocol::SyncStatus;

/// Seconds a visit record suppresses repeat status requests for a path.
pub const VISIT_TTL_SECS: i64 = 3600;

/// Time source for visit bookkeeping, injected so TTL behavior is testable.
pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now(&self) -> i64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open status database: {0}")]
    Open(rusqlite::Error),
    #[error("status query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("status store lock poisoned")]
    Poisoned,
}

/// Process-local cache of per-path sync statuses and visit timestamps.
///
/// Badge-request callbacks and push-notification callbacks arrive on
/// different threads; one mutex around the connection makes each logical
/// read or write a single critical section. The lock is never held across
/// the transport.
pub struct StatusStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl StatusStore {
    pub fn open() -> Result<Self, StoreError> {
        Self::open_with_clock(Arc::new(SystemClock))
    }

    pub fn open_with_clock(clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Open)?;
        conn.execute_batch(
            "BEGIN;
             CREATE TABLE IF NOT EXISTS status (
                path TEXT PRIMARY KEY,
                status TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS visited (
                path TEXT PRIMARY KEY,
                last_visit INTEGER NOT NULL
             );
             COMMIT;",
        )
        .map_err(StoreError::Open)?;

        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    /// Upserts the status for a path; last write wins.
    pub fn put(&self, path: &str, status: SyncStatus) {
        let outcome = self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO status (path, status) VALUES (?1, ?2)",
                params![path, status.as_str()],
            )?;
            Ok(())
        });
        if let Err(err) = outcome {
            warn!(error = %err, path, "Failed to record sync status");
        }
    }

    /// Last-known status for a path, or `None` for "unknown". A stored
    /// string outside the badge vocabulary also reads as unknown.
    pub fn get(&self, path: &str) -> Option<SyncStatus> {
        let row = self.with_conn(|conn| {
            // query_row reads a single row, so historical duplicates for the
            // same key resolve to an arbitrary member of the set.
            conn.query_row(
                "SELECT status FROM status WHERE path = ?1",
                params![path],
                |row| row.get::<_, String>(0),
            )
            .optional()
        });

        match row {
            Ok(Some(raw)) => match SyncStatus::from_str(&raw) {
                Some(status) => Some(status),
                None => {
                    warn!(path, status = %raw, "Ignoring unknown stored status");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, path, "Failed to read sync status");
                None
            }
        }
    }

    /// Records (or refreshes) the visit timestamp for a path.
    pub fn mark_visited(&self, path: &str) {
        let now = self.clock.now();
        let outcome = self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO visited (path, last_visit) VALUES (?1, ?2)",
                params![path, now],
            )?;
            Ok(())
        });
        if let Err(err) = outcome {
            warn!(error = %err, path, "Failed to record visit");
        }
    }

    /// True when no visit record exists or the record has aged past the TTL.
    /// Errors read as "visit", so a broken cache degrades to at most one
    /// extra engine request per callback instead of a permanently stale
    /// badge.
    pub fn should_visit(&self, path: &str) -> bool {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT last_visit FROM visited WHERE path = ?1",
                params![path],
                |row| row.get::<_, i64>(0),
            )
            .optional()
        });

        match row {
            Ok(Some(last_visit)) => self.clock.now() > last_visit + VISIT_TTL_SECS,
            Ok(None) => true,
            Err(err) => {
                warn!(error = %err, path, "Failed to read visit record");
                true
            }
        }
    }

    /// Drops the visit record so the next observation retries immediately,
    /// used when a status request is known to have produced no answer.
    pub fn forget_visit(&self, path: &str) {
        let outcome = self.with_conn(|conn| {
            conn.execute("DELETE FROM visited WHERE path = ?1", params![path])?;
            Ok(())
        });
        if let Err(err) = outcome {
            warn!(error = %err, path, "Failed to clear visit record");
        }
    }

    fn with_conn<T>(
        &self,
        op: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        op(&conn).map_err(StoreError::from)
    }
}
