//! Shared application state for the HTTP server.
//!
//! Holds configuration and the database location. Each request opens its own
//! SQLite connection; nothing here holds a lock across `.await`.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::config::ServerConfig;
use crate::db::{self, AuditRow};

/// Maximum audit buffer size before flush.
const AUDIT_BUFFER_CAPACITY: usize = 100;

/// Audit entries older than this are pruned on flush.
const AUDIT_RETENTION_DAYS: i64 = 90;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: ServerConfig,
    db_path: PathBuf,
    audit: AuditLogger,
}

impl CoreState {
    pub fn new(config: ServerConfig) -> Self {
        let db_path = config.database_path();
        Self {
            config,
            db_path,
            audit: AuditLogger::new(),
        }
    }

    /// Creates the data directory and applies migrations once.
    pub fn initialize(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::DataDir(e.to_string()))?;
        }
        drop(self.open_db()?);
        tracing::info!(path = %self.db_path.display(), "Database ready");
        Ok(())
    }

    /// Open a database connection.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    // ── Audit ───────────────────────────────────────────────

    /// Buffer an access event, flushing when the buffer is full.
    pub fn log_access(&self, actor: &str, action: &str, outcome: &str) {
        let needs_flush = self.audit.log(actor, action, outcome);
        if needs_flush {
            if let Err(e) = self.flush_and_prune_audit() {
                tracing::warn!("Auto-flush audit failed: {e}");
            }
        }
    }

    /// Get the current audit buffer contents.
    pub fn audit_entries(&self) -> Vec<AuditRow> {
        self.audit.entries()
    }

    /// Flush audit buffer to DB and prune old entries.
    pub fn flush_and_prune_audit(&self) -> Result<usize, CoreError> {
        let conn = self.open_db()?;
        let flushed = self.audit.flush_to_db(&conn)?;
        db::prune_audit_log(&conn, AUDIT_RETENTION_DAYS)?;
        Ok(flushed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Cannot prepare data directory: {0}")]
    DataDir(String),
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Audit logger
// ═══════════════════════════════════════════════════════════

/// In-memory audit log buffer. Entries are flushed to SQLite
/// when the buffer reaches capacity or on explicit flush.
pub struct AuditLogger {
    buffer: Mutex<Vec<AuditRow>>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(AUDIT_BUFFER_CAPACITY)),
        }
    }

    /// Returns `true` if the buffer has reached flush threshold.
    pub fn log(&self, actor: &str, action: &str, outcome: &str) -> bool {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.push(AuditRow {
                timestamp: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
                actor: actor.to_string(),
                action: action.to_string(),
                outcome: outcome.to_string(),
            });
            buf.len() >= AUDIT_BUFFER_CAPACITY
        } else {
            false
        }
    }

    pub fn entries(&self) -> Vec<AuditRow> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    pub fn drain(&self) -> Vec<AuditRow> {
        self.buffer
            .lock()
            .map(|mut buf| buf.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    pub fn flush_to_db(&self, conn: &rusqlite::Connection) -> Result<usize, CoreError> {
        let entries = self.drain();
        if entries.is_empty() {
            return Ok(0);
        }
        db::insert_audit_entries(conn, &entries)?;
        tracing::debug!(count = entries.len(), "Flushed audit entries to database");
        Ok(entries.len())
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_state() -> (tempfile::TempDir, CoreState) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_dir: dir.path().join("data"),
            ..ServerConfig::default()
        };
        (dir, CoreState::new(config))
    }

    #[test]
    fn initialize_creates_database() {
        let (_dir, state) = temp_state();
        state.initialize().unwrap();
        assert!(state.db_path().exists());
        let conn = state.open_db().unwrap();
        assert_eq!(db::list_services(&conn, true).unwrap().len(), 6);
    }

    #[test]
    fn audit_buffers_until_flush() {
        let (_dir, state) = temp_state();
        state.initialize().unwrap();
        state.log_access("user:a", "GET /api/patients", "status:200");
        state.log_access("anonymous", "GET /api/staff", "status:401");
        assert_eq!(state.audit_entries().len(), 2);

        assert_eq!(state.flush_and_prune_audit().unwrap(), 2);
        assert!(state.audit_entries().is_empty());

        let conn = state.open_db().unwrap();
        let stored = db::query_audit_by_actor(&conn, "user:a", 10).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].outcome, "status:200");
    }

    #[test]
    fn full_buffer_flushes_itself() {
        let (_dir, state) = temp_state();
        state.initialize().unwrap();
        for _ in 0..AUDIT_BUFFER_CAPACITY {
            state.log_access("user:a", "GET /api/calendar", "status:200");
        }
        assert_eq!(state.audit.buffer_len(), 0);
        let conn = state.open_db().unwrap();
        assert_eq!(
            db::query_audit_by_actor(&conn, "user:a", 500).unwrap().len(),
            AUDIT_BUFFER_CAPACITY
        );
    }

    #[test]
    fn empty_flush_is_noop() {
        let (_dir, state) = temp_state();
        state.initialize().unwrap();
        assert_eq!(state.flush_and_prune_audit().unwrap(), 0);
    }
}
