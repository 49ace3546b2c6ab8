//! SQLite-backed processing ledger.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{LedgerError, ProcessingLedger, ProcessingRecord};

/// SQLite-backed processing ledger.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Create a new SQLite ledger, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ledger (useful for testing).
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS processed_videos (
                video_id INTEGER PRIMARY KEY,
                processed_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| LedgerError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Database("ledger connection lock poisoned".to_string()))
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl ProcessingLedger for SqliteLedger {
    fn is_processed(&self, video_id: i64) -> Result<bool, LedgerError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM processed_videos WHERE video_id = ?)",
            params![video_id],
            |row| row.get::<_, bool>(0),
        )
        .map_err(|e| LedgerError::Database(e.to_string()))
    }

    fn mark_processed(&self, video_id: i64) -> Result<ProcessingRecord, LedgerError> {
        let conn = self.lock()?;
        let processed_at = Utc::now();

        conn.execute(
            "INSERT INTO processed_videos (video_id, processed_at) VALUES (?, ?)",
            params![video_id, processed_at.to_rfc3339()],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                LedgerError::AlreadyProcessed(video_id)
            } else {
                LedgerError::Database(e.to_string())
            }
        })?;

        Ok(ProcessingRecord {
            video_id,
            processed_at,
        })
    }

    fn get(&self, video_id: i64) -> Result<Option<ProcessingRecord>, LedgerError> {
        let conn = self.lock()?;
        let processed_at_str: Option<String> = conn
            .query_row(
                "SELECT processed_at FROM processed_videos WHERE video_id = ?",
                params![video_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        processed_at_str
            .map(|s| {
                let processed_at = DateTime::parse_from_rfc3339(&s)
                    .map_err(|e| LedgerError::Database(format!("Invalid timestamp: {}", e)))?
                    .with_timezone(&Utc);
                Ok(ProcessingRecord {
                    video_id,
                    processed_at,
                })
            })
            .transpose()
    }

    fn count(&self) -> Result<i64, LedgerError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM processed_videos", [], |row| row.get(0))
            .map_err(|e| LedgerError::Database(e.to_string()))
    }
}
