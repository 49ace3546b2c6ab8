use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{ErrorFilter, ErrorRecord, ErrorReport, ErrorStore, ErrorStoreError, FailureStage};

/// SQLite-backed error store
pub struct SqliteErrorStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS processing_errors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        video_id INTEGER NOT NULL,
        stage TEXT NOT NULL,
        message TEXT NOT NULL,
        detail TEXT NOT NULL,
        occurred_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_processing_errors_video_id ON processing_errors(video_id);
    CREATE INDEX IF NOT EXISTS idx_processing_errors_stage ON processing_errors(stage);
    CREATE INDEX IF NOT EXISTS idx_processing_errors_occurred_at ON processing_errors(occurred_at);
"#;

impl SqliteErrorStore {
    /// Create a new SQLite error store, creating the database file and tables if needed
    pub fn new(path: &Path) -> Result<Self, ErrorStoreError> {
        let conn = Connection::open(path).map_err(|e| ErrorStoreError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ErrorStoreError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite error store (useful for testing)
    pub fn in_memory() -> Result<Self, ErrorStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ErrorStoreError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ErrorStoreError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ErrorStoreError> {
        self.conn
            .lock()
            .map_err(|_| ErrorStoreError::Database("error store lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &ErrorFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(video_id) = filter.video_id {
            conditions.push("video_id = ?");
            params.push(Box::new(video_id));
        }

        if let Some(stage) = filter.stage {
            conditions.push("stage = ?");
            params.push(Box::new(stage.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

impl ErrorStore for SqliteErrorStore {
    fn insert(&self, report: &ErrorReport) -> Result<i64, ErrorStoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO processing_errors (video_id, stage, message, detail, occurred_at) VALUES (?, ?, ?, ?, ?)",
            params![
                report.video_id,
                report.stage.as_str(),
                report.message,
                report.detail,
                report.occurred_at.to_rfc3339(),
            ],
        )
        .map_err(|e| ErrorStoreError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &ErrorFilter) -> Result<Vec<ErrorRecord>, ErrorStoreError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, video_id, stage, message, detail, occurred_at FROM processing_errors {} ORDER BY id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ErrorStoreError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let id: i64 = row.get(0)?;
                let video_id: i64 = row.get(1)?;
                let stage: String = row.get(2)?;
                let message: String = row.get(3)?;
                let detail: String = row.get(4)?;
                let occurred_at: String = row.get(5)?;

                Ok((id, video_id, stage, message, detail, occurred_at))
            })
            .map_err(|e| ErrorStoreError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row_result in rows {
            let (id, video_id, stage_str, message, detail, occurred_at_str) =
                row_result.map_err(|e| ErrorStoreError::Database(e.to_string()))?;

            let stage: FailureStage = stage_str.parse().map_err(ErrorStoreError::Database)?;

            let occurred_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&occurred_at_str)
                .map_err(|e| ErrorStoreError::Database(format!("Invalid timestamp: {}", e)))?
                .into();

            records.push(ErrorRecord {
                id,
                video_id,
                stage,
                message,
                detail,
                occurred_at,
            });
        }

        Ok(records)
    }

    fn count(&self, filter: &ErrorFilter) -> Result<i64, ErrorStoreError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM processing_errors {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| ErrorStoreError::Database(e.to_string()))
    }
}
