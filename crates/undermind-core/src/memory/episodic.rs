//! Episodic Store
//!
//! Durable, timestamp-indexed event log backed by SQLite. Uses separate
//! reader/writer connections behind mutexes so readers and the single
//! writer can proceed independently; writes are serialized per store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use super::record::{MemoryRecord, MemoryType};
use crate::error::{StorageError, StorageResult};

/// SQLite-backed episodic memory
pub struct EpisodicStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl EpisodicStore {
    /// Open (or create) the episodic database at `db_path`
    pub fn new(db_path: &Path) -> StorageResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let writer = Connection::open(db_path)?;
        configure_connection(&writer)?;
        writer.execute_batch(
            "CREATE TABLE IF NOT EXISTS episodes (
                memory_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                memory_type TEXT DEFAULT 'episodic',
                importance REAL DEFAULT 0.5,
                domain TEXT DEFAULT '',
                tags TEXT DEFAULT '[]',
                source TEXT DEFAULT '',
                timestamp TEXT NOT NULL,
                access_count INTEGER DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_episodes_timestamp
                ON episodes(timestamp DESC);
            CREATE INDEX IF NOT EXISTS idx_episodes_importance
                ON episodes(importance DESC);",
        )?;

        let reader = Connection::open(db_path)?;
        configure_connection(&reader)?;

        Ok(Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }

    fn write(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Lock("episodic writer".to_string()))
    }

    fn read(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Lock("episodic reader".to_string()))
    }

    /// Store (upsert) a record
    pub fn store(&self, record: &MemoryRecord) -> StorageResult<()> {
        let tags = serde_json::to_string(&record.tags).unwrap_or_else(|_| "[]".to_string());
        self.write()?.execute(
            "INSERT OR REPLACE INTO episodes
             (memory_id, content, memory_type, importance, domain, tags, source, timestamp, access_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.memory_id,
                record.content,
                record.memory_type.as_str(),
                record.importance,
                record.domain,
                tags,
                record.source,
                record.timestamp.to_rfc3339(),
                record.access_count,
            ],
        )?;
        Ok(())
    }

    /// The most recent events, newest first
    pub fn recall_recent(&self, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        self.query(
            "SELECT * FROM episodes ORDER BY timestamp DESC LIMIT ?1",
            params![limit as i64],
        )
    }

    /// Events for a specific domain, newest first
    pub fn recall_by_domain(&self, domain: &str, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        self.query(
            "SELECT * FROM episodes WHERE domain = ?1 ORDER BY timestamp DESC LIMIT ?2",
            params![domain, limit as i64],
        )
    }

    /// Events at or above a minimum importance, most important first
    pub fn recall_important(
        &self,
        limit: usize,
        min_importance: f64,
    ) -> StorageResult<Vec<MemoryRecord>> {
        self.query(
            "SELECT * FROM episodes WHERE importance >= ?1 ORDER BY importance DESC LIMIT ?2",
            params![min_importance, limit as i64],
        )
    }

    /// Case-insensitive substring search over content, newest first
    pub fn search_content(&self, query: &str, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        let pattern = format!("%{}%", escape_like(query));
        self.query(
            "SELECT * FROM episodes WHERE content LIKE ?1 ESCAPE '\\'
             ORDER BY timestamp DESC LIMIT ?2",
            params![pattern, limit as i64],
        )
    }

    /// Fetch a single record by id
    pub fn get(&self, memory_id: &str) -> StorageResult<Option<MemoryRecord>> {
        let records = self.query(
            "SELECT * FROM episodes WHERE memory_id = ?1",
            params![memory_id],
        )?;
        Ok(records.into_iter().next())
    }

    /// Increment a record's access counter
    pub fn touch(&self, memory_id: &str) -> StorageResult<()> {
        self.write()?.execute(
            "UPDATE episodes SET access_count = access_count + 1 WHERE memory_id = ?1",
            params![memory_id],
        )?;
        Ok(())
    }

    /// Delete a record by id
    pub fn delete(&self, memory_id: &str) -> StorageResult<()> {
        self.write()?
            .execute("DELETE FROM episodes WHERE memory_id = ?1", params![memory_id])?;
        Ok(())
    }

    /// Retain the `keep` highest-(importance, timestamp) records; returns the
    /// number deleted
    pub fn prune(&self, keep: usize) -> StorageResult<usize> {
        let before = self.count()?;
        if before <= keep {
            return Ok(0);
        }
        self.write()?.execute(
            "DELETE FROM episodes WHERE memory_id NOT IN
             (SELECT memory_id FROM episodes ORDER BY importance DESC, timestamp DESC LIMIT ?1)",
            params![keep as i64],
        )?;
        Ok(before - self.count()?)
    }

    /// Total number of stored events
    pub fn count(&self) -> StorageResult<usize> {
        let count: i64 =
            self.read()?
                .query_row("SELECT COUNT(*) FROM episodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete every stored event
    pub fn clear(&self) -> StorageResult<()> {
        self.write()?.execute("DELETE FROM episodes", [])?;
        Ok(())
    }

    fn query(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<MemoryRecord>> {
        let reader = self.read()?;
        let mut stmt = reader.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Apply the shared SQLite pragmas (WAL, busy timeout)
pub(crate) fn configure_connection(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA foreign_keys = ON;",
    )?;
    Ok(())
}

/// Escape LIKE wildcards so user queries match literally
pub(crate) fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Parse an RFC 3339 timestamp column
pub(crate) fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Parse a JSON-encoded tags column, degrading to empty on malformed data
pub(crate) fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let memory_type: String = row.get("memory_type")?;
    let tags: String = row.get("tags")?;
    let timestamp: String = row.get("timestamp")?;
    Ok(MemoryRecord {
        memory_id: row.get("memory_id")?,
        content: row.get("content")?,
        memory_type: MemoryType::parse_name(&memory_type),
        importance: row.get("importance")?,
        domain: row.get("domain")?,
        tags: parse_tags(&tags),
        source: row.get("source")?,
        timestamp: parse_timestamp(&timestamp)?,
        access_count: row.get("access_count")?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::record::MemoryInput;
    use tempfile::TempDir;

    fn store() -> (TempDir, EpisodicStore) {
        let dir = TempDir::new().unwrap();
        let store = EpisodicStore::new(&dir.path().join("episodic.db")).unwrap();
        (dir, store)
    }

    fn record(content: &str, importance: f64) -> MemoryRecord {
        MemoryInput::new(content, MemoryType::Episodic)
            .importance(importance)
            .into_record()
    }

    #[test]
    fn test_store_and_recall_recent() {
        let (_dir, store) = store();
        store.store(&record("first", 0.5)).unwrap();
        store.store(&record("second", 0.5)).unwrap();
        let recent = store.recall_recent(10).unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_search_content_case_insensitive() {
        let (_dir, store) = store();
        store.store(&record("Structural Sharing in tries", 0.5)).unwrap();
        let hits = store.search_content("structural sharing", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].content.contains("Structural"));
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let (_dir, store) = store();
        store.store(&record("literal percent % sign", 0.5)).unwrap();
        store.store(&record("other", 0.5)).unwrap();
        let hits = store.search_content("%", 5).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_recall_by_domain() {
        let (_dir, store) = store();
        let mut r = record("rust things", 0.5);
        r.domain = "programming".to_string();
        store.store(&r).unwrap();
        store.store(&record("other", 0.5)).unwrap();
        let hits = store.recall_by_domain("programming", 5).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_recall_important_filters() {
        let (_dir, store) = store();
        store.store(&record("low", 0.2)).unwrap();
        store.store(&record("high", 0.9)).unwrap();
        let hits = store.recall_important(10, 0.7).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "high");
    }

    #[test]
    fn test_touch_increments_access_count() {
        let (_dir, store) = store();
        let r = record("touched", 0.5);
        store.store(&r).unwrap();
        store.touch(&r.memory_id).unwrap();
        store.touch(&r.memory_id).unwrap();
        let got = store.get(&r.memory_id).unwrap().unwrap();
        assert_eq!(got.access_count, 2);
    }

    #[test]
    fn test_prune_keeps_most_important() {
        let (_dir, store) = store();
        for i in 0..10 {
            store.store(&record(&format!("r{i}"), i as f64 / 10.0)).unwrap();
        }
        let pruned = store.prune(4).unwrap();
        assert_eq!(pruned, 6);
        assert_eq!(store.count().unwrap(), 4);
        // Survivors are the highest-importance records
        let survivors = store.recall_important(10, 0.0).unwrap();
        assert!(survivors.iter().all(|r| r.importance >= 0.6));
    }

    #[test]
    fn test_prune_below_keep_is_noop() {
        let (_dir, store) = store();
        store.store(&record("only", 0.5)).unwrap();
        assert_eq!(store.prune(500).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_and_clear() {
        let (_dir, store) = store();
        let r = record("gone", 0.5);
        store.store(&r).unwrap();
        store.delete(&r.memory_id).unwrap();
        assert_eq!(store.count().unwrap(), 0);

        store.store(&record("a", 0.5)).unwrap();
        store.store(&record("b", 0.5)).unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_round_trips_tags_and_timestamp() {
        let (_dir, store) = store();
        let r = MemoryInput::new("tagged", MemoryType::Episodic)
            .tags(vec!["alpha".into(), "beta".into()])
            .into_record();
        store.store(&r).unwrap();
        let got = store.get(&r.memory_id).unwrap().unwrap();
        assert_eq!(got.tags, r.tags);
        assert_eq!(got.timestamp, r.timestamp);
    }
}
