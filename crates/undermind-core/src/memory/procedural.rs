//! Procedural Store
//!
//! "How to" memory: solution patterns that strengthen when they work and
//! weaken when they fail. SQLite-backed with the same reader/writer
//! connection discipline as the episodic store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, Row, params};

use super::episodic::{configure_connection, escape_like, parse_tags, parse_timestamp};
use super::record::{MemoryRecord, MemoryType};
use crate::error::{StorageError, StorageResult};

/// Importance boost applied on a successful reinforcement
const SUCCESS_BOOST: f64 = 0.05;
/// Importance penalty applied on a failed reinforcement
const FAILURE_PENALTY: f64 = 0.03;

/// SQLite-backed procedural memory with reinforcement
pub struct ProceduralStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl ProceduralStore {
    /// Open (or create) the procedural database at `db_path`
    pub fn new(db_path: &Path) -> StorageResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let writer = Connection::open(db_path)?;
        configure_connection(&writer)?;
        writer.execute_batch(
            "CREATE TABLE IF NOT EXISTS procedures (
                memory_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                pattern_type TEXT DEFAULT 'solution',
                domain TEXT DEFAULT '',
                tags TEXT DEFAULT '[]',
                success_count INTEGER DEFAULT 1,
                fail_count INTEGER DEFAULT 0,
                importance REAL DEFAULT 0.5,
                timestamp TEXT NOT NULL,
                last_used TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_proc_domain
                ON procedures(domain);",
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
            .map_err(|_| StorageError::Lock("procedural writer".to_string()))
    }

    fn read(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Lock("procedural reader".to_string()))
    }

    /// Store (upsert) a pattern
    pub fn store(&self, record: &MemoryRecord, pattern_type: &str) -> StorageResult<()> {
        let tags = serde_json::to_string(&record.tags).unwrap_or_else(|_| "[]".to_string());
        let timestamp = record.timestamp.to_rfc3339();
        self.write()?.execute(
            "INSERT OR REPLACE INTO procedures
             (memory_id, content, pattern_type, domain, tags, success_count,
              fail_count, importance, timestamp, last_used)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, 0, ?6, ?7, ?7)",
            params![
                record.memory_id,
                record.content,
                pattern_type,
                record.domain,
                tags,
                record.importance,
                timestamp,
            ],
        )?;
        Ok(())
    }

    /// Record a use of the pattern: success raises importance, failure lowers it
    pub fn reinforce(&self, memory_id: &str, success: bool) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        if success {
            self.write()?.execute(
                "UPDATE procedures SET success_count = success_count + 1,
                 importance = MIN(1.0, importance + ?1),
                 last_used = ?2
                 WHERE memory_id = ?3",
                params![SUCCESS_BOOST, now, memory_id],
            )?;
        } else {
            self.write()?.execute(
                "UPDATE procedures SET fail_count = fail_count + 1,
                 importance = MAX(0.0, importance - ?1),
                 last_used = ?2
                 WHERE memory_id = ?3",
                params![FAILURE_PENALTY, now, memory_id],
            )?;
        }
        Ok(())
    }

    /// Patterns for a domain ordered by success rate, then importance
    pub fn recall_by_domain(&self, domain: &str, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        self.query(
            "SELECT *, (CAST(success_count AS REAL) / MAX(success_count + fail_count, 1))
                 AS success_rate
             FROM procedures WHERE domain = ?1
             ORDER BY success_rate DESC, importance DESC LIMIT ?2",
            params![domain, limit as i64],
        )
    }

    /// The most successful patterns overall
    pub fn recall_best(&self, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        self.query(
            "SELECT * FROM procedures ORDER BY importance DESC, success_count DESC LIMIT ?1",
            params![limit as i64],
        )
    }

    /// Case-insensitive substring search over pattern content
    pub fn search_content(&self, query: &str, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        let pattern = format!("%{}%", escape_like(query));
        self.query(
            "SELECT * FROM procedures WHERE content LIKE ?1 ESCAPE '\\'
             ORDER BY importance DESC LIMIT ?2",
            params![pattern, limit as i64],
        )
    }

    /// Fetch a single pattern by id
    pub fn get(&self, memory_id: &str) -> StorageResult<Option<MemoryRecord>> {
        let records = self.query(
            "SELECT * FROM procedures WHERE memory_id = ?1",
            params![memory_id],
        )?;
        Ok(records.into_iter().next())
    }

    /// Total number of stored patterns
    pub fn count(&self) -> StorageResult<usize> {
        let count: i64 =
            self.read()?
                .query_row("SELECT COUNT(*) FROM procedures", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete every stored pattern
    pub fn clear(&self) -> StorageResult<()> {
        self.write()?.execute("DELETE FROM procedures", [])?;
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

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let tags: String = row.get("tags")?;
    let timestamp: String = row.get("timestamp")?;
    let success_count: i64 = row.get("success_count")?;
    let fail_count: i64 = row.get("fail_count")?;
    Ok(MemoryRecord {
        memory_id: row.get("memory_id")?,
        content: row.get("content")?,
        memory_type: MemoryType::Procedural,
        importance: row.get("importance")?,
        domain: row.get("domain")?,
        tags: parse_tags(&tags),
        source: format!("success:{success_count} fail:{fail_count}"),
        timestamp: parse_timestamp(&timestamp)?,
        access_count: success_count,
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

    fn store() -> (TempDir, ProceduralStore) {
        let dir = TempDir::new().unwrap();
        let store = ProceduralStore::new(&dir.path().join("procedural.db")).unwrap();
        (dir, store)
    }

    fn pattern(content: &str, domain: &str, importance: f64) -> MemoryRecord {
        MemoryInput::new(content, MemoryType::Procedural)
            .importance(importance)
            .domain(domain)
            .into_record()
    }

    #[test]
    fn test_store_and_count() {
        let (_dir, store) = store();
        store.store(&pattern("retry with backoff", "net", 0.5), "solution").unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_reinforce_success_raises_importance() {
        let (_dir, store) = store();
        let p = pattern("cache the result", "perf", 0.5);
        store.store(&p, "solution").unwrap();
        store.reinforce(&p.memory_id, true).unwrap();
        store.reinforce(&p.memory_id, true).unwrap();

        let got = store.get(&p.memory_id).unwrap().unwrap();
        assert!((got.importance - 0.6).abs() < 1e-9);
        assert_eq!(got.access_count, 3); // initial 1 + two successes
    }

    #[test]
    fn test_reinforce_failure_lowers_importance() {
        let (_dir, store) = store();
        let p = pattern("guess and check", "misc", 0.05);
        store.store(&p, "solution").unwrap();
        store.reinforce(&p.memory_id, false).unwrap();
        store.reinforce(&p.memory_id, false).unwrap();

        let got = store.get(&p.memory_id).unwrap().unwrap();
        // 0.05 - 0.03 - 0.03 floors at 0.0
        assert_eq!(got.importance, 0.0);
        assert!(got.source.contains("fail:2"));
    }

    #[test]
    fn test_importance_saturates_at_one() {
        let (_dir, store) = store();
        let p = pattern("proven approach", "misc", 0.98);
        store.store(&p, "solution").unwrap();
        store.reinforce(&p.memory_id, true).unwrap();
        let got = store.get(&p.memory_id).unwrap().unwrap();
        assert_eq!(got.importance, 1.0);
    }

    #[test]
    fn test_recall_by_domain_orders_by_success_rate() {
        let (_dir, store) = store();
        let winner = pattern("works", "db", 0.5);
        let loser = pattern("flaky", "db", 0.9);
        store.store(&winner, "solution").unwrap();
        store.store(&loser, "solution").unwrap();
        store.reinforce(&loser.memory_id, false).unwrap();
        store.reinforce(&loser.memory_id, false).unwrap();

        let hits = store.recall_by_domain("db", 5).unwrap();
        assert_eq!(hits[0].content, "works");
    }

    #[test]
    fn test_recall_best_orders_by_importance() {
        let (_dir, store) = store();
        store.store(&pattern("meh", "a", 0.3), "solution").unwrap();
        store.store(&pattern("great", "b", 0.9), "solution").unwrap();
        let best = store.recall_best(2).unwrap();
        assert_eq!(best[0].content, "great");
    }

    #[test]
    fn test_search_content() {
        let (_dir, store) = store();
        store.store(&pattern("use Binary Search here", "algo", 0.5), "solution").unwrap();
        let hits = store.search_content("binary search", 5).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_clear() {
        let (_dir, store) = store();
        store.store(&pattern("x", "a", 0.5), "solution").unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
