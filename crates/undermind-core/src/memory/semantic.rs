//! Semantic Store
//!
//! Vector-indexed content store. Each record is held with its metadata and
//! an embedding of its content; search ranks by cosine similarity
//! (= 1 − cosine distance). The store does not depend on a specific
//! embedding model (see [`crate::embeddings::Embedder`]) and degrades to
//! empty results whenever embeddings are unavailable.
//!
//! Persisted as a self-describing JSON document inside the configured
//! directory; a missing or malformed document yields an empty store.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::record::{MemoryRecord, MemoryType};
use crate::embeddings::{Embedder, cosine_similarity};
use crate::error::{StorageError, StorageResult};

/// File name of the persisted record document inside the semantic directory
const RECORDS_FILE: &str = "records.json";

/// Capacity of the query-embedding cache
const QUERY_CACHE_SIZE: usize = 100;

/// A stored record plus its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    record: MemoryRecord,
    embedding: Vec<f32>,
}

/// A semantic search hit
#[derive(Debug, Clone, Serialize)]
pub struct SemanticHit {
    pub memory_id: String,
    pub content: String,
    /// Cosine similarity to the query in [-1, 1]
    pub similarity: f64,
    pub importance: f64,
    pub domain: String,
    pub memory_type: MemoryType,
    pub tags: Vec<String>,
    pub source: String,
}

/// Vector-indexed semantic memory
pub struct SemanticStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
    embedder: Arc<dyn Embedder>,
    persist_path: PathBuf,
    /// LRU cache so repeated queries are not re-embedded
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl SemanticStore {
    /// Open the store rooted at `dir`, loading any persisted records
    pub fn new(dir: &Path, embedder: Arc<dyn Embedder>) -> StorageResult<Self> {
        std::fs::create_dir_all(dir)?;
        let persist_path = dir.join(RECORDS_FILE);
        let entries = load_entries(&persist_path);

        // SAFETY: QUERY_CACHE_SIZE is a non-zero constant
        let query_cache = LruCache::new(NonZeroUsize::new(QUERY_CACHE_SIZE).expect("non-zero"));

        Ok(Self {
            entries: Mutex::new(entries),
            embedder,
            persist_path,
            query_cache: Mutex::new(query_cache),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, HashMap<String, StoredEntry>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Lock("semantic entries".to_string()))
    }

    /// Upsert a record, computing an embedding for its content
    pub fn store(&self, record: &MemoryRecord) -> StorageResult<()> {
        let embedding = self.embedder.embed(&record.content);
        let mut entries = self.lock()?;
        entries.insert(
            record.memory_id.clone(),
            StoredEntry { record: record.clone(), embedding },
        );
        self.persist(&entries)
    }

    /// Top-`n` records by cosine similarity, optionally filtered by domain
    /// and a similarity floor. Degrades to empty when the query cannot be
    /// embedded.
    pub fn search(
        &self,
        query: &str,
        n: usize,
        min_similarity: Option<f64>,
        domain: Option<&str>,
    ) -> Vec<SemanticHit> {
        let query_embedding = self.embed_query(query);
        if query_embedding.is_empty() {
            return vec![];
        }

        let entries = match self.lock() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Semantic search degraded to empty: {}", e);
                return vec![];
            }
        };

        let mut hits: Vec<SemanticHit> = entries
            .values()
            .filter(|entry| !entry.embedding.is_empty())
            .filter(|entry| domain.is_none_or(|d| entry.record.domain == d))
            .map(|entry| {
                let similarity =
                    cosine_similarity(&query_embedding, &entry.embedding) as f64;
                hit_from(entry, similarity)
            })
            .filter(|hit| min_similarity.is_none_or(|min| hit.similarity >= min))
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.memory_id.cmp(&b.memory_id))
        });
        hits.truncate(n);
        hits
    }

    /// Fetch a record by id
    pub fn get(&self, memory_id: &str) -> Option<MemoryRecord> {
        self.lock()
            .ok()
            .and_then(|entries| entries.get(memory_id).map(|e| e.record.clone()))
    }

    /// Delete a record by id
    pub fn delete(&self, memory_id: &str) -> StorageResult<()> {
        let mut entries = self.lock()?;
        entries.remove(memory_id);
        self.persist(&entries)
    }

    /// Number of stored records
    pub fn count(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Remove every stored record
    pub fn clear(&self) -> StorageResult<()> {
        let mut entries = self.lock()?;
        entries.clear();
        self.persist(&entries)
    }

    fn embed_query(&self, query: &str) -> Vec<f32> {
        if let Ok(mut cache) = self.query_cache.lock() {
            if let Some(cached) = cache.get(query) {
                return cached.clone();
            }
            let embedding = self.embedder.embed(query);
            cache.put(query.to_string(), embedding.clone());
            return embedding;
        }
        self.embedder.embed(query)
    }

    fn persist(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()> {
        let document = PersistedDocument {
            version: 1,
            entries: entries.values().cloned().collect(),
        };
        let json = serde_json::to_string(&document)
            .map_err(|e| StorageError::Parse(e.to_string()))?;
        std::fs::write(&self.persist_path, json)?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedDocument {
    version: u32,
    entries: Vec<StoredEntry>,
}

/// Load persisted entries; missing or malformed documents yield an empty map
fn load_entries(path: &Path) -> HashMap<String, StoredEntry> {
    if !path.exists() {
        return HashMap::new();
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Failed to read semantic store, starting empty: {}", e);
            return HashMap::new();
        }
    };
    match serde_json::from_str::<PersistedDocument>(&raw) {
        Ok(document) => document
            .entries
            .into_iter()
            .map(|entry| (entry.record.memory_id.clone(), entry))
            .collect(),
        Err(e) => {
            tracing::warn!("Malformed semantic store, starting empty: {}", e);
            HashMap::new()
        }
    }
}

fn hit_from(entry: &StoredEntry, similarity: f64) -> SemanticHit {
    SemanticHit {
        memory_id: entry.record.memory_id.clone(),
        content: entry.record.content.clone(),
        similarity,
        importance: entry.record.importance,
        domain: entry.record.domain.clone(),
        memory_type: entry.record.memory_type,
        tags: entry.record.tags.clone(),
        source: entry.record.source.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
