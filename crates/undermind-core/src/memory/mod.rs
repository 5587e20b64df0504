//! Memory Module
//!
//! The four-layer memory system and its coordinator:
//! - [`WorkingMemory`]: bounded FIFO context window (7±2)
//! - [`EpisodicStore`]: timestamped event log (SQLite)
//! - [`SemanticStore`]: embedding-indexed content store
//! - [`ProceduralStore`]: reinforceable solution patterns (SQLite)
//!
//! The [`MemoryManager`] routes new records into the right layers, cascades
//! working-memory overflow into the episodic store, and fans recall out
//! across all layers in parallel.

mod episodic;
mod procedural;
mod record;
mod semantic;
mod working;

pub use episodic::EpisodicStore;
pub use procedural::ProceduralStore;
pub use record::{ContextItem, MemoryInput, MemoryRecord, MemoryType};
pub use semantic::{SemanticHit, SemanticStore};
pub use working::WorkingMemory;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::Settings;
use crate::embeddings::Embedder;
use crate::error::{Result, StorageResult, validate_unit};

/// Importance assigned to items consolidated out of working memory
const OVERFLOW_IMPORTANCE: f64 = 0.4;

/// Records at or above this importance are cross-referenced into both the
/// episodic and the semantic store
const CROSS_REFERENCE_IMPORTANCE: f64 = 0.6;

// ============================================================================
// RESULT SHAPES
// ============================================================================

/// Per-layer recall results
#[derive(Debug, Default, Clone, Serialize)]
pub struct RecallResults {
    pub working: Vec<ContextItem>,
    pub episodic: Vec<MemoryRecord>,
    pub semantic: Vec<SemanticHit>,
    pub procedural: Vec<MemoryRecord>,
}

impl RecallResults {
    /// Total number of records across all layers
    pub fn total(&self) -> usize {
        self.working.len() + self.episodic.len() + self.semantic.len() + self.procedural.len()
    }
}

/// A flattened recall result annotated with its source layer
#[derive(Debug, Clone, Serialize)]
pub struct RecalledMemory {
    /// Layer the record came from
    pub layer: MemoryType,
    pub memory_id: String,
    pub content: String,
    /// Present for layers that track importance
    pub importance: Option<f64>,
    /// Present for vector-search hits
    pub similarity: Option<f64>,
}

impl RecalledMemory {
    /// Ranking score: importance when known, else similarity
    pub fn score(&self) -> f64 {
        self.importance.or(self.similarity).unwrap_or(0.0)
    }
}

/// Counts across the memory layers
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub working_size: usize,
    pub working_capacity: usize,
    pub episodic_count: usize,
    pub semantic_count: usize,
    pub procedural_count: usize,
    pub total: usize,
}

// ============================================================================
// MEMORY MANAGER
// ============================================================================

/// Coordinator for the four memory layers
///
/// Memory flow:
/// 1. Input → working memory (bounded FIFO)
/// 2. Overflow → episodic store
/// 3. Important records → semantic store (cross-reference)
/// 4. Successful patterns → procedural store
pub struct MemoryManager {
    working: Mutex<WorkingMemory>,
    episodic: EpisodicStore,
    semantic: SemanticStore,
    procedural: ProceduralStore,
}

impl MemoryManager {
    /// Open all layers under the settings' data directory
    pub fn new(settings: &Settings, embedder: Arc<dyn Embedder>) -> StorageResult<Self> {
        std::fs::create_dir_all(&settings.data_dir)?;
        Ok(Self {
            working: Mutex::new(WorkingMemory::new(settings.working_memory_capacity)),
            episodic: EpisodicStore::new(&settings.episodic_path())?,
            semantic: SemanticStore::new(&settings.semantic_dir(), embedder)?,
            procedural: ProceduralStore::new(&settings.procedural_path())?,
        })
    }

    /// The episodic layer
    pub fn episodic(&self) -> &EpisodicStore {
        &self.episodic
    }

    /// The semantic layer
    pub fn semantic(&self) -> &SemanticStore {
        &self.semantic
    }

    /// The procedural layer
    pub fn procedural(&self) -> &ProceduralStore {
        &self.procedural
    }

    /// Run a closure against the working-memory layer
    pub fn with_working<T>(&self, f: impl FnOnce(&mut WorkingMemory) -> T) -> T {
        let mut working = self.working.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut working)
    }

    /// Store new content, routing it to the right layers
    ///
    /// Every record passes through working memory first; an evicted item is
    /// consolidated into the episodic store. The record itself is routed by
    /// its memory type, and records with importance ≥ 0.6 are guaranteed to
    /// end up in both the episodic and the semantic store.
    pub fn remember(&self, input: MemoryInput) -> Result<MemoryRecord> {
        validate_unit("importance", input.importance)?;
        let record = input.into_record();

        let role = match record.source.as_str() {
            "user" | "assistant" => record.source.clone(),
            _ => "system".to_string(),
        };
        let overflow = self.with_working(|working| {
            working.push(ContextItem {
                content: record.content.clone(),
                role,
                memory_id: record.memory_id.clone(),
            })
        });

        if let Some(evicted) = overflow {
            let consolidated = MemoryInput::new(evicted.content, MemoryType::Episodic)
                .importance(OVERFLOW_IMPORTANCE)
                .source("working_overflow")
                .into_record();
            self.episodic.store(&consolidated)?;
        }

        match record.memory_type {
            MemoryType::Episodic => self.episodic.store(&record)?,
            MemoryType::Semantic => self.semantic.store(&record)?,
            MemoryType::Procedural => self.procedural.store(&record, "solution")?,
            MemoryType::Working => {}
        }

        // Cross-reference invariant: important records live in both the
        // episodic and the semantic store, whatever layer they were routed to.
        if record.importance >= CROSS_REFERENCE_IMPORTANCE {
            if record.memory_type != MemoryType::Episodic {
                self.episodic.store(&record)?;
            }
            if record.memory_type != MemoryType::Semantic {
                self.semantic.store(&record)?;
            }
        }

        Ok(record)
    }

    /// Query every layer in parallel and return a per-layer result map
    ///
    /// Read failures in any single layer degrade that layer to empty rather
    /// than failing the whole recall.
    pub fn recall(&self, query: &str, n: usize, domain: Option<&str>) -> RecallResults {
        let mut results = RecallResults::default();

        std::thread::scope(|scope| {
            let episodic = scope.spawn(|| {
                let layer = match domain {
                    Some(d) => self.episodic.recall_by_domain(d, n),
                    None => self.episodic.search_content(query, n),
                };
                layer.unwrap_or_else(|e| {
                    tracing::warn!("Episodic recall degraded to empty: {}", e);
                    vec![]
                })
            });
            let semantic = scope.spawn(|| self.semantic.search(query, n, None, domain));
            let procedural = scope.spawn(|| {
                self.procedural.search_content(query, n).unwrap_or_else(|e| {
                    tracing::warn!("Procedural recall degraded to empty: {}", e);
                    vec![]
                })
            });

            let needle = query.to_lowercase();
            results.working = self.with_working(|working| {
                working
                    .get_context()
                    .into_iter()
                    .filter(|item| item.content.to_lowercase().contains(&needle))
                    .collect()
            });

            results.episodic = episodic.join().unwrap_or_default();
            results.semantic = semantic.join().unwrap_or_default();
            results.procedural = procedural.join().unwrap_or_default();
        });

        results
    }

    /// Flatten all layers into one list sorted by importance (similarity for
    /// vector hits) and annotated with the source layer
    pub fn recall_flat(&self, query: &str, n: usize) -> Vec<RecalledMemory> {
        let results = self.recall(query, n, None);
        let mut flat = Vec::with_capacity(results.total());

        for item in results.working {
            flat.push(RecalledMemory {
                layer: MemoryType::Working,
                memory_id: item.memory_id,
                content: item.content,
                importance: None,
                similarity: None,
            });
        }
        for record in results.episodic {
            flat.push(RecalledMemory {
                layer: MemoryType::Episodic,
                memory_id: record.memory_id,
                content: record.content,
                importance: Some(record.importance),
                similarity: None,
            });
        }
        for hit in results.semantic {
            flat.push(RecalledMemory {
                layer: MemoryType::Semantic,
                memory_id: hit.memory_id,
                content: hit.content,
                importance: None,
                similarity: Some(hit.similarity),
            });
        }
        for record in results.procedural {
            flat.push(RecalledMemory {
                layer: MemoryType::Procedural,
                memory_id: record.memory_id,
                content: record.content,
                importance: Some(record.importance),
                similarity: None,
            });
        }

        flat.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        flat.truncate(n);
        flat
    }

    /// Counts across all layers
    pub fn get_stats(&self) -> MemoryStats {
        let (working_size, working_capacity) =
            self.with_working(|working| (working.size(), working.capacity()));
        let episodic_count = self.episodic.count().unwrap_or(0);
        let semantic_count = self.semantic.count();
        let procedural_count = self.procedural.count().unwrap_or(0);
        MemoryStats {
            working_size,
            working_capacity,
            episodic_count,
            semantic_count,
            procedural_count,
            total: working_size + episodic_count + semantic_count + procedural_count,
        }
    }

    /// Clear every layer
    pub fn clear_all(&self) -> StorageResult<()> {
        self.with_working(WorkingMemory::clear);
        self.episodic.clear()?;
        self.semantic.clear()?;
        self.procedural.clear()?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
