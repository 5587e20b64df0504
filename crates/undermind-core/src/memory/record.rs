//! Memory records
//!
//! The shared record shape used by every memory layer, plus the input
//! struct callers hand to [`crate::memory::MemoryManager::remember`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// MEMORY TYPES
// ============================================================================

/// Memory layer tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// Active context window
    Working,
    /// Timestamped events and conversations
    #[default]
    Episodic,
    /// Facts and concepts, vector-indexed
    Semantic,
    /// Reinforceable solution patterns
    Procedural,
}

impl MemoryType {
    /// String form used in storage and layer maps
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Working => "working",
            MemoryType::Episodic => "episodic",
            MemoryType::Semantic => "semantic",
            MemoryType::Procedural => "procedural",
        }
    }

    /// Parse from a string name, defaulting to episodic
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "working" => MemoryType::Working,
            "semantic" => MemoryType::Semantic,
            "procedural" => MemoryType::Procedural,
            _ => MemoryType::Episodic,
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// MEMORY RECORD
// ============================================================================

/// A single memory record, shared across all layers
///
/// Immutable once stored except for `access_count` (and, in the procedural
/// store, success/fail counters and importance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique identifier (UUID v4)
    pub memory_id: String,
    /// The remembered content
    pub content: String,
    /// Layer this record belongs to
    pub memory_type: MemoryType,
    /// Importance in [0, 1]
    pub importance: f64,
    /// Knowledge domain ("programming", "science", ...)
    pub domain: String,
    /// Tags for categorization
    pub tags: Vec<String>,
    /// Where the record came from ("user", "assistant", "learn", ...)
    pub source: String,
    /// When the record was created
    pub timestamp: DateTime<Utc>,
    /// How often the record has been touched
    pub access_count: i64,
}

impl MemoryRecord {
    /// Create a fresh record with a new id and the current timestamp
    pub fn new(content: impl Into<String>, memory_type: MemoryType) -> Self {
        Self {
            memory_id: Uuid::new_v4().to_string(),
            content: content.into(),
            memory_type,
            importance: 0.5,
            domain: String::new(),
            tags: Vec::new(),
            source: String::new(),
            timestamp: Utc::now(),
            access_count: 0,
        }
    }
}

// ============================================================================
// MEMORY INPUT
// ============================================================================

/// Input to `MemoryManager::remember`
#[derive(Debug, Clone, Default)]
pub struct MemoryInput {
    pub content: String,
    pub memory_type: MemoryType,
    pub importance: f64,
    pub domain: String,
    pub tags: Vec<String>,
    pub source: String,
}

impl MemoryInput {
    /// Input with the given content and layer, importance 0.5
    pub fn new(content: impl Into<String>, memory_type: MemoryType) -> Self {
        Self {
            content: content.into(),
            memory_type,
            importance: 0.5,
            ..Self::default()
        }
    }

    pub fn importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Materialize into a record with a fresh id and timestamp
    pub fn into_record(self) -> MemoryRecord {
        MemoryRecord {
            memory_id: Uuid::new_v4().to_string(),
            content: self.content,
            memory_type: self.memory_type,
            importance: self.importance,
            domain: self.domain,
            tags: self.tags,
            source: self.source,
            timestamp: Utc::now(),
            access_count: 0,
        }
    }
}

// ============================================================================
// CONTEXT ITEMS
// ============================================================================

/// An opaque working-memory item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    pub content: String,
    pub role: String,
    pub memory_id: String,
}
