//! # Undermind Core
//!
//! Cognitive middleware for LLMs: a side-car subsystem that gives any chat
//! model persistent associative memory, spreading activation over a typed
//! concept graph, multi-layer recall, creative recombination, and a
//! background consolidation loop ("dreaming").
//!
//! - **Cognitive graph**: typed directed multigraph of concepts with
//!   spreading activation, random walks, distant-pair discovery, and JSON
//!   persistence
//! - **Four-layer memory**: working (7±2 FIFO), episodic (SQLite event
//!   log), semantic (embedding-indexed), procedural (reinforceable
//!   patterns), with overflow consolidation and cross-layer recall fan-out
//! - **Creative engine**: bisociation, conceptual blending, analogy, and
//!   lateral jumps over the graph
//! - **Dream processor**: periodic background consolidation, decay,
//!   pruning, and connection discovery, concurrent with foreground `think`
//!   calls
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use undermind_core::{Mind, OllamaProvider, Settings};
//! use std::sync::Arc;
//!
//! let settings = Settings::from_env();
//! let provider = Arc::new(OllamaProvider::from_settings(&settings));
//! let mind = Mind::builder(settings).provider(provider).build()?;
//!
//! mind.learn("The hash-array-mapped trie supports structural sharing",
//!            "programming", 0.8, None)?;
//! let thought = mind.think("how do persistent data structures stay fast?");
//! println!("{}", thought.response);
//! ```
//!
//! Without a provider the core still works: `think` degrades to a
//! deterministic summary, the creative engine emits placeholder sparks,
//! and the semantic store falls back to a local hashing embedder.

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod creative;
pub mod dream;
pub mod embeddings;
pub mod error;
pub mod graph;
pub mod lexicon;
pub mod memory;
pub mod mind;
pub mod provider;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Configuration
pub use config::{ENV_PREFIX, Settings};

// Errors
pub use error::{MindError, Result, StorageError, StorageResult};

// Cognitive graph
pub use graph::{
    Association, CognitiveGraph, ConceptNode, EdgeType, GraphDocument, GraphStats, Neighbor,
    NodeType,
};

// Memory layers
pub use memory::{
    ContextItem, EpisodicStore, MemoryInput, MemoryManager, MemoryRecord, MemoryStats,
    MemoryType, ProceduralStore, RecallResults, RecalledMemory, SemanticHit, SemanticStore,
    WorkingMemory,
};

// Embeddings
pub use embeddings::{
    EMBEDDING_DIMENSIONS, Embedder, HashEmbedder, ProviderEmbedder, cosine_similarity,
};

// LLM provider
pub use provider::{
    ChatMessage, ChatRole, ChunkStream, LlmProvider, OllamaProvider, ProviderError,
    ProviderResult,
};

// Creative engine
pub use creative::{CreativeEngine, CreativeSpark, CreativityStrategy};

// Dream processor
pub use dream::{DreamProcessor, DreamReport, DreamStats};

// Orchestrator
pub use mind::{Insight, Mind, MindBuilder, MindStats, ThinkResult};

// Lexicon
pub use lexicon::Lexicon;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        CognitiveGraph, CreativeEngine, CreativeSpark, CreativityStrategy, DreamProcessor,
        DreamReport, EdgeType, LlmProvider, MemoryInput, MemoryManager, MemoryRecord,
        MemoryType, Mind, MindError, NodeType, OllamaProvider, Result, Settings, ThinkResult,
    };
}
