//! Cognitive graph types
//!
//! Node and edge shapes shared by the graph, its persistence document, and
//! the adjacency export consumed by external renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// NODE TYPES
// ============================================================================

/// Kinds of graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Abstract concept: "democracy", "recursion"
    #[default]
    Concept,
    /// Concrete entity: "Rust", "Einstein"
    Entity,
    /// Event or experience
    Event,
    /// Recurring pattern
    Pattern,
    /// Generated idea
    Hypothesis,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Concept => "concept",
            NodeType::Entity => "entity",
            NodeType::Event => "event",
            NodeType::Pattern => "pattern",
            NodeType::Hypothesis => "hypothesis",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// EDGE TYPES
// ============================================================================

/// Kinds of associations between concepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Semantic similarity
    #[default]
    Semantic,
    /// Cause and effect
    Causal,
    /// Temporal proximity
    Temporal,
    /// Structural similarity (A:B :: C:D)
    Analogical,
    /// Metaphorical mapping
    Metaphorical,
    /// Contradiction or opposition
    Contradicts,
    /// X makes Y possible
    Enables,
    /// Part-whole relation
    PartOf,
    /// Mentioned together
    Cooccurrence,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Semantic => "semantic",
            EdgeType::Causal => "causal",
            EdgeType::Temporal => "temporal",
            EdgeType::Analogical => "analogical",
            EdgeType::Metaphorical => "metaphorical",
            EdgeType::Contradicts => "contradicts",
            EdgeType::Enables => "enables",
            EdgeType::PartOf => "part_of",
            EdgeType::Cooccurrence => "cooccurrence",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// NODES
// ============================================================================

/// A concept node in the cognitive graph
///
/// Identity is the case-normalized name; two concepts are the same iff
/// their normalized names match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
    /// Display name as first mentioned
    pub name: String,
    pub node_type: NodeType,
    /// Current activation in [0, 1]
    pub activation: f64,
    /// Base importance in [0, 1]
    pub importance: f64,
    /// How often the concept has been mentioned
    pub frequency: u32,
    /// Knowledge domain ("programming", "science", ...)
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub last_activated: DateTime<Utc>,
}

impl ConceptNode {
    /// The normalized identifier used for all lookups
    pub fn id(&self) -> String {
        normalize(&self.name)
    }
}

/// Case-normalize a concept name into its identifier
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

// ============================================================================
// EDGES
// ============================================================================

/// Attributes of a single typed edge; the endpoints live in the adjacency
/// structure around it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub edge_type: EdgeType,
    /// Strength in [0, 1]; saturates under reinforcement
    pub weight: f64,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// How often this triple has been asserted
    pub reinforced_count: u32,
    pub created_at: DateTime<Utc>,
}

/// A fully qualified association between two concepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    pub weight: f64,
    pub confidence: f64,
    pub reinforced_count: u32,
    pub created_at: DateTime<Utc>,
}

/// A neighbor entry returned by `get_neighbors`
#[derive(Debug, Clone, Serialize)]
pub struct Neighbor {
    /// Identifier of the adjacent concept
    pub target: String,
    pub edge_type: EdgeType,
    pub weight: f64,
    /// Snapshot of the adjacent node
    pub node: ConceptNode,
}

// ============================================================================
// EXPORT & PERSISTENCE DOCUMENT
// ============================================================================

/// A node with its identifier, as exported or persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: String,
    #[serde(flatten)]
    pub node: ConceptNode,
}

/// An edge with its endpoints, as exported or persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub data: EdgeData,
}

/// Self-describing graph document: the persisted form and the adjacency
/// dump for external renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub version: u32,
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

/// Aggregate graph statistics
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Edge density of the directed multigraph
    pub density: f64,
    pub clusters: usize,
}
