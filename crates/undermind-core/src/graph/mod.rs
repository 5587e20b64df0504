//! Cognitive Graph
//!
//! Typed directed multigraph of concepts and associations — the centerpiece
//! of the core. Multiple edge types may coexist between the same ordered
//! pair, but at most one edge per (source, target, type) triple exists;
//! re-asserting a triple reinforces the existing edge.
//!
//! Capabilities:
//! - Spreading activation (bounded breadth-first propagation)
//! - Random walk with distant-edge preference (creative exploration)
//! - Distant-pair and cluster discovery
//! - JSON persistence (load ∘ save = identity)
//!
//! The graph is a plain mutable structure; callers share it behind a single
//! exclusive lock so no observer ever sees a partially constructed node or
//! edge.

mod types;

pub use types::{
    Association, ConceptNode, EdgeData, EdgeType, ExportEdge, ExportNode, GraphDocument,
    GraphStats, Neighbor, NodeType, normalize,
};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use chrono::Utc;
use rand::SeedableRng;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::config::Settings;
use crate::error::{Result, StorageError, StorageResult, validate_unit};

/// Weight added when an existing (source, target, type) triple is re-asserted
const REINFORCEMENT_STEP: f64 = 0.05;

/// Propagated activation below this is not spread further
const ACTIVATION_CUTOFF: f64 = 0.01;

/// Incoming edges contribute less activation than outgoing ones
const BACK_EDGE_ATTENUATION: f64 = 0.7;

/// Minimum shortest-path distance for a pair to count as "distant"
const DISTANT_PAIR_MIN_DISTANCE: usize = 3;

/// Version tag written into the persisted graph document
const DOCUMENT_VERSION: u32 = 1;

/// Typed multigraph of concepts with activation dynamics
pub struct CognitiveGraph {
    nodes: BTreeMap<String, ConceptNode>,
    /// source id → target id → parallel edges (one per type)
    out_edges: BTreeMap<String, BTreeMap<String, Vec<EdgeData>>>,
    /// target id → source ids with at least one edge into the target
    in_edges: BTreeMap<String, BTreeSet<String>>,
    persist_path: PathBuf,
    spread_factor: f64,
    activation_decay: f64,
    rng: Pcg64,
}

impl CognitiveGraph {
    /// Open the graph persisted at `persist_path`; a missing or malformed
    /// file yields an empty graph
    pub fn new(persist_path: PathBuf, settings: &Settings) -> Self {
        Self::build(persist_path, settings, Pcg64::from_entropy())
    }

    /// Open with a fixed RNG seed so walks and sampling are reproducible
    pub fn with_seed(persist_path: PathBuf, settings: &Settings, seed: u64) -> Self {
        Self::build(persist_path, settings, Pcg64::seed_from_u64(seed))
    }

    fn build(persist_path: PathBuf, settings: &Settings, rng: Pcg64) -> Self {
        let mut graph = Self {
            nodes: BTreeMap::new(),
            out_edges: BTreeMap::new(),
            in_edges: BTreeMap::new(),
            persist_path,
            spread_factor: settings.spread_factor,
            activation_decay: settings.activation_decay,
            rng,
        };
        graph.load();
        graph
    }

    // ========================================================================
    // NODE OPERATIONS
    // ========================================================================

    /// Add a concept or update an existing one
    ///
    /// Existing nodes get their frequency bumped, `last_activated` refreshed,
    /// importance raised when the new value is larger, and an empty domain
    /// filled in.
    pub fn add_concept(
        &mut self,
        name: &str,
        node_type: NodeType,
        domain: &str,
        importance: f64,
    ) -> ConceptNode {
        let id = normalize(name);
        let now = Utc::now();

        if let Some(node) = self.nodes.get_mut(&id) {
            node.frequency += 1;
            node.last_activated = now;
            if importance > node.importance {
                node.importance = importance;
            }
            if node.domain.is_empty() && !domain.is_empty() {
                node.domain = domain.to_string();
            }
            return node.clone();
        }

        let node = ConceptNode {
            name: name.trim().to_string(),
            node_type,
            activation: 0.0,
            importance,
            frequency: 1,
            domain: domain.to_string(),
            created_at: now,
            last_activated: now,
        };
        self.nodes.insert(id, node.clone());
        node
    }

    /// Snapshot of a concept, if present
    pub fn get_concept(&self, name: &str) -> Option<ConceptNode> {
        self.nodes.get(&normalize(name)).cloned()
    }

    /// Remove a concept and every incident edge
    pub fn remove_concept(&mut self, name: &str) {
        let id = normalize(name);
        if self.nodes.remove(&id).is_none() {
            return;
        }
        if let Some(targets) = self.out_edges.remove(&id) {
            for target in targets.keys() {
                if let Some(sources) = self.in_edges.get_mut(target) {
                    sources.remove(&id);
                }
            }
        }
        if let Some(sources) = self.in_edges.remove(&id) {
            for source in sources {
                if let Some(targets) = self.out_edges.get_mut(&source) {
                    targets.remove(&id);
                }
            }
        }
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every concept identifier, in sorted order
    pub fn concept_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Number of edges, counting parallel types separately
    pub fn edge_count(&self) -> usize {
        self.out_edges
            .values()
            .flat_map(|targets| targets.values())
            .map(Vec::len)
            .sum()
    }

    // ========================================================================
    // EDGE OPERATIONS
    // ========================================================================

    /// Connect two concepts, creating missing endpoints
    ///
    /// If an edge of the same type already exists between this ordered pair
    /// it is reinforced (+0.05 weight, saturating at 1.0) instead of
    /// duplicated. Weight or confidence outside [0, 1] is a validation
    /// error and mutates nothing.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        edge_type: EdgeType,
        weight: f64,
        confidence: f64,
    ) -> Result<Association> {
        validate_unit("weight", weight)?;
        validate_unit("confidence", confidence)?;

        let src = normalize(source);
        let tgt = normalize(target);
        if !self.nodes.contains_key(&src) {
            self.add_concept(source, NodeType::Concept, "", 0.5);
        }
        if !self.nodes.contains_key(&tgt) {
            self.add_concept(target, NodeType::Concept, "", 0.5);
        }

        let edges = self
            .out_edges
            .entry(src.clone())
            .or_default()
            .entry(tgt.clone())
            .or_default();

        let edge = match edges.iter_mut().find(|e| e.edge_type == edge_type) {
            Some(existing) => {
                existing.weight = (existing.weight + REINFORCEMENT_STEP).min(1.0);
                existing.reinforced_count += 1;
                existing.clone()
            }
            None => {
                let fresh = EdgeData {
                    edge_type,
                    weight,
                    confidence,
                    reinforced_count: 1,
                    created_at: Utc::now(),
                };
                edges.push(fresh.clone());
                self.in_edges.entry(tgt.clone()).or_default().insert(src.clone());
                fresh
            }
        };

        Ok(Association {
            source: src,
            target: tgt,
            edge_type: edge.edge_type,
            weight: edge.weight,
            confidence: edge.confidence,
            reinforced_count: edge.reinforced_count,
            created_at: edge.created_at,
        })
    }

    /// Connect every unordered pair of distinct concepts with a
    /// co-occurrence edge
    pub fn connect_cooccurrence(&mut self, concepts: &[String], weight: f64) -> Result<()> {
        for (i, a) in concepts.iter().enumerate() {
            for b in &concepts[i + 1..] {
                if normalize(a) != normalize(b) {
                    self.connect(a, b, EdgeType::Cooccurrence, weight, 1.0)?;
                }
            }
        }
        Ok(())
    }

    /// The current state of a specific (source, target, type) triple
    pub fn get_association(
        &self,
        source: &str,
        target: &str,
        edge_type: EdgeType,
    ) -> Option<Association> {
        let src = normalize(source);
        let tgt = normalize(target);
        let edge = self
            .out_edges
            .get(&src)?
            .get(&tgt)?
            .iter()
            .find(|e| e.edge_type == edge_type)?;
        Some(Association {
            source: src,
            target: tgt,
            edge_type: edge.edge_type,
            weight: edge.weight,
            confidence: edge.confidence,
            reinforced_count: edge.reinforced_count,
            created_at: edge.created_at,
        })
    }

    /// Outgoing and incoming neighbors satisfying the type and weight filters
    pub fn get_neighbors(
        &self,
        name: &str,
        edge_types: Option<&[EdgeType]>,
        min_weight: f64,
    ) -> Vec<Neighbor> {
        let id = normalize(name);
        if !self.nodes.contains_key(&id) {
            return vec![];
        }

        let keep = |edge: &EdgeData| {
            edge_types.is_none_or(|types| types.contains(&edge.edge_type))
                && edge.weight >= min_weight
        };

        let mut neighbors = Vec::new();
        if let Some(targets) = self.out_edges.get(&id) {
            for (target, edges) in targets {
                for edge in edges.iter().filter(|e| keep(e)) {
                    if let Some(node) = self.nodes.get(target) {
                        neighbors.push(Neighbor {
                            target: target.clone(),
                            edge_type: edge.edge_type,
                            weight: edge.weight,
                            node: node.clone(),
                        });
                    }
                }
            }
        }
        if let Some(sources) = self.in_edges.get(&id) {
            for source in sources {
                let Some(edges) = self.out_edges.get(source).and_then(|t| t.get(&id)) else {
                    continue;
                };
                for edge in edges.iter().filter(|e| keep(e)) {
                    if let Some(node) = self.nodes.get(source) {
                        neighbors.push(Neighbor {
                            target: source.clone(),
                            edge_type: edge.edge_type,
                            weight: edge.weight,
                            node: node.clone(),
                        });
                    }
                }
            }
        }
        neighbors
    }

    // ========================================================================
    // SPREADING ACTIVATION
    // ========================================================================

    /// Spread activation outward from a seed concept
    ///
    /// Bounded breadth-first propagation: each node is visited at most once
    /// per call, its activation raised by the incoming strength (clamped at
    /// 1.0) and its `last_activated` refreshed. Outgoing neighbors receive
    /// `strength × spread_factor × weight`; incoming neighbors the same with
    /// an extra 0.7 attenuation. Propagation stops below a cutoff of 0.01.
    ///
    /// Returns the id → post-update activation map; an unknown seed returns
    /// an empty map. Activation mutation is part of the contract — decay and
    /// `get_most_active` depend on it.
    pub fn activate(&mut self, name: &str, strength: f64, depth: u32) -> HashMap<String, f64> {
        let seed = normalize(name);
        if !self.nodes.contains_key(&seed) {
            return HashMap::new();
        }

        let mut activated = HashMap::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, f64, u32)> = VecDeque::new();
        queue.push_back((seed, strength, 0));

        while let Some((current, current_strength, current_depth)) = queue.pop_front() {
            if visited.contains(&current) || current_depth > depth {
                continue;
            }
            visited.insert(current.clone());

            if let Some(node) = self.nodes.get_mut(&current) {
                node.activation = (node.activation + current_strength).min(1.0);
                node.last_activated = Utc::now();
                activated.insert(current.clone(), node.activation);
            }

            if current_depth >= depth {
                continue;
            }
            if let Some(targets) = self.out_edges.get(&current) {
                for (target, edges) in targets {
                    if visited.contains(target) {
                        continue;
                    }
                    for edge in edges {
                        let propagated = current_strength * self.spread_factor * edge.weight;
                        if propagated > ACTIVATION_CUTOFF {
                            queue.push_back((target.clone(), propagated, current_depth + 1));
                        }
                    }
                }
            }
            if let Some(sources) = self.in_edges.get(&current) {
                for source in sources {
                    if visited.contains(source) {
                        continue;
                    }
                    let Some(edges) = self.out_edges.get(source).and_then(|t| t.get(&current))
                    else {
                        continue;
                    };
                    for edge in edges {
                        let propagated = current_strength
                            * self.spread_factor
                            * edge.weight
                            * BACK_EDGE_ATTENUATION;
                        if propagated > ACTIVATION_CUTOFF {
                            queue.push_back((source.clone(), propagated, current_depth + 1));
                        }
                    }
                }
            }
        }

        activated
    }

    /// Subtract `rate` (default: the configured decay) from every node's
    /// activation, clamping at 0
    pub fn decay_all(&mut self, rate: Option<f64>) {
        let rate = rate.unwrap_or(self.activation_decay);
        for node in self.nodes.values_mut() {
            node.activation = (node.activation - rate).max(0.0);
        }
    }

    // ========================================================================
    // RANDOM WALK
    // ========================================================================

    /// Random walk across the symmetric neighborhood
    ///
    /// Dead ends and all-zero weights teleport to a uniformly random node.
    /// With `prefer_distant` the next hop is chosen with probability
    /// proportional to `1 / max(weight, 0.01)`, biasing toward weak edges;
    /// otherwise proportional to weight. Returns the visited path of
    /// `steps + 1` entries, or an empty path on an empty graph.
    pub fn random_walk(
        &mut self,
        start: Option<&str>,
        steps: usize,
        prefer_distant: bool,
    ) -> Vec<String> {
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        if ids.is_empty() {
            return vec![];
        }

        let mut current = match start.map(normalize) {
            Some(id) if self.nodes.contains_key(&id) => id,
            _ => ids.choose(&mut self.rng).cloned().expect("ids non-empty"),
        };

        let mut path = Vec::with_capacity(steps + 1);
        path.push(current.clone());

        for _ in 0..steps {
            let candidates = self.symmetric_edges(&current);
            if candidates.is_empty() {
                current = ids.choose(&mut self.rng).cloned().expect("ids non-empty");
                path.push(current.clone());
                continue;
            }

            let weights: Vec<f64> = if prefer_distant {
                candidates.iter().map(|(_, w)| 1.0 / w.max(0.01)).collect()
            } else {
                candidates.iter().map(|(_, w)| *w).collect()
            };

            let total: f64 = weights.iter().sum();
            if total == 0.0 {
                current = ids.choose(&mut self.rng).cloned().expect("ids non-empty");
            } else {
                let picker = WeightedIndex::new(&weights).expect("positive total weight");
                let index = picker.sample(&mut self.rng);
                current = candidates[index].0.clone();
            }
            path.push(current.clone());
        }

        path
    }

    /// All (neighbor, weight) pairs over outgoing and incoming edges
    fn symmetric_edges(&self, id: &str) -> Vec<(String, f64)> {
        let mut candidates = Vec::new();
        if let Some(targets) = self.out_edges.get(id) {
            for (target, edges) in targets {
                for edge in edges {
                    candidates.push((target.clone(), edge.weight));
                }
            }
        }
        if let Some(sources) = self.in_edges.get(id) {
            for source in sources {
                if let Some(edges) = self.out_edges.get(source).and_then(|t| t.get(id)) {
                    for edge in edges {
                        candidates.push((source.clone(), edge.weight));
                    }
                }
            }
        }
        candidates
    }

    // ========================================================================
    // DISCOVERY
    // ========================================================================

    /// Up to `limit` unordered pairs ranked by decreasing shortest-path
    /// distance on the undirected projection
    ///
    /// Only pairs at distance ≥ 3 qualify; unreachable pairs rank first with
    /// infinite distance. The creative engine feeds these to bisociation.
    pub fn find_distant_pairs(&self, limit: usize) -> Vec<(String, String, f64)> {
        if self.nodes.len() < 2 {
            return vec![];
        }
        let adjacency = self.undirected_adjacency();
        let ids: Vec<&String> = self.nodes.keys().collect();

        let mut pairs = Vec::new();
        for i in 0..ids.len() {
            let a = ids[i];
            let distances = bfs_distances(a, &adjacency);
            for &b in &ids[i + 1..] {
                match distances.get(b) {
                    Some(&d) if d >= DISTANT_PAIR_MIN_DISTANCE => {
                        pairs.push((a.clone(), b.clone(), d as f64));
                    }
                    Some(_) => {}
                    None => pairs.push((a.clone(), b.clone(), f64::INFINITY)),
                }
            }
        }

        pairs.sort_by(|x, y| {
            y.2.partial_cmp(&x.2).unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs.truncate(limit);
        pairs
    }

    /// Connected components of the undirected projection
    ///
    /// Serves as the cluster structure; isolated nodes form singleton
    /// clusters.
    pub fn find_clusters(&self) -> Vec<BTreeSet<String>> {
        let adjacency = self.undirected_adjacency();
        let mut clusters = Vec::new();
        let mut seen: HashSet<&String> = HashSet::new();

        for id in self.nodes.keys() {
            if seen.contains(id) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([id]);
            while let Some(current) = queue.pop_front() {
                if !seen.insert(current) {
                    continue;
                }
                component.insert(current.clone());
                if let Some(neighbors) = adjacency.get(current) {
                    for &neighbor in neighbors {
                        if !seen.contains(neighbor) {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
            clusters.push(component);
        }
        clusters
    }

    /// The `n` nodes with the highest activation
    pub fn get_most_active(&self, n: usize) -> Vec<ConceptNode> {
        let mut nodes: Vec<ConceptNode> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| {
            b.activation
                .partial_cmp(&a.activation)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        nodes.truncate(n);
        nodes
    }

    /// The `n` nodes with the highest degree (in + out, counting parallel
    /// edges)
    pub fn get_most_connected(&self, n: usize) -> Vec<(String, usize)> {
        let mut degrees: Vec<(String, usize)> = self
            .nodes
            .keys()
            .map(|id| (id.clone(), self.degree(id)))
            .collect();
        degrees.sort_by(|a, b| b.1.cmp(&a.1));
        degrees.truncate(n);
        degrees
    }

    fn degree(&self, id: &str) -> usize {
        let out: usize = self
            .out_edges
            .get(id)
            .map(|targets| targets.values().map(Vec::len).sum())
            .unwrap_or(0);
        let incoming: usize = self
            .in_edges
            .get(id)
            .map(|sources| {
                sources
                    .iter()
                    .filter_map(|src| self.out_edges.get(src).and_then(|t| t.get(id)))
                    .map(Vec::len)
                    .sum()
            })
            .unwrap_or(0);
        out + incoming
    }

    fn undirected_adjacency(&self) -> HashMap<&String, HashSet<&String>> {
        let mut adjacency: HashMap<&String, HashSet<&String>> = HashMap::new();
        for (source, targets) in &self.out_edges {
            for target in targets.keys() {
                adjacency.entry(source).or_default().insert(target);
                adjacency.entry(target).or_default().insert(source);
            }
        }
        adjacency
    }

    // ========================================================================
    // STATS & EXPORT
    // ========================================================================

    /// Aggregate statistics
    pub fn stats(&self) -> GraphStats {
        let nodes = self.node_count();
        let edges = self.edge_count();
        let density = if nodes > 1 {
            edges as f64 / (nodes as f64 * (nodes as f64 - 1.0))
        } else {
            0.0
        };
        GraphStats {
            nodes,
            edges,
            density,
            clusters: self.find_clusters().len(),
        }
    }

    /// Owned adjacency dump for external renderers
    pub fn export_graph(&self) -> GraphDocument {
        let nodes = self
            .nodes
            .iter()
            .map(|(id, node)| ExportNode { id: id.clone(), node: node.clone() })
            .collect();
        let edges = self
            .out_edges
            .iter()
            .flat_map(|(source, targets)| {
                targets.iter().flat_map(move |(target, edges)| {
                    edges.iter().map(move |edge| ExportEdge {
                        source: source.clone(),
                        target: target.clone(),
                        data: edge.clone(),
                    })
                })
            })
            .collect();
        GraphDocument { version: DOCUMENT_VERSION, nodes, edges }
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Write the full graph to the configured path
    pub fn save(&self) -> StorageResult<()> {
        if let Some(parent) = self.persist_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.export_graph())
            .map_err(|e| StorageError::Parse(e.to_string()))?;
        std::fs::write(&self.persist_path, json)?;
        Ok(())
    }

    /// Reconstruct from the persisted document; degrades to empty on any
    /// failure
    fn load(&mut self) {
        if !self.persist_path.exists() {
            return;
        }
        let raw = match std::fs::read_to_string(&self.persist_path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to read graph file, starting empty: {}", e);
                return;
            }
        };
        let document: GraphDocument = match serde_json::from_str(&raw) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Malformed graph file, starting empty: {}", e);
                return;
            }
        };

        for export in document.nodes {
            self.nodes.insert(export.id, export.node);
        }
        for edge in document.edges {
            if !self.nodes.contains_key(&edge.source) || !self.nodes.contains_key(&edge.target)
            {
                tracing::warn!(
                    "Dropping persisted edge with missing endpoint: {} -> {}",
                    edge.source,
                    edge.target
                );
                continue;
            }
            self.out_edges
                .entry(edge.source.clone())
                .or_default()
                .entry(edge.target.clone())
                .or_default()
                .push(edge.data);
            self.in_edges.entry(edge.target).or_default().insert(edge.source);
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Breadth-first distances from `start` over an undirected adjacency map
fn bfs_distances<'a>(
    start: &'a String,
    adjacency: &HashMap<&'a String, HashSet<&'a String>>,
) -> HashMap<&'a String, usize> {
    let mut distances: HashMap<&'a String, usize> = HashMap::new();
    distances.insert(start, 0);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        let next_distance = distances[current] + 1;
        if let Some(neighbors) = adjacency.get(current) {
            for &neighbor in neighbors {
                if !distances.contains_key(neighbor) {
                    distances.insert(neighbor, next_distance);
                    queue.push_back(neighbor);
                }
            }
        }
    }
    distances
}

// ============================================================================
// TESTS
// ============================================================================
