//! Mind Orchestrator
//!
//! The public face of the cognitive core. Wires the memory manager, the
//! cognitive graph, the creative engine, and the dream processor together
//! behind five operations: `think`, `learn`, `recall`, `imagine`, `dream`.
//!
//! `think` never fails for provider or storage reasons; it degrades to a
//! deterministic summary built from recall and activation and logs the
//! cause. Only validation errors propagate to callers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::creative::{CreativeEngine, CreativeSpark};
use crate::dream::{DreamProcessor, DreamReport, DreamStats};
use crate::embeddings::{Embedder, HashEmbedder, ProviderEmbedder};
use crate::error::{Result, validate_unit};
use crate::graph::{Association, CognitiveGraph, EdgeType, GraphStats, NodeType};
use crate::lexicon::Lexicon;
use crate::memory::{MemoryInput, MemoryManager, MemoryRecord, MemoryType, RecallResults, RecalledMemory};
use crate::provider::{ChatMessage, LlmProvider};

/// Activation strength used when seeding spread from extracted concepts
const THINK_ACTIVATION_STRENGTH: f64 = 0.8;

/// Spread depth used by `think`
const THINK_ACTIVATION_DEPTH: u32 = 2;

/// Memories recalled per `think` call
const THINK_RECALL_COUNT: usize = 5;

/// Conversation turns replayed into each chat call
const CONVERSATION_WINDOW: usize = 6;

/// Characters of the response stored back into episodic memory
const RESPONSE_STORE_CHARS: usize = 500;

/// Characters per memory line in the assembled context
const CONTEXT_MEMORY_CHARS: usize = 150;

/// System prompt sent with every LLM-backed `think`
const SYSTEM_PROMPT: &str = "You are a background reasoning layer with deep \
associative memory. Give short, precise, substantive answers; avoid generic \
filler. Draw connections across disciplines (biology\u{2194}computing, \
psychology\u{2194}mathematics, and so on). In every answer: 1) state the core \
of the matter briefly, 2) draw one unexpected connection from another field, \
3) give one concrete example. Every sentence must carry information.";

// ============================================================================
// RESULT TYPES
// ============================================================================

/// A connection surfaced during thinking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// The sentence carrying the insight
    pub content: String,
    pub confidence: f64,
    /// Concepts that seeded the thought
    pub source_concepts: Vec<String>,
    /// "association", "pattern", or "intuition"
    pub insight_type: String,
}

/// Output of [`Mind::think`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThinkResult {
    /// The response text (LLM-generated or degraded summary)
    pub response: String,
    /// Associations surfaced between extracted and activated concepts
    pub associations: Vec<Association>,
    /// Insights extracted from the response
    pub insights: Vec<Insight>,
    /// Creative sparks produced for this turn
    pub creative_sparks: Vec<CreativeSpark>,
    /// Concept id → activation level after spreading
    pub activated_concepts: HashMap<String, f64>,
    /// Memories that informed the turn
    pub recalled_memories: Vec<MemoryRecord>,
}

/// Aggregated system statistics
#[derive(Debug, Clone, Serialize)]
pub struct MindStats {
    pub memory: crate::memory::MemoryStats,
    pub graph: GraphStats,
    pub dream: DreamStats,
    /// Provider model name, or "none"
    pub model: String,
    pub conversation_length: usize,
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builder for [`Mind`]
pub struct MindBuilder {
    settings: Settings,
    provider: Option<Arc<dyn LlmProvider>>,
    lexicon: Option<Lexicon>,
    seed: Option<u64>,
}

impl MindBuilder {
    /// Attach an LLM provider
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the default English lexicon
    pub fn lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    /// Seed every random source for reproducible walks and sampling
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Construct the orchestrator, opening every persistent store
    pub fn build(self) -> Result<Mind> {
        let settings = self.settings;

        let graph = match self.seed {
            Some(seed) => CognitiveGraph::with_seed(settings.graph_path(), &settings, seed),
            None => CognitiveGraph::new(settings.graph_path(), &settings),
        };
        let graph = Arc::new(Mutex::new(graph));

        let embedder: Arc<dyn Embedder> = match &self.provider {
            Some(provider) => Arc::new(ProviderEmbedder::new(Arc::clone(provider))),
            None => Arc::new(HashEmbedder::default()),
        };
        let memory = Arc::new(MemoryManager::new(&settings, embedder)?);

        let creative = Arc::new(match self.seed {
            Some(seed) => CreativeEngine::with_seed(
                Arc::clone(&graph),
                self.provider.clone(),
                settings.min_novelty_score,
                seed.wrapping_add(1),
            ),
            None => CreativeEngine::new(
                Arc::clone(&graph),
                self.provider.clone(),
                settings.min_novelty_score,
            ),
        });

        let dreamer = Arc::new(DreamProcessor::new(
            Arc::clone(&memory),
            Arc::clone(&graph),
            Some(Arc::clone(&creative)),
            settings.episodic_capacity,
            settings.dream_interval_secs,
        ));

        Ok(Mind {
            settings,
            provider: self.provider,
            memory,
            graph,
            creative,
            dreamer,
            lexicon: self.lexicon.unwrap_or_default(),
            conversation: Mutex::new(Vec::new()),
        })
    }
}

// ============================================================================
// MIND
// ============================================================================

/// Cognitive middleware orchestrator
///
/// ```rust,ignore
/// use undermind_core::{Mind, Settings};
///
/// let mind = Mind::new(Settings::from_env())?;
/// let result = mind.think("how do we fix the timeout?");
/// println!("{}", result.response);
/// ```
pub struct Mind {
    settings: Settings,
    provider: Option<Arc<dyn LlmProvider>>,
    memory: Arc<MemoryManager>,
    graph: Arc<Mutex<CognitiveGraph>>,
    creative: Arc<CreativeEngine>,
    dreamer: Arc<DreamProcessor>,
    lexicon: Lexicon,
    conversation: Mutex<Vec<ChatMessage>>,
}

impl Mind {
    /// Open a provider-less orchestrator with the given settings
    pub fn new(settings: Settings) -> Result<Self> {
        Self::builder(settings).build()
    }

    /// Start building an orchestrator
    pub fn builder(settings: Settings) -> MindBuilder {
        MindBuilder {
            settings,
            provider: None,
            lexicon: None,
            seed: None,
        }
    }

    /// The memory manager
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    /// The shared cognitive graph
    pub fn graph(&self) -> &Arc<Mutex<CognitiveGraph>> {
        &self.graph
    }

    /// The creative engine
    pub fn creative(&self) -> &CreativeEngine {
        &self.creative
    }

    /// Active settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ========================================================================
    // CORE API
    // ========================================================================

    /// Think about a message with creative sparks enabled (default 2)
    pub fn think(&self, message: &str) -> ThinkResult {
        self.think_with(message, true, 2)
    }

    /// Think about a message
    ///
    /// Recalls related memories, spreads activation from the extracted
    /// concepts, integrates the concepts into the graph, produces a
    /// response (LLM-backed when a provider is wired, a deterministic
    /// summary otherwise), stores both turn sides, and optionally sparks
    /// creative ideas. Provider and storage failures degrade, never raise.
    pub fn think_with(
        &self,
        message: &str,
        include_creative: bool,
        n_creative: usize,
    ) -> ThinkResult {
        // 1. Concept extraction
        let concepts = self.lexicon.extract_concepts(message);

        // 2. Memory recall across all layers
        let recall_results = self.memory.recall(message, THINK_RECALL_COUNT, None);
        let recalled = collect_recalled(&recall_results);

        // 3. Spreading activation seeded by the extracted concepts,
        // 4. then integrate the concepts and their co-occurrence edges
        let mut activated: HashMap<String, f64> = HashMap::new();
        {
            let mut graph = self.lock_graph();
            for concept in &concepts {
                activated.extend(graph.activate(
                    concept,
                    THINK_ACTIVATION_STRENGTH,
                    THINK_ACTIVATION_DEPTH,
                ));
            }
            for concept in &concepts {
                graph.add_concept(concept, NodeType::Concept, "", 0.5);
            }
            if concepts.len() > 1 {
                if let Err(e) = graph.connect_cooccurrence(&concepts, 0.3) {
                    tracing::warn!("Co-occurrence wiring failed: {}", e);
                }
            }
        }

        // 5. Produce the response
        let (response, insights) = match &self.provider {
            Some(provider) => {
                let context = self.build_context(message, &recall_results, &activated);
                let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
                {
                    let conversation = self.lock_conversation();
                    let skip = conversation.len().saturating_sub(CONVERSATION_WINDOW);
                    messages.extend(conversation.iter().skip(skip).cloned());
                }
                messages.push(ChatMessage::user(context));

                match provider.chat(&messages, 0.7, 2048) {
                    Ok(response) => {
                        let insights = self.extract_insights(&response, &concepts);
                        (response, insights)
                    }
                    Err(e) => {
                        tracing::warn!("Provider chat failed, degrading to summary: {}", e);
                        (self.build_summary(&recall_results, &activated, &concepts), vec![])
                    }
                }
            }
            None => (self.build_summary(&recall_results, &activated, &concepts), vec![]),
        };

        // 6. Record the conversation turn
        {
            let mut conversation = self.lock_conversation();
            conversation.push(ChatMessage::user(message));
            conversation.push(ChatMessage::assistant(response.clone()));
        }

        // 7. Store both turn sides in episodic memory
        let user_turn = MemoryInput::new(message, MemoryType::Episodic)
            .importance(0.5)
            .source("user")
            .tags(concepts.iter().take(5).cloned().collect());
        if let Err(e) = self.memory.remember(user_turn) {
            tracing::warn!("Failed to store user turn: {}", e);
        }
        let response_prefix = truncate_chars(&response, RESPONSE_STORE_CHARS);
        let assistant_turn = MemoryInput::new(response_prefix, MemoryType::Episodic)
            .importance(0.4)
            .source("assistant");
        if let Err(e) = self.memory.remember(assistant_turn) {
            tracing::warn!("Failed to store assistant turn: {}", e);
        }

        // 8. Creative sparks once the graph is populated enough. The lock
        // must be released before spark() takes it again.
        let graph_populated = { self.lock_graph().node_count() >= 2 };
        let creative_sparks = if include_creative && graph_populated {
            self.creative.spark(message, None, n_creative)
        } else {
            vec![]
        };

        // 9. Persist the graph
        if let Err(e) = self.lock_graph().save() {
            tracing::warn!("Failed to persist graph after think: {}", e);
        }

        let associations = build_associations(&concepts, &activated);
        ThinkResult {
            response,
            associations,
            insights,
            creative_sparks,
            activated_concepts: activated,
            recalled_memories: recalled,
        }
    }

    /// Learn a piece of knowledge: store it semantically and integrate its
    /// concepts into the graph
    pub fn learn(
        &self,
        content: &str,
        domain: &str,
        importance: f64,
        tags: Option<Vec<String>>,
    ) -> Result<MemoryRecord> {
        validate_unit("importance", importance)?;
        let concepts = self.lexicon.extract_concepts(content);

        let record = self.memory.remember(
            MemoryInput::new(content, MemoryType::Semantic)
                .importance(importance)
                .domain(domain)
                .tags(tags.unwrap_or_else(|| concepts.iter().take(5).cloned().collect()))
                .source("learn"),
        )?;

        {
            let mut graph = self.lock_graph();
            for concept in &concepts {
                graph.add_concept(concept, NodeType::Concept, domain, importance * 0.8);
            }
            if concepts.len() > 1 {
                graph.connect_cooccurrence(&concepts, 0.4)?;
            }
            if let Err(e) = graph.save() {
                tracing::warn!("Failed to persist graph after learn: {}", e);
            }
        }

        Ok(record)
    }

    /// Multi-layer memory search, flattened and ranked
    pub fn recall(&self, query: &str, n: usize) -> Vec<RecalledMemory> {
        self.memory.recall_flat(query, n)
    }

    /// Creative imagination
    ///
    /// With both endpoints given, returns one spark per pair strategy
    /// (bisociation, blending, analogy) truncated to `n`; otherwise sparks
    /// freely around whichever endpoint is present.
    pub fn imagine(&self, a: Option<&str>, b: Option<&str>, n: usize) -> Vec<CreativeSpark> {
        match (a, b) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
                let mut sparks = vec![
                    self.creative.bisociate(a, b),
                    self.creative.blend(a, b),
                    self.creative.analogize(a, b),
                ];
                sparks.truncate(n);
                sparks
            }
            _ => {
                let context = a.or(b).unwrap_or("");
                self.creative.spark(context, None, n)
            }
        }
    }

    /// Run one dream cycle synchronously
    pub fn dream(&self) -> DreamReport {
        self.dreamer.dream_once()
    }

    /// Start the background dream loop
    pub fn start_dreaming(&self, interval: Duration) {
        self.dreamer.start(interval);
    }

    /// Stop the background dream loop
    pub fn stop_dreaming(&self) {
        self.dreamer.stop();
    }

    /// The dream processor
    pub fn dreamer(&self) -> &DreamProcessor {
        &self.dreamer
    }

    /// Aggregate statistics across every subsystem
    pub fn stats(&self) -> MindStats {
        MindStats {
            memory: self.memory.get_stats(),
            graph: self.lock_graph().stats(),
            dream: self.dreamer.get_stats(),
            model: self
                .provider
                .as_ref()
                .map(|p| p.model_name().to_string())
                .unwrap_or_else(|| "none".to_string()),
            conversation_length: self.lock_conversation().len(),
        }
    }

    /// Clear the conversation buffer and working memory; long-term stores
    /// and the graph are preserved
    pub fn reset(&self) {
        self.lock_conversation().clear();
        self.memory.with_working(|working| working.clear());
    }

    // ========================================================================
    // CONTEXT ASSEMBLY
    // ========================================================================

    /// Assemble the enriched prompt sent to the LLM
    fn build_context(
        &self,
        message: &str,
        recall_results: &RecallResults,
        activated: &HashMap<String, f64>,
    ) -> String {
        let mut parts = vec![format!("User message: {message}\n")];

        let mut memory_lines = Vec::new();
        for item in &recall_results.working {
            memory_lines.push(format!(
                "  [working] {}",
                truncate_chars(&item.content, CONTEXT_MEMORY_CHARS)
            ));
        }
        for record in &recall_results.episodic {
            memory_lines.push(format!(
                "  [episodic] {}",
                truncate_chars(&record.content, CONTEXT_MEMORY_CHARS)
            ));
        }
        for hit in &recall_results.semantic {
            memory_lines.push(format!(
                "  [semantic] {}",
                truncate_chars(&hit.content, CONTEXT_MEMORY_CHARS)
            ));
        }
        for record in &recall_results.procedural {
            memory_lines.push(format!(
                "  [procedural] {}",
                truncate_chars(&record.content, CONTEXT_MEMORY_CHARS)
            ));
        }
        if !memory_lines.is_empty() {
            memory_lines.truncate(THINK_RECALL_COUNT);
            parts.push(format!("Relevant memories:\n{}", memory_lines.join("\n")));
        }

        let ranked = ranked_activations(activated);
        if !ranked.is_empty() {
            let top: Vec<String> = ranked
                .iter()
                .take(8)
                .map(|(id, activation)| format!("{id} ({activation:.2})"))
                .collect();
            parts.push(format!("\nActive concepts: {}", top.join(", ")));

            let graph = self.lock_graph();
            for (id, _) in ranked.iter().take(3) {
                let neighbors = graph.get_neighbors(id, None, 0.3);
                if !neighbors.is_empty() {
                    let names: Vec<&str> = neighbors
                        .iter()
                        .take(5)
                        .map(|n| n.target.as_str())
                        .collect();
                    parts.push(format!("    {id} \u{2192} {}", names.join(", ")));
                }
            }
        }

        parts.join("\n")
    }

    /// Deterministic response used when no provider is available (or the
    /// provider failed)
    fn build_summary(
        &self,
        recall_results: &RecallResults,
        activated: &HashMap<String, f64>,
        concepts: &[String],
    ) -> String {
        let mut parts = vec!["[cognitive analysis]".to_string()];

        if !concepts.is_empty() {
            parts.push(format!("Extracted concepts: {}", concepts.join(", ")));
        }
        let ranked = ranked_activations(activated);
        if !ranked.is_empty() {
            let top: Vec<String> = ranked
                .iter()
                .take(5)
                .map(|(id, activation)| format!("{id}({activation:.2})"))
                .collect();
            parts.push(format!("Active network: {}", top.join(", ")));
        }
        parts.push(format!(
            "Found {} related memory records.",
            recall_results.total()
        ));

        parts.join("\n")
    }

    /// Extract insight sentences from a response
    fn extract_insights(&self, response: &str, concepts: &[String]) -> Vec<Insight> {
        self.lexicon
            .extract_insight_sentences(response)
            .into_iter()
            .map(|content| Insight {
                content,
                confidence: 0.6,
                source_concepts: concepts.iter().take(3).cloned().collect(),
                insight_type: "intuition".to_string(),
            })
            .collect()
    }

    fn lock_graph(&self) -> std::sync::MutexGuard<'_, CognitiveGraph> {
        self.graph.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_conversation(&self) -> std::sync::MutexGuard<'_, Vec<ChatMessage>> {
        self.conversation.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Activations sorted by level (descending), ties by id for stability
fn ranked_activations(activated: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> =
        activated.iter().map(|(id, a)| (id.clone(), *a)).collect();
    ranked.sort_by(|x, y| {
        y.1.partial_cmp(&x.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| x.0.cmp(&y.0))
    });
    ranked
}

/// Surface associations between the leading concepts and the most activated
/// graph nodes
fn build_associations(
    concepts: &[String],
    activated: &HashMap<String, f64>,
) -> Vec<Association> {
    let ranked = ranked_activations(activated);
    let now = Utc::now();
    let mut associations = Vec::new();
    for concept in concepts.iter().take(3) {
        for (target, activation) in ranked.iter().take(5) {
            if target != concept {
                associations.push(Association {
                    source: concept.clone(),
                    target: target.clone(),
                    edge_type: EdgeType::Semantic,
                    weight: *activation,
                    confidence: 1.0,
                    reinforced_count: 1,
                    created_at: now,
                });
            }
        }
    }
    associations
}

/// Collect recalled memories across layers into record form, capped at five
fn collect_recalled(results: &RecallResults) -> Vec<MemoryRecord> {
    let mut recalled = Vec::new();
    for item in &results.working {
        let mut record = MemoryRecord::new(item.content.clone(), MemoryType::Episodic);
        record.memory_id = item.memory_id.clone();
        recalled.push(record);
    }
    for record in &results.episodic {
        recalled.push(record.clone());
    }
    for hit in &results.semantic {
        let mut record = MemoryRecord::new(hit.content.clone(), MemoryType::Episodic);
        record.memory_id = hit.memory_id.clone();
        record.importance = hit.similarity.clamp(0.0, 1.0);
        record.domain = hit.domain.clone();
        recalled.push(record);
    }
    for record in &results.procedural {
        recalled.push(record.clone());
    }
    recalled.truncate(THINK_RECALL_COUNT);
    recalled
}

/// Char-safe prefix of `s` with at most `max` characters
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// TESTS
// ============================================================================
