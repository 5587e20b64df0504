//! Creative Engine
//!
//! Produces creative sparks by recombining concepts from the cognitive
//! graph using four strategies:
//!
//! 1. **Bisociation** (Koestler): join two structurally distant frames
//! 2. **Blending** (Fauconnier & Turner): merge two conceptual spaces
//! 3. **Analogy** (structure mapping): transfer relations across domains
//! 4. **Lateral jump** (de Bono): inject a randomly reached concept
//!
//! With an LLM provider the ideas are phrased in natural language; without
//! one the engine still works, emitting deterministic placeholder ideas
//! that name their source concepts.

use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand::prelude::*;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::graph::CognitiveGraph;
use crate::provider::LlmProvider;

/// Steps taken by the lateral-jump random walk
const LATERAL_WALK_STEPS: usize = 4;

/// How many top distant pairs bisociation samples from
const BISOCIATION_POOL: usize = 3;

// ============================================================================
// TYPES
// ============================================================================

/// Creative recombination strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreativityStrategy {
    /// Join two distant semantic frames
    Bisociation,
    /// Conceptual blending
    Blending,
    /// Analogical transfer
    Analogy,
    /// Lateral thinking / random jump
    Lateral,
}

impl CreativityStrategy {
    /// Every strategy, in sampling order
    pub const ALL: [CreativityStrategy; 4] = [
        CreativityStrategy::Bisociation,
        CreativityStrategy::Blending,
        CreativityStrategy::Analogy,
        CreativityStrategy::Lateral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreativityStrategy::Bisociation => "bisociation",
            CreativityStrategy::Blending => "blending",
            CreativityStrategy::Analogy => "analogy",
            CreativityStrategy::Lateral => "lateral",
        }
    }
}

impl std::fmt::Display for CreativityStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One idea produced by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeSpark {
    /// The idea text
    pub idea: String,
    pub strategy: CreativityStrategy,
    /// First source concept
    pub source_a: String,
    /// Second source concept
    pub source_b: String,
    /// How novel the idea is (0 = banal, 1 = groundbreaking)
    pub novelty: f64,
    /// Fit to the triggering context
    pub relevance: f64,
}

impl CreativeSpark {
    fn new(
        idea: String,
        strategy: CreativityStrategy,
        source_a: impl Into<String>,
        source_b: impl Into<String>,
        novelty: f64,
    ) -> Self {
        Self {
            idea,
            strategy,
            source_a: source_a.into(),
            source_b: source_b.into(),
            novelty,
            relevance: 0.5,
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Creative recombination engine over the cognitive graph
pub struct CreativeEngine {
    graph: Arc<Mutex<CognitiveGraph>>,
    provider: Option<Arc<dyn LlmProvider>>,
    rng: Mutex<Pcg64>,
    /// Sparks below this novelty are not surfaced
    min_novelty: f64,
}

impl CreativeEngine {
    /// Create an engine over the shared graph, optionally LLM-backed
    pub fn new(
        graph: Arc<Mutex<CognitiveGraph>>,
        provider: Option<Arc<dyn LlmProvider>>,
        min_novelty: f64,
    ) -> Self {
        Self {
            graph,
            provider,
            rng: Mutex::new(Pcg64::from_entropy()),
            min_novelty,
        }
    }

    /// Like [`CreativeEngine::new`] but with a fixed RNG seed for
    /// reproducible strategy selection and pair sampling
    pub fn with_seed(
        graph: Arc<Mutex<CognitiveGraph>>,
        provider: Option<Arc<dyn LlmProvider>>,
        min_novelty: f64,
        seed: u64,
    ) -> Self {
        Self {
            graph,
            provider,
            rng: Mutex::new(Pcg64::seed_from_u64(seed)),
            min_novelty,
        }
    }

    /// Produce `n` sparks for the given context
    ///
    /// A fixed `strategy` is used for every spark when given; otherwise
    /// strategies are sampled uniformly.
    pub fn spark(
        &self,
        context: &str,
        strategy: Option<CreativityStrategy>,
        n: usize,
    ) -> Vec<CreativeSpark> {
        let strategies: Vec<CreativityStrategy> = match strategy {
            Some(fixed) => vec![fixed; n],
            None => {
                let mut rng = self.lock_rng();
                (0..n)
                    .map(|_| {
                        *CreativityStrategy::ALL
                            .choose(&mut *rng)
                            .expect("strategy list is non-empty")
                    })
                    .collect()
            }
        };

        strategies
            .into_iter()
            .map(|strategy| match strategy {
                CreativityStrategy::Bisociation => self.bisociate_from_graph(context),
                CreativityStrategy::Blending => self.blend_from_context(context),
                CreativityStrategy::Analogy => self.analogize_from_context(context),
                CreativityStrategy::Lateral => self.lateral_jump(context),
            })
            .filter(|spark| spark.novelty >= self.min_novelty)
            .collect()
    }

    /// Bisociate two specific concepts
    pub fn bisociate(&self, a: &str, b: &str) -> CreativeSpark {
        let prompt = format!(
            "Draw a creative connection between two unrelated concepts:\n\
             Concept A: {a}\nConcept B: {b}\n\n\
             Find a surprising common ground and derive one original idea \
             from the link. Answer in one or two sentences."
        );
        let idea = self.generate_or(&prompt, 0.9, || {
            format!("There may be an undiscovered link between [{a}] and [{b}].")
        });
        CreativeSpark::new(idea, CreativityStrategy::Bisociation, a, b, 0.8)
    }

    /// Blend two specific conceptual spaces
    pub fn blend(&self, a: &str, b: &str) -> CreativeSpark {
        let prompt = format!(
            "Conceptual blending:\nSpace A: {a}\nSpace B: {b}\n\n\
             Merge the two conceptual spaces into a new blend, taking \
             structural features from both. Answer in one or two sentences."
        );
        let idea = self.generate_or(&prompt, 0.85, || {
            format!("Blending [{a}] with [{b}] suggests a new composite concept.")
        });
        CreativeSpark::new(idea, CreativityStrategy::Blending, a, b, 0.7)
    }

    /// Transfer structural relations from a source to a target domain
    pub fn analogize(&self, source: &str, target: &str) -> CreativeSpark {
        let prompt = format!(
            "Analogical reasoning:\nSource domain: {source}\nTarget domain: {target}\n\n\
             Transfer the structural relations of the source domain onto the \
             target: as '{source}' works, so might '{target}'. Answer in one \
             or two sentences."
        );
        let idea = self.generate_or(&prompt, 0.8, || {
            format!("{source} : X = {target} : ? (a structural transfer may apply)")
        });
        CreativeSpark::new(idea, CreativityStrategy::Analogy, source, target, 0.65)
    }

    /// Jump to a randomly reached concept and use it as a disruptive lens
    pub fn lateral_jump(&self, context: &str) -> CreativeSpark {
        let distant = {
            let mut graph = self.lock_graph();
            if graph.node_count() == 0 {
                drop(graph);
                return self.spark_without_graph(context, CreativityStrategy::Lateral);
            }
            let path = graph.random_walk(None, LATERAL_WALK_STEPS, true);
            path.last().cloned()
        };
        let Some(distant) = distant else {
            return self.spark_without_graph(context, CreativityStrategy::Lateral);
        };

        let topic = if context.is_empty() { "the current topic" } else { context };
        let prompt = format!(
            "Lateral thinking:\nCurrent topic: {topic}\n\
             Randomly injected concept: {distant}\n\n\
             Force a connection between these two unrelated things; look at \
             the topic from the perspective of '{distant}'. Answer in one or \
             two sentences."
        );
        let idea = self.generate_or(&prompt, 0.95, || {
            format!("What if we looked at [{topic}] from the perspective of [{distant}]?")
        });
        CreativeSpark::new(idea, CreativityStrategy::Lateral, context, distant, 0.9)
    }

    // ========================================================================
    // STRATEGY INTERNALS
    // ========================================================================

    /// Pick two structurally distant concepts and bisociate them
    fn bisociate_from_graph(&self, context: &str) -> CreativeSpark {
        let pair = {
            let graph = self.lock_graph();
            let distant = graph.find_distant_pairs(5);
            if distant.is_empty() {
                self.random_pair_locked(&graph)
            } else {
                let mut rng = self.lock_rng();
                let pool = &distant[..distant.len().min(BISOCIATION_POOL)];
                pool.choose(&mut *rng).map(|(a, b, _)| (a.clone(), b.clone()))
            }
        };
        match pair {
            Some((a, b)) => self.bisociate(&a, &b),
            None => self.spark_without_graph(context, CreativityStrategy::Bisociation),
        }
    }

    fn blend_from_context(&self, context: &str) -> CreativeSpark {
        match self.related_pair(context) {
            Some((a, b)) => self.blend(&a, &b),
            None => self.spark_without_graph(context, CreativityStrategy::Blending),
        }
    }

    fn analogize_from_context(&self, context: &str) -> CreativeSpark {
        match self.related_pair(context) {
            Some((a, b)) => self.analogize(&a, &b),
            None => self.spark_without_graph(context, CreativityStrategy::Analogy),
        }
    }

    /// Two concepts relevant to the context: prefer concepts mentioned in
    /// the context text, else the two most active, else a random pair
    fn related_pair(&self, context: &str) -> Option<(String, String)> {
        let graph = self.lock_graph();
        if graph.node_count() < 2 {
            return None;
        }

        let lowered = context.to_lowercase();
        let mentioned: Vec<String> = graph
            .concept_ids()
            .into_iter()
            .filter(|id| lowered.contains(id.as_str()))
            .take(2)
            .collect();
        if mentioned.len() >= 2 {
            return Some((mentioned[0].clone(), mentioned[1].clone()));
        }

        let active = graph.get_most_active(5);
        if active.len() >= 2 && active[0].activation > 0.0 {
            return Some((active[0].name.clone(), active[1].name.clone()));
        }

        self.random_pair_locked(&graph)
    }

    fn random_pair_locked(&self, graph: &CognitiveGraph) -> Option<(String, String)> {
        let ids = graph.concept_ids();
        if ids.len() < 2 {
            return None;
        }
        let mut rng = self.lock_rng();
        let mut sampled = ids.choose_multiple(&mut *rng, 2);
        let a = sampled.next()?.clone();
        let b = sampled.next()?.clone();
        Some((a, b))
    }

    /// The graph is too small: ask the LLM directly, or emit a deterministic
    /// placeholder
    fn spark_without_graph(&self, context: &str, strategy: CreativityStrategy) -> CreativeSpark {
        let topic = if context.is_empty() { "general" } else { context };
        let prompt = format!(
            "Creative thinking (strategy: {strategy})\nTopic: {topic}\n\n\
             Produce one original, unexpected idea about the topic. Think \
             sideways and borrow from other fields. Answer in one or two \
             sentences."
        );
        let idea = self.generate_or(&prompt, 0.9, || {
            format!("[{topic}] has too few associations yet; more knowledge is needed.")
        });
        CreativeSpark::new(idea, strategy, context, "", 0.5)
    }

    /// Generate with the provider, degrading to the fallback text on a
    /// missing provider or any provider error
    fn generate_or(
        &self,
        prompt: &str,
        temperature: f64,
        fallback: impl FnOnce() -> String,
    ) -> String {
        match &self.provider {
            Some(provider) => match provider.generate(prompt, "", temperature, 2048) {
                Ok(idea) => idea,
                Err(e) => {
                    tracing::warn!("Creative generation degraded to placeholder: {}", e);
                    fallback()
                }
            },
            None => fallback(),
        }
    }

    fn lock_graph(&self) -> std::sync::MutexGuard<'_, CognitiveGraph> {
        self.graph.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, Pcg64> {
        self.rng.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// TESTS
// ============================================================================
