//! Dream Processor
//!
//! Background consolidation loop. Each cycle, in strict order:
//! 1. Consolidate recent important episodic records into the semantic store
//! 2. Decay every activation in the graph
//! 3. Persist the graph
//! 4. Prune the episodic store down to its capacity
//! 5. Discover new connections through random walks
//! 6. Generate hypotheses through the creative engine
//! 7. Count clusters as the patterns-found signal
//!
//! The loop runs on its own worker thread, checks its stop flag at the top
//! of each iteration, and never raises to its scheduler; errors are logged
//! and the loop continues. `stop` waits up to five seconds, then abandons
//! the worker (daemon semantics).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::creative::CreativeEngine;
use crate::graph::{CognitiveGraph, EdgeType};
use crate::memory::MemoryManager;

/// How many recent episodic records one cycle considers for consolidation
const CONSOLIDATION_BATCH: usize = 20;

/// Importance threshold for episodic → semantic consolidation
const CONSOLIDATION_IMPORTANCE: f64 = 0.6;

/// Random walks attempted per discovery phase
const DISCOVERY_WALKS: usize = 3;

/// Steps per discovery walk
const DISCOVERY_WALK_STEPS: usize = 4;

/// Weight of a discovered connection
const DISCOVERY_WEIGHT: f64 = 0.2;

/// Confidence of a discovered connection
const DISCOVERY_CONFIDENCE: f64 = 0.3;

/// Hypotheses requested from the creative engine per cycle
const HYPOTHESES_PER_CYCLE: usize = 2;

/// How long `stop` waits for the worker before abandoning it
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// REPORTS
// ============================================================================

/// Outcome of one dream cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DreamReport {
    /// Edges added by random-walk discovery
    pub new_connections: usize,
    /// Cluster count observed at the end of the cycle
    pub patterns_found: usize,
    /// Episodic records promoted into the semantic store
    pub memories_consolidated: usize,
    /// Episodic records removed by pruning
    pub memories_pruned: usize,
    /// Ideas produced by the creative engine
    pub hypotheses_generated: Vec<String>,
    /// Free-text notes about the cycle
    pub dream_thoughts: Vec<String>,
    /// Wall-clock duration of the cycle
    pub duration_seconds: f64,
    /// When the cycle finished
    pub timestamp: DateTime<Utc>,
}

impl Default for DreamReport {
    fn default() -> Self {
        Self {
            new_connections: 0,
            patterns_found: 0,
            memories_consolidated: 0,
            memories_pruned: 0,
            hypotheses_generated: Vec::new(),
            dream_thoughts: Vec::new(),
            duration_seconds: 0.0,
            timestamp: Utc::now(),
        }
    }
}

/// Summary of the processor state
#[derive(Debug, Clone, Serialize)]
pub struct DreamStats {
    pub running: bool,
    pub interval_secs: u64,
    pub total_dreams: usize,
    pub last_dream: Option<DreamReport>,
}

// ============================================================================
// PROCESSOR
// ============================================================================

struct Worker {
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
}

/// Periodic background consolidation/pruning/discovery processor
pub struct DreamProcessor {
    memory: Arc<MemoryManager>,
    graph: Arc<Mutex<CognitiveGraph>>,
    creative: Option<Arc<CreativeEngine>>,
    /// Episodic records kept after pruning
    episodic_keep: usize,
    running: AtomicBool,
    interval_secs: Mutex<u64>,
    worker: Mutex<Option<Worker>>,
    history: Mutex<Vec<DreamReport>>,
}

impl DreamProcessor {
    pub fn new(
        memory: Arc<MemoryManager>,
        graph: Arc<Mutex<CognitiveGraph>>,
        creative: Option<Arc<CreativeEngine>>,
        episodic_keep: usize,
        interval_secs: u64,
    ) -> Self {
        Self {
            memory,
            graph,
            creative,
            episodic_keep,
            running: AtomicBool::new(false),
            interval_secs: Mutex::new(interval_secs),
            worker: Mutex::new(None),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Run a single dream cycle
    pub fn dream_once(&self) -> DreamReport {
        let start = Instant::now();
        let mut report = DreamReport::default();

        // 1. Consolidation: recent important episodic records → semantic
        report.memories_consolidated = self.consolidate();

        // 2. Global activation decay, 3. persist the graph
        {
            let mut graph = self.lock_graph();
            graph.decay_all(None);
            if let Err(e) = graph.save() {
                tracing::warn!("Dream cycle could not persist graph: {}", e);
            }
        }

        // 4. Prune the episodic store
        report.memories_pruned = match self.memory.episodic().prune(self.episodic_keep) {
            Ok(pruned) => pruned,
            Err(e) => {
                tracing::warn!("Dream cycle prune failed: {}", e);
                0
            }
        };

        // 5. Random-walk connection discovery
        report.new_connections = self.discover_connections();

        // 6. Hypothesis generation
        if let Some(creative) = &self.creative {
            report.hypotheses_generated = creative
                .spark("", None, HYPOTHESES_PER_CYCLE)
                .into_iter()
                .map(|spark| spark.idea)
                .collect();
        }

        // 7. Cluster count as the pattern signal
        report.patterns_found = self.lock_graph().find_clusters().len();

        report.duration_seconds = start.elapsed().as_secs_f64();
        report.timestamp = Utc::now();
        report.dream_thoughts.push(format!(
            "consolidated: {}, pruned: {}, new connections: {}, clusters: {}",
            report.memories_consolidated,
            report.memories_pruned,
            report.new_connections,
            report.patterns_found,
        ));

        self.lock_history().push(report.clone());
        tracing::info!(
            duration_seconds = report.duration_seconds,
            new_connections = report.new_connections,
            "Dream cycle completed"
        );
        report
    }

    /// Start the background loop; a no-op when already running
    pub fn start(self: &Arc<Self>, interval: Duration) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.interval_secs.lock().unwrap_or_else(|e| e.into_inner()) = interval.as_secs();

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let processor = Arc::clone(self);

        std::thread::spawn(move || {
            while processor.running.load(Ordering::SeqCst) {
                processor.dream_once();
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            let _ = done_tx.send(());
        });

        *self.lock_worker() = Some(Worker { stop_tx, done_rx });
        tracing::info!(interval_secs = interval.as_secs(), "Dream processor started");
    }

    /// Signal the loop to stop and wait up to five seconds
    ///
    /// A cycle that is mid-flight past the timeout is abandoned; the worker
    /// is a daemon and dies with the process.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.lock_worker().take() {
            let _ = worker.stop_tx.send(());
            if worker.done_rx.recv_timeout(STOP_JOIN_TIMEOUT).is_err() {
                tracing::warn!("Dream worker did not stop within timeout; abandoning");
            }
        }
        tracing::info!("Dream processor stopped");
    }

    /// Whether the background loop is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Past dream reports, oldest first
    pub fn history(&self) -> Vec<DreamReport> {
        self.lock_history().clone()
    }

    /// Processor state summary
    pub fn get_stats(&self) -> DreamStats {
        let history = self.lock_history();
        DreamStats {
            running: self.is_running(),
            interval_secs: *self.interval_secs.lock().unwrap_or_else(|e| e.into_inner()),
            total_dreams: history.len(),
            last_dream: history.last().cloned(),
        }
    }

    // ========================================================================
    // CYCLE PHASES
    // ========================================================================

    fn consolidate(&self) -> usize {
        let recent = match self.memory.episodic().recall_recent(CONSOLIDATION_BATCH) {
            Ok(recent) => recent,
            Err(e) => {
                tracing::warn!("Dream consolidation read failed: {}", e);
                return 0;
            }
        };

        let mut count = 0;
        for record in recent {
            if record.importance >= CONSOLIDATION_IMPORTANCE {
                match self.memory.semantic().store(&record) {
                    Ok(()) => count += 1,
                    Err(e) => tracing::warn!("Dream consolidation write failed: {}", e),
                }
            }
        }
        count
    }

    fn discover_connections(&self) -> usize {
        let mut new_connections = 0;
        let mut graph = self.lock_graph();
        for _ in 0..DISCOVERY_WALKS {
            let path = graph.random_walk(None, DISCOVERY_WALK_STEPS, true);
            let (Some(start), Some(end)) = (path.first(), path.last()) else {
                continue;
            };
            if start == end {
                continue;
            }
            let (start, end) = (start.clone(), end.clone());
            match graph.connect(
                &start,
                &end,
                EdgeType::Semantic,
                DISCOVERY_WEIGHT,
                DISCOVERY_CONFIDENCE,
            ) {
                Ok(_) => new_connections += 1,
                Err(e) => tracing::warn!("Dream discovery connect failed: {}", e),
            }
        }
        new_connections
    }

    fn lock_graph(&self) -> std::sync::MutexGuard<'_, CognitiveGraph> {
        self.graph.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, Vec<DreamReport>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_worker(&self) -> std::sync::MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for DreamProcessor {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// TESTS
// ============================================================================
