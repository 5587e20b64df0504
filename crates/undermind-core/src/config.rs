//! Configuration
//!
//! Central tunables for every subsystem. All values carry spec defaults and
//! can be overridden through `UNDERMIND_`-prefixed environment variables,
//! e.g. `UNDERMIND_WORKING_MEMORY_CAPACITY=9`.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Environment variable prefix shared by every setting
pub const ENV_PREFIX: &str = "UNDERMIND_";

// ============================================================================
// SETTINGS
// ============================================================================

/// Runtime configuration for the whole cognitive core
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory for all persisted state (graph, stores, vector index)
    pub data_dir: PathBuf,

    // ========== Memory ==========
    /// Working memory capacity (Miller's Law: 7±2)
    pub working_memory_capacity: usize,
    /// Maximum episodic records before pruning
    pub episodic_capacity: usize,
    /// Minimum vector similarity available to recall callers
    pub min_similarity: f64,

    // ========== Cognitive graph ==========
    /// Activation decay rate per cycle
    pub activation_decay: f64,
    /// Spreading activation propagation factor
    pub spread_factor: f64,
    /// Edges below this weight are candidates for pruning
    pub min_association_weight: f64,

    // ========== Creative engine ==========
    /// LLM temperature for creative operations
    pub creativity_temperature: f64,
    /// Minimum novelty for a spark to surface
    pub min_novelty_score: f64,

    // ========== Background processor ==========
    /// Seconds between dream cycles
    pub dream_interval_secs: u64,
    /// Records below this importance are eligible for forgetting
    pub forgetting_threshold: f64,

    // ========== LLM provider ==========
    /// Default model name used when none is supplied
    pub default_model: String,
    /// Base URL of the local Ollama server
    pub ollama_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            working_memory_capacity: 7,
            episodic_capacity: 500,
            min_similarity: 0.5,
            activation_decay: 0.1,
            spread_factor: 0.6,
            min_association_weight: 0.1,
            creativity_temperature: 0.8,
            min_novelty_score: 0.3,
            dream_interval_secs: 300,
            forgetting_threshold: 0.2,
            default_model: "llama3.1:8b".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
        }
    }
}

impl Settings {
    /// Build settings from defaults plus any `UNDERMIND_*` environment overrides
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Some(dir) = env_var("DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        read_env(&mut settings.working_memory_capacity, "WORKING_MEMORY_CAPACITY");
        read_env(&mut settings.episodic_capacity, "EPISODIC_CAPACITY");
        read_env(&mut settings.min_similarity, "MIN_SIMILARITY");
        read_env(&mut settings.activation_decay, "ACTIVATION_DECAY");
        read_env(&mut settings.spread_factor, "SPREAD_FACTOR");
        read_env(&mut settings.min_association_weight, "MIN_ASSOCIATION_WEIGHT");
        read_env(&mut settings.creativity_temperature, "CREATIVITY_TEMPERATURE");
        read_env(&mut settings.min_novelty_score, "MIN_NOVELTY_SCORE");
        read_env(&mut settings.dream_interval_secs, "DREAM_INTERVAL");
        read_env(&mut settings.forgetting_threshold, "FORGETTING_THRESHOLD");
        if let Some(model) = env_var("DEFAULT_MODEL") {
            settings.default_model = model;
        }
        if let Some(url) = env_var("OLLAMA_BASE_URL") {
            settings.ollama_base_url = url;
        }

        settings
    }

    /// Settings rooted at a specific data directory (useful for tests and embedders)
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Path of the persisted cognitive graph document
    pub fn graph_path(&self) -> PathBuf {
        self.data_dir.join("cognitive_graph.json")
    }

    /// Path of the episodic SQLite database
    pub fn episodic_path(&self) -> PathBuf {
        self.data_dir.join("episodic.db")
    }

    /// Directory holding the semantic vector index
    pub fn semantic_dir(&self) -> PathBuf {
        self.data_dir.join("semantic")
    }

    /// Path of the procedural SQLite database
    pub fn procedural_path(&self) -> PathBuf {
        self.data_dir.join("procedural.db")
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Default data directory: platform data dir, falling back to `./mind_data`
fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "undermind", "core") {
        return proj_dirs.data_dir().to_path_buf();
    }
    PathBuf::from("./mind_data")
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

/// Parse an environment override into `slot`, keeping the default on bad input
fn read_env<T: std::str::FromStr>(slot: &mut T, name: &str) {
    if let Some(raw) = env_var(name) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}{}: {:?}", ENV_PREFIX, name, raw);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let s = Settings::default();
        assert_eq!(s.working_memory_capacity, 7);
        assert_eq!(s.episodic_capacity, 500);
        assert_eq!(s.min_similarity, 0.5);
        assert_eq!(s.activation_decay, 0.1);
        assert_eq!(s.spread_factor, 0.6);
        assert_eq!(s.min_association_weight, 0.1);
        assert_eq!(s.creativity_temperature, 0.8);
        assert_eq!(s.min_novelty_score, 0.3);
        assert_eq!(s.dream_interval_secs, 300);
        assert_eq!(s.forgetting_threshold, 0.2);
    }

    #[test]
    fn test_env_override() {
        // SAFETY: test-local variable name, no other test reads it
        unsafe { std::env::set_var("UNDERMIND_EPISODIC_CAPACITY", "42") };
        let s = Settings::from_env();
        assert_eq!(s.episodic_capacity, 42);
        unsafe { std::env::remove_var("UNDERMIND_EPISODIC_CAPACITY") };
    }

    #[test]
    fn test_invalid_env_keeps_default() {
        unsafe { std::env::set_var("UNDERMIND_SPREAD_FACTOR", "not-a-number") };
        let s = Settings::from_env();
        assert_eq!(s.spread_factor, 0.6);
        unsafe { std::env::remove_var("UNDERMIND_SPREAD_FACTOR") };
    }

    #[test]
    fn test_derived_paths() {
        let s = Settings::with_data_dir("/tmp/mind");
        assert!(s.graph_path().ends_with("cognitive_graph.json"));
        assert!(s.episodic_path().ends_with("episodic.db"));
        assert!(s.semantic_dir().ends_with("semantic"));
        assert!(s.procedural_path().ends_with("procedural.db"));
    }
}
