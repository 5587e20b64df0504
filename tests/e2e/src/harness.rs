//! Test harness: orchestrators rooted in temporary data directories

use std::sync::Arc;

use tempfile::TempDir;
use undermind_core::{LlmProvider, Mind, Settings};

/// Default RNG seed used across scenarios so walks are reproducible
pub const TEST_SEED: u64 = 42;

/// A mind rooted in a throwaway data directory
///
/// The `TempDir` must outlive the mind; dropping it deletes every store.
pub fn temp_mind() -> (TempDir, Mind) {
    let dir = TempDir::new().expect("temp dir");
    let settings = Settings::with_data_dir(dir.path());
    let mind = Mind::builder(settings)
        .seed(TEST_SEED)
        .build()
        .expect("mind construction");
    (dir, mind)
}

/// A mind with adjusted settings
pub fn temp_mind_with(adjust: impl FnOnce(&mut Settings)) -> (TempDir, Mind) {
    let dir = TempDir::new().expect("temp dir");
    let mut settings = Settings::with_data_dir(dir.path());
    adjust(&mut settings);
    let mind = Mind::builder(settings)
        .seed(TEST_SEED)
        .build()
        .expect("mind construction");
    (dir, mind)
}

/// A mind wired to the given provider
pub fn temp_mind_with_provider(provider: Arc<dyn LlmProvider>) -> (TempDir, Mind) {
    let dir = TempDir::new().expect("temp dir");
    let settings = Settings::with_data_dir(dir.path());
    let mind = Mind::builder(settings)
        .seed(TEST_SEED)
        .provider(provider)
        .build()
        .expect("mind construction");
    (dir, mind)
}
