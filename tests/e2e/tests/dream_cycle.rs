//! Dream cycles: consolidation, decay, discovery, and persistence

use std::time::Duration;

use undermind_core::{MemoryInput, MemoryType, NodeType};
use undermind_e2e_tests::harness::{temp_mind, temp_mind_with};

#[test]
fn dream_on_seeded_graph_discovers_connections() {
    let (dir, mind) = temp_mind();
    {
        let mut graph = mind.graph().lock().unwrap();
        for i in 0..10 {
            graph.add_concept(&format!("island{i}"), NodeType::Concept, "", 0.5);
        }
    }

    let report = mind.dream();

    assert!(report.new_connections >= 1, "random-walk discovery should wire endpoints");
    assert_eq!(report.memories_pruned, 0, "empty episodic store prunes nothing");
    assert!(report.duration_seconds > 0.0);
    assert!(dir.path().join("cognitive_graph.json").exists());
}

#[test]
fn dream_consolidates_important_episodes_into_semantic() {
    let (_dir, mind) = temp_mind();
    // Written directly so the dream cycle (not remember's cross-reference)
    // performs the promotion
    let record = MemoryInput::new("a critical production incident", MemoryType::Episodic)
        .importance(0.9)
        .into_record();
    mind.memory().episodic().store(&record).unwrap();

    let report = mind.dream();
    assert_eq!(report.memories_consolidated, 1);
    assert!(mind.memory().semantic().get(&record.memory_id).is_some());
}

#[test]
fn dream_prunes_episodic_down_to_capacity() {
    let (_dir, mind) = temp_mind_with(|settings| {
        settings.episodic_capacity = 5;
    });
    for i in 0..12 {
        // Straight into the store; remember would add working-overflow
        // records on top and blur the arithmetic
        let record = MemoryInput::new(format!("event {i}"), MemoryType::Episodic)
            .importance(0.3)
            .into_record();
        mind.memory().episodic().store(&record).unwrap();
    }

    let report = mind.dream();
    assert_eq!(report.memories_pruned, 7);
    assert_eq!(mind.memory().episodic().count().unwrap(), 5);
}

#[test]
fn dream_reports_hypotheses_and_patterns() {
    let (_dir, mind) = temp_mind();
    mind.learn("ant colonies route around failures", "biology", 0.7, None).unwrap();
    mind.learn("packet networks route around failures", "networking", 0.7, None).unwrap();

    let report = mind.dream();
    assert_eq!(report.hypotheses_generated.len(), 2);
    assert!(report.patterns_found >= 1);
    assert!(!report.dream_thoughts.is_empty());

    let stats = mind.dreamer().get_stats();
    assert_eq!(stats.total_dreams, 1);
    assert!(stats.last_dream.is_some());
}

#[test]
fn background_loop_starts_and_stops() {
    let (_dir, mind) = temp_mind();
    mind.learn("a seed thought", "misc", 0.5, None).unwrap();

    mind.start_dreaming(Duration::from_secs(120));
    assert!(mind.dreamer().is_running());

    // The first cycle fires immediately; wait for it
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while mind.dreamer().history().is_empty() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!mind.dreamer().history().is_empty());

    mind.stop_dreaming();
    assert!(!mind.dreamer().is_running());
}

#[test]
fn dreaming_runs_concurrently_with_think() {
    let (_dir, mind) = temp_mind();
    mind.learn("locks serialize access to shared state", "programming", 0.7, None).unwrap();

    mind.start_dreaming(Duration::from_millis(20));
    for _ in 0..5 {
        let result = mind.think("how do we reduce lock contention?");
        assert!(!result.response.is_empty());
    }
    mind.stop_dreaming();

    // Both sides made progress without deadlocking
    assert!(!mind.dreamer().history().is_empty());
}
