//! Working-memory overflow cascades into the episodic store

use undermind_core::{MemoryInput, MemoryType};
use undermind_e2e_tests::harness::temp_mind_with;

#[test]
fn overflow_consolidates_oldest_item() {
    let (_dir, mind) = temp_mind_with(|settings| {
        settings.working_memory_capacity = 3;
    });

    for tag in ["t1", "t2", "t3", "t4"] {
        mind.memory()
            .remember(MemoryInput::new(tag, MemoryType::Working))
            .unwrap();
    }

    // Working memory holds the newest three, in order
    let contents: Vec<String> = mind
        .memory()
        .with_working(|w| w.get_context().into_iter().map(|i| i.content).collect());
    assert_eq!(contents, vec!["t2", "t3", "t4"]);

    // The evicted t1 was consolidated into episodic
    let overflowed = mind.memory().episodic().search_content("t1", 5).unwrap();
    assert_eq!(overflowed.len(), 1);
    assert_eq!(overflowed[0].source, "working_overflow");
    assert!((overflowed[0].importance - 0.4).abs() < 1e-9);
}

#[test]
fn working_size_never_exceeds_capacity() {
    let (_dir, mind) = temp_mind_with(|settings| {
        settings.working_memory_capacity = 3;
    });
    for i in 0..20 {
        mind.memory()
            .remember(MemoryInput::new(format!("item {i}"), MemoryType::Working))
            .unwrap();
        let stats = mind.memory().get_stats();
        assert!(stats.working_size <= stats.working_capacity);
    }
}

#[test]
fn working_records_stay_out_of_long_term_stores() {
    let (_dir, mind) = temp_mind_with(|settings| {
        settings.working_memory_capacity = 7;
    });
    mind.memory()
        .remember(MemoryInput::new("ephemeral note", MemoryType::Working))
        .unwrap();

    assert_eq!(mind.memory().episodic().count().unwrap(), 0);
    assert_eq!(mind.memory().semantic().count(), 0);
    assert_eq!(mind.memory().procedural().count().unwrap(), 0);
}
