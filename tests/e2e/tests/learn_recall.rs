//! Learn-then-recall journey: knowledge flows into memory and the graph

use undermind_core::EdgeType;
use undermind_e2e_tests::harness::temp_mind;

#[test]
fn learned_knowledge_is_recallable_and_graphed() {
    let (_dir, mind) = temp_mind();

    mind.learn(
        "The hash-array-mapped trie supports structural sharing",
        "programming",
        0.8,
        None,
    )
    .unwrap();

    // Recall surfaces the learned content first
    let results = mind.recall("structural sharing", 5);
    assert!(!results.is_empty());
    assert!(
        results[0].content.contains("structural sharing"),
        "first result should carry the learned content, got: {}",
        results[0].content
    );

    // The graph picked up the content words as concepts
    let graph = mind.graph().lock().unwrap();
    let expected = ["hash", "array", "mapped", "trie", "supports", "structural", "sharing"];
    for concept in expected {
        assert!(
            graph.get_concept(concept).is_some(),
            "concept {concept} missing from graph"
        );
    }

    // ...wired together by co-occurrence edges at the learn weight
    let edge = graph
        .get_association("hash", "array", EdgeType::Cooccurrence)
        .expect("co-occurrence edge between learned concepts");
    assert_eq!(edge.weight, 0.4);
}

#[test]
fn learned_record_lands_in_both_long_term_stores() {
    let (_dir, mind) = temp_mind();
    let record = mind
        .learn("Bloom filters trade accuracy for space", "programming", 0.8, None)
        .unwrap();

    // importance 0.8 ≥ 0.6: cross-referenced into episodic and semantic
    assert!(mind.memory().semantic().get(&record.memory_id).is_some());
    assert!(mind.memory().episodic().get(&record.memory_id).unwrap().is_some());
}

#[test]
fn recall_annotates_layers_and_ranks_by_score() {
    let (_dir, mind) = temp_mind();
    mind.learn("Consistent hashing spreads load", "distributed", 0.9, None).unwrap();
    mind.learn("Hashing passwords requires salt", "security", 0.4, None).unwrap();

    let results = mind.recall("hashing", 10);
    assert!(results.len() >= 2);
    for pair in results.windows(2) {
        assert!(pair[0].score() >= pair[1].score());
    }
}
