//! Edge reinforcement: repeating a triple strengthens one edge

use undermind_core::EdgeType;
use undermind_e2e_tests::harness::temp_mind;

#[test]
fn repeated_connect_reinforces_single_edge() {
    let (_dir, mind) = temp_mind();
    let mut graph = mind.graph().lock().unwrap();

    for _ in 0..5 {
        graph.connect("a", "b", EdgeType::Semantic, 0.5, 1.0).unwrap();
    }

    let edge = graph.get_association("a", "b", EdgeType::Semantic).unwrap();
    assert!((edge.weight - 0.70).abs() < 1e-9, "0.5 + 4×0.05 = 0.70");
    assert_eq!(edge.reinforced_count, 5);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn reverse_direction_is_a_distinct_edge() {
    let (_dir, mind) = temp_mind();
    let mut graph = mind.graph().lock().unwrap();

    graph.connect("a", "b", EdgeType::Semantic, 0.5, 1.0).unwrap();
    graph.connect("b", "a", EdgeType::Semantic, 0.5, 1.0).unwrap();

    assert_eq!(graph.edge_count(), 2);
    let forward = graph.get_association("a", "b", EdgeType::Semantic).unwrap();
    let backward = graph.get_association("b", "a", EdgeType::Semantic).unwrap();
    assert_eq!(forward.reinforced_count, 1);
    assert_eq!(backward.reinforced_count, 1);
}

#[test]
fn weight_saturates_at_one_under_heavy_reinforcement() {
    let (_dir, mind) = temp_mind();
    let mut graph = mind.graph().lock().unwrap();
    for _ in 0..50 {
        graph.connect("x", "y", EdgeType::Causal, 0.8, 1.0).unwrap();
    }
    let edge = graph.get_association("x", "y", EdgeType::Causal).unwrap();
    assert_eq!(edge.weight, 1.0);
    assert_eq!(edge.reinforced_count, 50);
}
