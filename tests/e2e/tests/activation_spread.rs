//! Spreading activation over a small chain

use undermind_core::EdgeType;
use undermind_e2e_tests::harness::temp_mind;

#[test]
fn activation_spreads_two_hops_with_expected_levels() {
    let (_dir, mind) = temp_mind();
    let mut graph = mind.graph().lock().unwrap();
    graph.connect("x", "y", EdgeType::Semantic, 0.8, 1.0).unwrap();
    graph.connect("y", "z", EdgeType::Semantic, 0.5, 1.0).unwrap();

    let activated = graph.activate("x", 1.0, 2);

    assert_eq!(activated.len(), 3, "x, y and z must all be present");
    assert!((activated["x"] - 1.0).abs() < 1e-9);
    assert!((activated["y"] - 0.48).abs() < 1e-9, "1.0 × 0.6 × 0.8");
    assert!((activated["z"] - 0.144).abs() < 1e-9, "0.48 × 0.6 × 0.5");
}

#[test]
fn activation_mutates_node_state() {
    let (_dir, mind) = temp_mind();
    let mut graph = mind.graph().lock().unwrap();
    graph.connect("x", "y", EdgeType::Semantic, 0.8, 1.0).unwrap();

    graph.activate("x", 1.0, 1);
    assert!((graph.get_concept("y").unwrap().activation - 0.48).abs() < 1e-9);

    let most_active = graph.get_most_active(1);
    assert_eq!(most_active[0].name, "x");
}

#[test]
fn decay_walks_every_activation_back_toward_zero() {
    let (_dir, mind) = temp_mind();
    let mut graph = mind.graph().lock().unwrap();
    graph.connect("x", "y", EdgeType::Semantic, 0.8, 1.0).unwrap();
    graph.activate("x", 1.0, 2);

    let before: Vec<f64> = ["x", "y"]
        .iter()
        .map(|id| graph.get_concept(id).unwrap().activation)
        .collect();
    graph.decay_all(None);
    for (i, id) in ["x", "y"].iter().enumerate() {
        let after = graph.get_concept(id).unwrap().activation;
        assert!(after <= before[i]);
        assert!(after >= 0.0);
    }

    // Decay never goes below zero
    for _ in 0..20 {
        graph.decay_all(None);
    }
    assert_eq!(graph.get_concept("y").unwrap().activation, 0.0);
}
