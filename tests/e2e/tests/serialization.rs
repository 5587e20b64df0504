//! Stable JSON shapes for the result documents and the persisted graph

use undermind_core::{CognitiveGraph, EdgeType, NodeType, Settings};
use undermind_e2e_tests::harness::temp_mind;

#[test]
fn think_result_has_stable_field_names() {
    let (_dir, mind) = temp_mind();
    let result = mind.think("stable serialization matters");
    let json = serde_json::to_value(&result).unwrap();

    for field in [
        "response",
        "associations",
        "insights",
        "creative_sparks",
        "activated_concepts",
        "recalled_memories",
    ] {
        assert!(json.get(field).is_some(), "ThinkResult missing {field}");
    }
}

#[test]
fn dream_report_has_stable_field_names() {
    let (_dir, mind) = temp_mind();
    mind.learn("serialization shapes are contracts", "engineering", 0.7, None).unwrap();
    let report = mind.dream();
    let json = serde_json::to_value(&report).unwrap();

    for field in [
        "new_connections",
        "patterns_found",
        "memories_consolidated",
        "memories_pruned",
        "hypotheses_generated",
        "dream_thoughts",
        "duration_seconds",
        "timestamp",
    ] {
        assert!(json.get(field).is_some(), "DreamReport missing {field}");
    }
}

#[test]
fn creative_spark_has_stable_field_names() {
    let (_dir, mind) = temp_mind();
    let sparks = mind.imagine(Some("rivers"), Some("ledgers"), 1);
    let json = serde_json::to_value(&sparks[0]).unwrap();
    for field in ["idea", "strategy", "source_a", "source_b", "novelty", "relevance"] {
        assert!(json.get(field).is_some(), "CreativeSpark missing {field}");
    }
    assert_eq!(json["strategy"], "bisociation");
}

#[test]
fn graph_file_round_trips_to_identical_structure() {
    let dir = tempfile::TempDir::new().unwrap();
    let settings = Settings::with_data_dir(dir.path());

    let mut original = CognitiveGraph::with_seed(settings.graph_path(), &settings, 1);
    original.add_concept("Tide", NodeType::Entity, "oceans", 0.9);
    original.connect("tide", "moon", EdgeType::Causal, 0.8, 0.9).unwrap();
    original.connect("tide", "moon", EdgeType::Semantic, 0.4, 1.0).unwrap();
    original.connect("moon", "calendar", EdgeType::Enables, 0.5, 0.7).unwrap();
    original.activate("tide", 0.9, 2);
    original.save().unwrap();

    let reloaded = CognitiveGraph::with_seed(settings.graph_path(), &settings, 1);
    assert_eq!(original.export_graph(), reloaded.export_graph());

    // And the document is self-describing: every attribute present
    let raw = std::fs::read_to_string(settings.graph_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let node = &json["nodes"][0];
    for field in [
        "id",
        "name",
        "node_type",
        "activation",
        "importance",
        "frequency",
        "domain",
        "created_at",
        "last_activated",
    ] {
        assert!(node.get(field).is_some(), "node missing {field}");
    }
    let edge = &json["edges"][0];
    for field in [
        "source",
        "target",
        "edge_type",
        "weight",
        "confidence",
        "reinforced_count",
        "created_at",
    ] {
        assert!(edge.get(field).is_some(), "edge missing {field}");
    }
}

#[test]
fn memory_record_has_stable_field_names() {
    let (_dir, mind) = temp_mind();
    let record = mind.learn("records serialize stably", "engineering", 0.7, None).unwrap();
    let json = serde_json::to_value(&record).unwrap();
    for field in [
        "memory_id",
        "content",
        "memory_type",
        "importance",
        "domain",
        "tags",
        "source",
        "timestamp",
        "access_count",
    ] {
        assert!(json.get(field).is_some(), "MemoryRecord missing {field}");
    }
    assert_eq!(json["memory_type"], "semantic");
}
