//! Integration tests for mode detection and mixed-mode merging.

use blockbridge::node::{Dialect, NodeType};
use blockbridge::parse_source;
use rstest::rstest;

/// A blob mixing the systems dialect with shader code yields both node
/// vocabularies, each node dialect-pure.
#[test]
fn mixed_blob_parses_both_dialects() {
    let blob = "\
use app::gpu;
const SCALE: f32 = 2.0;

@fragment
fn shade(input: VertexOutput) -> vec4<f32> {
    return input.color;
}";
    let outcome = parse_source(blob, "auto");
    let types: Vec<NodeType> = outcome.nodes.iter().map(|n| n.ty).collect();
    assert!(types.contains(&NodeType::ShaderEntry));
    assert!(types.contains(&NodeType::Use));
    assert!(types.contains(&NodeType::Const));
    for node in &outcome.nodes {
        // Sequence-level mixing only: each node belongs to one dialect.
        let d = node.ty.dialect();
        assert!(d == Dialect::Shader || d == Dialect::General);
    }
}

/// A construct recognizable by two dialects appears exactly once in the
/// merged sequence, owned by the more specific parser.
#[test]
fn mixed_mode_non_duplication() {
    let blob = "\
fn apply(mut query: Query<&mut Cell>) {
    for cell in query.iter_mut() { age(cell); }
}

fn plain() { noop(); }";
    let outcome = parse_source(blob, "auto");
    let apply_nodes: Vec<_> = outcome
        .nodes
        .iter()
        .filter(|n| n.field("NAME") == Some("apply"))
        .collect();
    assert_eq!(apply_nodes.len(), 1);
    assert_eq!(apply_nodes[0].ty, NodeType::EcsSystem);
    // The base-dialect function is still covered by the general parser.
    assert!(outcome
        .nodes
        .iter()
        .any(|n| n.ty == NodeType::Function && n.field("NAME") == Some("plain")));
}

/// Re-parsing the same mixed blob is deterministic.
#[test]
fn mixed_merge_is_deterministic() {
    let blob = "@compute @workgroup_size(64)\nfn run() { step(); }\nfn host() { dispatch(); }";
    let first = parse_source(blob, "auto");
    let second = parse_source(blob, "auto");
    assert_eq!(first.nodes.len(), second.nodes.len());
    for (a, b) in first.nodes.iter().zip(second.nodes.iter()) {
        assert!(a.same_shape(b));
    }
}

/// Explicit dialect tags bypass detection entirely.
#[rstest]
#[case("general", NodeType::Function)]
#[case("shader", NodeType::ShaderFunction)]
fn explicit_tag_selects_parser(#[case] tag: &str, #[case] expected: NodeType) {
    let outcome = parse_source("fn lone(x: f32) -> f32 { return x; }", tag);
    assert_eq!(outcome.nodes.len(), 1);
    assert_eq!(outcome.nodes[0].ty, expected);
}

/// Extension-dialect fingerprints pull in their parser while the general
/// parser still covers the rest of the blob.
#[rstest]
#[case("genome! { name: \"Seed\", initial_mode: 0 }\nuse sim::api;", NodeType::SimGenome)]
#[case("#[derive(Component)]\nstruct Tag;\nuse app::ecs;", NodeType::EcsComponent)]
fn extension_and_base_coexist(#[case] blob: &str, #[case] expected: NodeType) {
    let outcome = parse_source(blob, "auto");
    assert!(outcome.nodes.iter().any(|n| n.ty == expected));
    assert!(outcome.nodes.iter().any(|n| n.ty == NodeType::Use));
}
