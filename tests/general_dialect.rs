//! Integration tests for the general-purpose dialect.

use blockbridge::node::NodeType;
use blockbridge::parse_source;

/// The worked reference example: one function declaration with its
/// parameter-list and return-type captures and a single return statement.
#[test]
fn function_declaration_shape() {
    let outcome = parse_source("fn add(a: i32, b: i32) -> i32 { return a + b; }", "general");
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.nodes.len(), 1);

    let func = &outcome.nodes[0];
    assert_eq!(func.ty, NodeType::Function);
    assert_eq!(func.field("NAME"), Some("add"));

    let params = func.value("PARAMS").expect("parameter-list child");
    assert_eq!(params.ty, NodeType::ParameterList);
    assert_eq!(params.field("TEXT"), Some("a: i32, b: i32"));

    let ret = func.value("RETURN").expect("return-type child");
    assert_eq!(ret.ty, NodeType::ReturnType);
    assert_eq!(ret.field("TEXT"), Some("i32"));

    let body = func.statements("BODY").expect("body statements");
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].ty, NodeType::Return);
    assert_eq!(body[0].value("VALUE").unwrap().field("TEXT"), Some("a + b"));
}

/// Parsing identical text twice yields node sequences identical up to ids.
#[test]
fn parsing_is_idempotent_up_to_ids() {
    let source = "use app::cells;\nfn tick(dt: f32) { let t = dt * 2.0; step(t); }";
    let first = parse_source(source, "general");
    let second = parse_source(source, "general");
    assert_eq!(first.nodes.len(), second.nodes.len());
    for (a, b) in first.nodes.iter().zip(second.nodes.iter()) {
        assert!(a.same_shape(b), "{:?} differs from {:?}", a.ty, b.ty);
    }
}

/// A string literal containing `"}"` must not close the enclosing body.
#[test]
fn literal_aware_balancing() {
    let source = r#"fn label() -> String { let closer = "}"; return closer; }"#;
    let outcome = parse_source(source, "general");
    assert_eq!(outcome.nodes.len(), 1);
    let body = outcome.nodes[0].statements("BODY").unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0].ty, NodeType::Let);
    assert_eq!(
        body[0].value("VALUE").unwrap().field("TEXT"),
        Some(r#""}""#)
    );
    assert_eq!(body[1].ty, NodeType::Return);
}

/// Non-empty input with zero recognizable constructs yields exactly one
/// opaque node, never an empty result.
#[test]
fn no_silent_drop() {
    let outcome = parse_source("@@ totally unrecognizable @@", "general");
    assert_eq!(outcome.nodes.len(), 1);
    assert_eq!(outcome.nodes[0].ty, NodeType::Opaque);
    assert!(outcome.nodes[0]
        .field("TEXT")
        .unwrap()
        .contains("unrecognizable"));
}

/// Empty input is the one case allowed to produce nothing.
#[test]
fn empty_input_is_empty_result() {
    let outcome = parse_source("", "general");
    assert!(outcome.nodes.is_empty());
    assert!(outcome.diagnostics.is_empty());
}

/// A trailing expression without a semicolon carries
/// expression-as-final-value semantics.
#[test]
fn implicit_return() {
    let outcome = parse_source("fn double(x: u32) -> u32 { x * 2 }", "general");
    let body = outcome.nodes[0].statements("BODY").unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].ty, NodeType::ImplicitReturn);
    assert_eq!(body[0].value("VALUE").unwrap().field("TEXT"), Some("x * 2"));
}

/// Nested control flow decomposes recursively.
#[test]
fn nested_bodies_decompose() {
    let source = "\
fn settle(cells: &mut [Cell]) {
    for cell in cells.iter_mut() {
        if cell.mass > 2.0 {
            cell.mass = cell.mass / 2.0;
        } else {
            cell.age += 1;
        }
    }
}";
    let outcome = parse_source(source, "general");
    let body = outcome.nodes[0].statements("BODY").unwrap();
    assert_eq!(body[0].ty, NodeType::For);
    let for_body = body[0].statements("BODY").unwrap();
    assert_eq!(for_body[0].ty, NodeType::If);
    assert_eq!(for_body[0].statements("THEN").unwrap().len(), 1);
    assert_eq!(for_body[0].statements("ELSE").unwrap().len(), 1);
}

/// Malformed constructs are skipped with a diagnostic while the rest of the
/// file still parses.
#[test]
fn recoverable_errors_keep_parsing() {
    let source = "??? not a declaration ???;\nfn fine() { work(); }";
    let outcome = parse_source(source, "general");
    assert!(!outcome.diagnostics.is_empty());
    assert_eq!(outcome.nodes.len(), 2);
    assert_eq!(outcome.nodes[0].ty, NodeType::Opaque);
    assert_eq!(outcome.nodes[1].field("NAME"), Some("fine"));
}
