//! End-to-end tests: parsed trees survive the interchange format losslessly.

use blockbridge::interchange::{read_document, write_document};
use blockbridge::parse_source;
use blockbridge::ParseSession;

fn roundtrip(source: &str, tag: &str, file_name: &str) {
    let outcome = parse_source(source, tag);
    assert!(!outcome.nodes.is_empty(), "nothing parsed from {:?}", source);

    let doc = write_document(file_name, &outcome.nodes);
    let mut session = ParseSession::new();
    let (reloaded_name, reloaded) =
        read_document(&doc, &mut session).expect("writer output must reload");

    assert_eq!(reloaded_name, file_name);
    assert_eq!(reloaded.len(), outcome.nodes.len());
    for (original, copy) in outcome.nodes.iter().zip(reloaded.iter()) {
        assert!(
            original.same_shape(copy),
            "{:?} changed across the interchange format",
            original.ty
        );
    }
}

#[test]
fn general_declarations_round_trip() {
    roundtrip(
        "use app::cells;\n\
         const LIMIT: usize = 128;\n\
         fn tick(dt: f32) -> f32 {\n\
             let scaled = dt * 2.0;\n\
             if scaled > 1.0 { clamp(scaled); }\n\
             return scaled;\n\
         }",
        "general",
        "tick.rs",
    );
}

#[test]
fn shader_module_round_trips() {
    roundtrip(
        "struct Params { dt: f32 }\n\
         @group(0) @binding(0) var<storage, read_write> cells: array<Cell>;\n\
         @compute @workgroup_size(64)\n\
         fn update(@builtin(global_invocation_id) id: vec3<u32>) {\n\
             let i = id.x;\n\
         }",
        "shader",
        "update.wgsl",
    );
}

#[test]
fn opaque_content_round_trips() {
    roundtrip("trait Stepper { fn step(&mut self); }", "general", "odd.rs");
}

/// Field text containing every reserved markup character reloads verbatim.
#[test]
fn reserved_characters_survive() {
    roundtrip(
        r#"fn cmp(a: i32, b: i32) -> bool { return a < b && b > 'x' as i32; }"#,
        "general",
        "cmp.rs",
    );
}

/// Sibling order inside a body is preserved by the `<next>` chain.
#[test]
fn statement_order_is_preserved() {
    let source = "fn seq() { first(); second(); third(); }";
    let outcome = parse_source(source, "general");
    let doc = write_document("seq.rs", &outcome.nodes);

    let mut session = ParseSession::new();
    let (_, reloaded) = read_document(&doc, &mut session).unwrap();
    let body = reloaded[0].statements("BODY").unwrap();
    let texts: Vec<&str> = body
        .iter()
        .map(|n| n.value("VALUE").unwrap().field("TEXT").unwrap())
        .collect();
    assert_eq!(texts, ["first()", "second()", "third()"]);
}
