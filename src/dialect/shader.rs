//! GPU-shader dialect parser
//!
//! Recognizes the WGSL-flavoured constructs the editor can represent:
//! stage-annotated entry points (`@compute @workgroup_size(..)`, `@vertex`,
//! `@fragment`), `@group(..) @binding(..)` resource bindings, plain helper
//! functions, and shader structs. Bodies reuse the shared statement
//! decomposer.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::decompose::decompose_body;
use crate::diagnostics::SourceMap;
use crate::node::{Dialect, Node, NodeType};
use crate::scan;
use crate::session::ParseSession;

use super::{
    fn_signature, opaque_excerpt, report_truncation, skip_construct, DialectParser,
    MAX_TOP_LEVEL_DECLS,
};

/// Shape of a binding declaration after its attributes:
/// `var<address_space[, access]> name : type`.
static VAR_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^var\s*(?:<([^>]*)>)?\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.+)$").unwrap()
});

/// One `@name` or `@name(args)` shader attribute.
#[derive(Debug)]
struct ShaderAttr {
    name: String,
    args: Option<String>,
}

pub struct ShaderParser;

impl DialectParser for ShaderParser {
    fn dialect(&self) -> Dialect {
        Dialect::Shader
    }

    fn parse_declarations(&self, text: &str, session: &mut ParseSession) -> Vec<Node> {
        let map = SourceMap::new(text);
        let mut nodes = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            pos = scan::skip_trivia(text, pos);
            if pos >= text.len() {
                break;
            }
            if text[pos..].starts_with(';') {
                pos += 1;
                continue;
            }
            if nodes.len() >= MAX_TOP_LEVEL_DECLS {
                report_truncation(Dialect::Shader, &map, pos, session);
                break;
            }
            let (attrs, decl_start) = collect_shader_attributes(text, pos);
            if decl_start >= text.len() {
                break;
            }

            if let Some(next) = parse_fn(text, decl_start, &attrs, &map, session, &mut nodes) {
                pos = next;
            } else if let Some(next) = parse_binding(text, decl_start, &attrs, session, &mut nodes)
            {
                pos = next;
            } else if let Some(next) = parse_struct(text, decl_start, session, &mut nodes) {
                pos = next;
            } else {
                let end = skip_construct(text, decl_start).max(decl_start + 1);
                let chunk = &text[decl_start..end.min(text.len())];
                if !chunk.trim().is_empty() {
                    session.report(
                        "unrecognized shader construct imported as opaque content",
                        map.position(decl_start),
                    );
                    nodes.push(opaque_excerpt(chunk, session));
                }
                pos = end;
            }
        }
        nodes
    }
}

/// Collect leading `@..` attributes, e.g. `@compute @workgroup_size(64)`.
fn collect_shader_attributes(text: &str, at: usize) -> (Vec<ShaderAttr>, usize) {
    let mut attrs = Vec::new();
    let mut pos = scan::skip_trivia(text, at);
    while text[pos..].starts_with('@') {
        let Some((name, after_name)) = scan::ident_at(text, pos + 1) else {
            break;
        };
        let mut attr = ShaderAttr {
            name: name.to_string(),
            args: None,
        };
        let mut next = after_name;
        if text[next..].starts_with('(') {
            match scan::balanced_span(text, next) {
                Some(inner) => {
                    attr.args = Some(text[inner.clone()].trim().to_string());
                    next = inner.end + 1;
                }
                None => break,
            }
        }
        attrs.push(attr);
        pos = scan::skip_trivia(text, next);
    }
    (attrs, pos)
}

fn attr<'a>(attrs: &'a [ShaderAttr], name: &str) -> Option<&'a ShaderAttr> {
    attrs.iter().find(|a| a.name == name)
}

fn parse_fn(
    text: &str,
    at: usize,
    attrs: &[ShaderAttr],
    map: &SourceMap,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    let sig = fn_signature(text, at)?;
    let stage = ["compute", "vertex", "fragment"]
        .iter()
        .find(|s| attr(attrs, s).is_some());

    let params = Node::new(session.fresh_id(), NodeType::ParameterList)
        .with_field("TEXT", text[sig.params.clone()].trim());
    let mut node = if let Some(stage) = stage {
        let mut entry = Node::new(session.fresh_id(), NodeType::ShaderEntry)
            .with_field("NAME", sig.name.clone())
            .with_field("STAGE", *stage);
        if let Some(size) = attr(attrs, "workgroup_size").and_then(|a| a.args.clone()) {
            entry = entry.with_field("WORKGROUP_SIZE", size);
        }
        entry
    } else {
        Node::new(session.fresh_id(), NodeType::ShaderFunction).with_field("NAME", sig.name.clone())
    };
    node = node.with_value("PARAMS", params);
    if let Some(ret) = &sig.ret {
        let ret_node =
            Node::new(session.fresh_id(), NodeType::ReturnType).with_field("TEXT", ret.clone());
        node = node.with_value("RETURN", ret_node);
    }
    if let Some(body) = &sig.body {
        let stmts = decompose_body(&text[body.clone()], body.start, map, session);
        node = node.with_statements("BODY", stmts);
    }
    nodes.push(node);
    Some(sig.end)
}

fn parse_binding(
    text: &str,
    at: usize,
    attrs: &[ShaderAttr],
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    if !scan::keyword_at(text, at, "var") {
        return None;
    }
    let rel = scan::find_at_depth_zero(&text[at..], ';')?;
    let caps = VAR_SHAPE.captures(text[at..at + rel].trim_end())?;
    let mut node = Node::new(session.fresh_id(), NodeType::ShaderBinding)
        .with_field("NAME", caps.get(2).map_or("", |m| m.as_str()))
        .with_field("TYPE", caps.get(3).map_or("", |m| m.as_str()).trim());
    if let Some(space) = caps.get(1) {
        node = node.with_field("ADDRESS_SPACE", space.as_str().trim());
    }
    if let Some(group) = attr(attrs, "group").and_then(|a| a.args.clone()) {
        node = node.with_field("GROUP", group);
    }
    if let Some(binding) = attr(attrs, "binding").and_then(|a| a.args.clone()) {
        node = node.with_field("BINDING", binding);
    }
    nodes.push(node);
    Some(at + rel + 1)
}

fn parse_struct(
    text: &str,
    at: usize,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    let (name, fields, end) = super::general::struct_shape(text, at)?;
    let mut node = Node::new(session.fresh_id(), NodeType::ShaderStruct).with_field("NAME", name);
    if let Some(fields) = fields {
        let list = Node::new(session.fresh_id(), NodeType::FieldList).with_field("TEXT", fields);
        node = node.with_value("FIELDS", list);
    }
    nodes.push(node);
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::parse_dialect;

    const KERNEL: &str = "\
@group(0) @binding(0) var<storage, read_write> cells: array<Cell>;

struct Cell { pos: vec2<f32>, mass: f32 }

@compute @workgroup_size(64)
fn step(@builtin(global_invocation_id) id: vec3<u32>) {
    let index = id.x;
    cells[index].mass = cells[index].mass + 1.0;
}
";

    #[test]
    fn compute_kernel_decomposes() {
        let mut session = ParseSession::new();
        let nodes = parse_dialect(Dialect::Shader, KERNEL, &mut session);
        assert_eq!(nodes.len(), 3);

        assert_eq!(nodes[0].ty, NodeType::ShaderBinding);
        assert_eq!(nodes[0].field("NAME"), Some("cells"));
        assert_eq!(nodes[0].field("GROUP"), Some("0"));
        assert_eq!(nodes[0].field("BINDING"), Some("0"));
        assert_eq!(nodes[0].field("ADDRESS_SPACE"), Some("storage, read_write"));
        assert_eq!(nodes[0].field("TYPE"), Some("array<Cell>"));

        assert_eq!(nodes[1].ty, NodeType::ShaderStruct);
        assert_eq!(nodes[1].field("NAME"), Some("Cell"));

        assert_eq!(nodes[2].ty, NodeType::ShaderEntry);
        assert_eq!(nodes[2].field("STAGE"), Some("compute"));
        assert_eq!(nodes[2].field("WORKGROUP_SIZE"), Some("64"));
        let body = nodes[2].statements("BODY").unwrap();
        assert_eq!(body[0].ty, NodeType::Let);
        assert_eq!(body[0].field("NAME"), Some("index"));
    }

    #[test]
    fn plain_helper_is_shader_function() {
        let mut session = ParseSession::new();
        let nodes = parse_dialect(
            Dialect::Shader,
            "fn wrap(x: f32) -> f32 { return x % 1.0; }",
            &mut session,
        );
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].ty, NodeType::ShaderFunction);
        assert_eq!(nodes[0].value("RETURN").unwrap().field("TEXT"), Some("f32"));
    }
}
