//! General-purpose dialect parser
//!
//! Recognizes the systems-dialect declarations the editor can represent:
//! `use`, `fn`, `struct`, `const`/`static`, and `impl` blocks. Anything else
//! at the top level degrades into a bounded opaque node instead of being
//! dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::decompose::{decompose_body, expression};
use crate::diagnostics::SourceMap;
use crate::node::{Dialect, Node, NodeType};
use crate::scan;
use crate::session::ParseSession;

use super::{
    collect_attributes, fn_signature, opaque_excerpt, report_truncation, skip_construct,
    skip_visibility, DialectParser, MAX_TOP_LEVEL_DECLS,
};

/// Shape of a `const`/`static` item: name, type, initializer.
static CONST_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?:const|static)\s+(?:mut\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.+?)\s*=\s*(.+)$")
        .unwrap()
});

pub struct GeneralParser;

impl DialectParser for GeneralParser {
    fn dialect(&self) -> Dialect {
        Dialect::General
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
                report_truncation(Dialect::General, &map, pos, session);
                break;
            }
            let (_attrs, after_attrs) = collect_attributes(text, pos);
            let decl_start = skip_visibility(text, after_attrs);
            if decl_start >= text.len() {
                break;
            }

            if let Some(next) = parse_use(text, decl_start, &map, session, &mut nodes) {
                pos = next;
            } else if let Some(next) = parse_fn(text, decl_start, &map, session, &mut nodes) {
                pos = next;
            } else if let Some(next) = parse_struct(text, decl_start, session, &mut nodes) {
                pos = next;
            } else if let Some(next) = parse_const(text, decl_start, session, &mut nodes) {
                pos = next;
            } else if let Some(next) = parse_impl(text, decl_start, &map, session, &mut nodes) {
                pos = next;
            } else {
                // Unrecognized construct: keep a bounded excerpt.
                let end = skip_construct(text, decl_start).max(decl_start + 1);
                let chunk = &text[decl_start..end.min(text.len())];
                if !chunk.trim().is_empty() {
                    session.report(
                        "unrecognized construct imported as opaque content",
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

fn parse_use(
    text: &str,
    at: usize,
    map: &SourceMap,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    if !scan::keyword_at(text, at, "use") {
        return None;
    }
    match scan::find_at_depth_zero(&text[at..], ';') {
        Some(rel) => {
            let path = text[at + 3..at + rel].trim();
            nodes.push(Node::new(session.fresh_id(), NodeType::Use).with_field("PATH", path));
            Some(at + rel + 1)
        }
        None => {
            session.report_with_suggestion(
                "`use` declaration missing `;`",
                map.position(at),
                "terminate the import with a semicolon",
            );
            Some(text.len())
        }
    }
}

fn parse_fn(
    text: &str,
    at: usize,
    map: &SourceMap,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    let sig = fn_signature(text, at)?;
    nodes.push(function_node(text, at, &sig, map, session));
    Some(sig.end)
}

/// Build a `function` node from a parsed signature. Shared with the
/// `impl`-block item loop.
pub(crate) fn function_node(
    text: &str,
    _at: usize,
    sig: &super::FnSig,
    map: &SourceMap,
    session: &mut ParseSession,
) -> Node {
    let params = Node::new(session.fresh_id(), NodeType::ParameterList)
        .with_field("TEXT", text[sig.params.clone()].trim());
    let mut node = Node::new(session.fresh_id(), NodeType::Function)
        .with_field("NAME", sig.name.clone())
        .with_value("PARAMS", params);
    if let Some(ret) = &sig.ret {
        let ret_node =
            Node::new(session.fresh_id(), NodeType::ReturnType).with_field("TEXT", ret.clone());
        node = node.with_value("RETURN", ret_node);
    }
    if let Some(body) = &sig.body {
        let stmts = decompose_body(&text[body.clone()], body.start, map, session);
        node = node.with_statements("BODY", stmts);
    }
    node
}

fn parse_struct(
    text: &str,
    at: usize,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    let (name, fields, end) = struct_shape(text, at)?;
    let mut node = Node::new(session.fresh_id(), NodeType::Struct).with_field("NAME", name);
    if let Some(fields) = fields {
        let list = Node::new(session.fresh_id(), NodeType::FieldList).with_field("TEXT", fields);
        node = node.with_value("FIELDS", list);
    }
    nodes.push(node);
    Some(end)
}

/// Parse `struct Name { .. }` / `struct Name(..);` / `struct Name;`,
/// returning the name, the raw field text, and the end index. Shared with
/// the extension dialects, which classify the same shape differently.
pub(crate) fn struct_shape(text: &str, at: usize) -> Option<(String, Option<String>, usize)> {
    if !scan::keyword_at(text, at, "struct") {
        return None;
    }
    let name_start = scan::skip_trivia(text, at + 6);
    let (name, after_name) = scan::ident_at(text, name_start)?;
    let mut pos = scan::skip_trivia(text, after_name);
    if text[pos..].starts_with('<') {
        let generics = scan::balanced_span(text, pos)?;
        pos = scan::skip_trivia(text, generics.end + 1);
    }
    if text[pos..].starts_with('{') {
        let inner = scan::balanced_span(text, pos)?;
        Some((
            name.to_string(),
            Some(text[inner.clone()].trim().to_string()),
            inner.end + 1,
        ))
    } else if text[pos..].starts_with('(') {
        let inner = scan::balanced_span(text, pos)?;
        let mut end = scan::skip_trivia(text, inner.end + 1);
        if text[end..].starts_with(';') {
            end += 1;
        }
        Some((
            name.to_string(),
            Some(text[inner.clone()].trim().to_string()),
            end,
        ))
    } else if text[pos..].starts_with(';') {
        Some((name.to_string(), None, pos + 1))
    } else {
        None
    }
}

fn parse_const(
    text: &str,
    at: usize,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    if !scan::keyword_at(text, at, "const") && !scan::keyword_at(text, at, "static") {
        return None;
    }
    let rel = scan::find_at_depth_zero(&text[at..], ';')?;
    let caps = CONST_SHAPE.captures(text[at..at + rel].trim_end())?;
    let value = expression(session, caps.get(3).map_or("", |m| m.as_str()));
    nodes.push(
        Node::new(session.fresh_id(), NodeType::Const)
            .with_field("NAME", caps.get(1).map_or("", |m| m.as_str()))
            .with_field("TYPE", caps.get(2).map_or("", |m| m.as_str()).trim())
            .with_value("VALUE", value),
    );
    Some(at + rel + 1)
}

fn parse_impl(
    text: &str,
    at: usize,
    map: &SourceMap,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    if !scan::keyword_at(text, at, "impl") {
        return None;
    }
    let brace_rel = scan::find_at_depth_zero(&text[at..], '{')?;
    let target = text[at + 4..at + brace_rel].trim();
    let body = scan::balanced_span(text, at + brace_rel)?;

    // Items inside an impl block are methods; anything else is skipped.
    let mut items = Vec::new();
    let mut pos = body.start;
    while pos < body.end {
        pos = scan::skip_trivia(text, pos);
        if pos >= body.end {
            break;
        }
        let (_attrs, after_attrs) = collect_attributes(text, pos);
        let item_start = skip_visibility(text, after_attrs);
        if item_start >= body.end {
            break;
        }
        if let Some(sig) = fn_signature(text, item_start) {
            items.push(function_node(text, item_start, &sig, map, session));
            pos = sig.end;
        } else {
            pos = skip_construct(text, item_start).max(item_start + 1);
        }
    }

    nodes.push(
        Node::new(session.fresh_id(), NodeType::Impl)
            .with_field("TARGET", target)
            .with_statements("ITEMS", items),
    );
    Some(body.end + 1)
}
