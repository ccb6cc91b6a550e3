//! Domain-simulation extension parser
//!
//! Claims the cell-simulation constructs: `genome! { .. }` configuration
//! blocks (name, initial mode, per-mode split and adhesion settings) and
//! rule functions whose bodies drive the simulation API (`spawn_cell`,
//! `set_mode`, `make_adhesion`, ...). Like the ECS parser, anything the base
//! dialect owns is passed over for the mixed-mode merge to cover.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::decompose::{decompose_body, expression};
use crate::diagnostics::SourceMap;
use crate::node::{Dialect, Node, NodeType};
use crate::scan;
use crate::session::ParseSession;

use super::{
    collect_attributes, fn_signature, report_truncation, skip_construct, skip_visibility,
    DialectParser, MAX_TOP_LEVEL_DECLS,
};

/// Simulation API calls that identify a rule function.
const RULE_BODY_MARKERS: &[&str] = &[
    "spawn_cell",
    "set_mode",
    "make_adhesion",
    "cell_divide",
    "break_adhesion",
];

/// `name: "…"` entry inside a genome block.
static GENOME_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name\s*:\s*"([^"]*)""#).unwrap());

pub struct SimParser;

impl DialectParser for SimParser {
    fn dialect(&self) -> Dialect {
        Dialect::Sim
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
                report_truncation(Dialect::Sim, &map, pos, session);
                break;
            }
            let (_attrs, after_attrs) = collect_attributes(text, pos);
            let decl_start = skip_visibility(text, after_attrs);
            if decl_start >= text.len() {
                break;
            }

            if let Some(next) = parse_genome(text, decl_start, &map, session, &mut nodes) {
                pos = next;
            } else if let Some(next) = parse_rule(text, decl_start, &map, session, &mut nodes) {
                pos = next;
            } else {
                pos = skip_construct(text, decl_start).max(decl_start + 1);
            }
        }
        nodes
    }
}

fn parse_genome(
    text: &str,
    at: usize,
    map: &SourceMap,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    if !scan::keyword_at(text, at, "genome") {
        return None;
    }
    let bang = scan::skip_trivia(text, at + 6);
    if !text[bang..].starts_with('!') {
        return None;
    }
    let open = scan::skip_trivia(text, bang + 1);
    let ch = text[open..].chars().next()?;
    if ch != '{' && ch != '(' {
        return None;
    }
    let inner = match scan::balanced_span(text, open) {
        Some(range) => range,
        None => {
            session.report(
                "unclosed delimiter in `genome!` block",
                map.position(open),
            );
            return None;
        }
    };
    let config_text = text[inner.clone()].trim();
    let mut node = Node::new(session.fresh_id(), NodeType::SimGenome);
    if let Some(caps) = GENOME_NAME.captures(config_text) {
        node = node.with_field("NAME", caps.get(1).map_or("", |m| m.as_str()));
    }
    let config = expression(session, config_text);
    node = node.with_value("CONFIG", config);
    nodes.push(node);

    let mut end = inner.end + 1;
    if text[end..].starts_with(';') {
        end += 1;
    }
    Some(end)
}

fn parse_rule(
    text: &str,
    at: usize,
    map: &SourceMap,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    let sig = fn_signature(text, at)?;
    let body = sig.body.clone()?;
    let body_text = &text[body.clone()];
    if !RULE_BODY_MARKERS.iter().any(|m| body_text.contains(m)) {
        return None;
    }
    let params = Node::new(session.fresh_id(), NodeType::ParameterList)
        .with_field("TEXT", text[sig.params.clone()].trim());
    let stmts = decompose_body(body_text, body.start, map, session);
    nodes.push(
        Node::new(session.fresh_id(), NodeType::SimRule)
            .with_field("NAME", sig.name.clone())
            .with_value("PARAMS", params)
            .with_statements("BODY", stmts),
    );
    Some(sig.end)
}
