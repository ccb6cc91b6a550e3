//! Entity-component extension parser
//!
//! An extension of the general dialect: it claims only the constructs that
//! carry ECS markers — `#[derive(Component)]` / `#[derive(Resource)]` structs
//! and system functions whose parameter lists use the ECS container types —
//! and passes silently over everything the base dialect owns. Mixed-mode
//! merging pairs this parser with the general one so the rest of the file is
//! still covered.

use crate::decompose::decompose_body;
use crate::diagnostics::SourceMap;
use crate::node::{Dialect, Node, NodeType};
use crate::scan;
use crate::session::ParseSession;

use super::{
    collect_attributes, fn_signature, report_truncation, skip_construct, skip_visibility,
    DialectParser, MAX_TOP_LEVEL_DECLS,
};

/// Parameter-list markers that identify a system function.
const SYSTEM_PARAM_MARKERS: &[&str] = &[
    "Query<",
    "Commands",
    "Res<",
    "ResMut<",
    "EventReader<",
    "EventWriter<",
];

pub struct EcsParser;

impl DialectParser for EcsParser {
    fn dialect(&self) -> Dialect {
        Dialect::Ecs
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
                report_truncation(Dialect::Ecs, &map, pos, session);
                break;
            }
            let (attrs, after_attrs) = collect_attributes(text, pos);
            let decl_start = skip_visibility(text, after_attrs);
            if decl_start >= text.len() {
                break;
            }

            if let Some(next) = parse_marked_struct(text, decl_start, &attrs, session, &mut nodes)
            {
                pos = next;
            } else if let Some(next) = parse_system(text, decl_start, &map, session, &mut nodes) {
                pos = next;
            } else {
                // Base-dialect construct; not ours to claim.
                pos = skip_construct(text, decl_start).max(decl_start + 1);
            }
        }
        nodes
    }
}

fn parse_marked_struct(
    text: &str,
    at: usize,
    attrs: &[String],
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    let ty = if attrs.iter().any(|a| a.starts_with("derive") && a.contains("Component")) {
        NodeType::EcsComponent
    } else if attrs.iter().any(|a| a.starts_with("derive") && a.contains("Resource")) {
        NodeType::EcsResource
    } else {
        return None;
    };
    let (name, fields, end) = super::general::struct_shape(text, at)?;
    let mut node = Node::new(session.fresh_id(), ty).with_field("NAME", name);
    if let Some(fields) = fields {
        let list = Node::new(session.fresh_id(), NodeType::FieldList).with_field("TEXT", fields);
        node = node.with_value("FIELDS", list);
    }
    nodes.push(node);
    Some(end)
}

fn parse_system(
    text: &str,
    at: usize,
    map: &SourceMap,
    session: &mut ParseSession,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    let sig = fn_signature(text, at)?;
    let params_text = &text[sig.params.clone()];
    if !SYSTEM_PARAM_MARKERS.iter().any(|m| params_text.contains(m)) {
        return None;
    }
    let params = Node::new(session.fresh_id(), NodeType::ParameterList)
        .with_field("TEXT", params_text.trim());
    let mut node = Node::new(session.fresh_id(), NodeType::EcsSystem)
        .with_field("NAME", sig.name.clone())
        .with_value("PARAMS", params);
    if let Some(body) = &sig.body {
        let stmts = decompose_body(&text[body.clone()], body.start, map, session);
        node = node.with_statements("BODY", stmts);
    }
    nodes.push(node);
    Some(sig.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::parse_dialect_raw;

    const SOURCE: &str = "\
#[derive(Component)]
pub struct Velocity { dx: f32, dy: f32 }

#[derive(Resource)]
struct Gravity(f32);

fn apply_velocity(mut query: Query<(&mut Position, &Velocity)>) {
    for pair in query.iter_mut() {
        step(pair);
    }
}

fn plain_helper(x: u32) -> u32 { x }
";

    #[test]
    fn claims_only_marked_constructs() {
        let mut session = ParseSession::new();
        let nodes = parse_dialect_raw(Dialect::Ecs, SOURCE, &mut session);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].ty, NodeType::EcsComponent);
        assert_eq!(nodes[0].field("NAME"), Some("Velocity"));
        assert_eq!(nodes[1].ty, NodeType::EcsResource);
        assert_eq!(nodes[1].field("NAME"), Some("Gravity"));
        assert_eq!(nodes[2].ty, NodeType::EcsSystem);
        assert_eq!(nodes[2].field("NAME"), Some("apply_velocity"));
        let body = nodes[2].statements("BODY").unwrap();
        assert_eq!(body[0].ty, NodeType::For);
    }
}
