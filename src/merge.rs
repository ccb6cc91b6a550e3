//! Mixed-mode merging
//!
//! When a blob fingerprints as more than one dialect, each relevant
//! sub-parser runs over the whole text and the per-dialect results are
//! merged: parsers run in specificity-descending priority order, and a node
//! from a lower-priority parser is discarded when a higher-priority parser
//! already produced a node with the same structural signature — merge class
//! plus primary identifying field. Nodes without a signature (opaque
//! content) never deduplicate.
//!
//! The merge itself is a pure function of the per-parser outputs:
//! deterministic, idempotent, ordered by parser priority and then by
//! discovery order within a parser.

use std::collections::HashSet;

use crate::dialect::{opaque_excerpt, parse_dialect_raw};
use crate::node::{Dialect, Node, NodeType};
use crate::session::ParseSession;

/// The ordered output of one sub-parser over a shared blob.
#[derive(Debug)]
pub struct DialectParse {
    pub dialect: Dialect,
    pub nodes: Vec<Node>,
}

/// Merge per-dialect parses of one blob into a single ordered sequence.
pub fn merge_parses(mut parses: Vec<DialectParse>) -> Vec<Node> {
    parses.sort_by_key(|p| p.dialect.priority());
    let mut seen: HashSet<(&'static str, String)> = HashSet::new();
    let mut merged = Vec::new();
    for parse in parses {
        for node in parse.nodes {
            let signature = node
                .ty
                .merge_class()
                .zip(node.primary_name().map(str::to_string));
            if let Some(signature) = signature {
                if !seen.insert(signature) {
                    continue;
                }
            }
            merged.push(node);
        }
    }
    merged
}

/// Parse a blob as a mix of the given dialects and merge the results.
///
/// Opaque chunks carry a twist here: text one parser could not read is
/// usually exactly what another parser did read, so as long as any parser
/// produced a real node, per-parser opaque chunks are stripped before
/// merging. The no-silent-drop rule then applies to the merged sequence as
/// a whole.
pub fn parse_mixed(dialects: &[Dialect], text: &str, session: &mut ParseSession) -> Vec<Node> {
    let mut parses: Vec<DialectParse> = dialects
        .iter()
        .map(|dialect| DialectParse {
            dialect: *dialect,
            nodes: parse_dialect_raw(*dialect, text, session),
        })
        .collect();
    let any_recognized = parses
        .iter()
        .flat_map(|p| p.nodes.iter())
        .any(|n| n.ty != NodeType::Opaque);
    if any_recognized {
        for parse in &mut parses {
            parse.nodes.retain(|n| n.ty != NodeType::Opaque);
        }
    }
    let merged = merge_parses(parses);
    if merged.is_empty() && !text.trim().is_empty() {
        return vec![opaque_excerpt(text, session)];
    }
    merged
}
