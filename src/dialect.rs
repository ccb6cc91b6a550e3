//! Dialect sub-parsers
//!
//! Four parsers share one contract: text in, ordered declarations out, with
//! every problem recorded in the session's diagnostic sink rather than
//! raised. The boundary wrapper [`parse_dialect`] additionally guarantees
//! two things: no panic escapes a sub-parser (it is caught and recorded with
//! a dialect-tagged message), and no non-empty input is silently discarded
//! (zero declarations synthesize exactly one opaque excerpt node).

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::diagnostics::{Position, SourceMap};
use crate::node::{Dialect, Node, NodeType};
use crate::scan;
use crate::session::ParseSession;

pub mod ecs;
pub mod general;
pub mod shader;
pub mod sim;

/// Circuit breaker: top-level declaration extraction per file is soft-capped
/// to keep pathological input bounded.
pub const MAX_TOP_LEVEL_DECLS: usize = 100;

/// Hard cap on the excerpt carried by an opaque fallback node.
pub const OPAQUE_EXCERPT_CHARS: usize = 500;

/// The shared sub-parser contract.
pub trait DialectParser {
    fn dialect(&self) -> Dialect;

    /// Extract ordered declarations; diagnostics go to the session. This is
    /// the raw pass — the no-silent-drop fallback is applied by the caller.
    fn parse_declarations(&self, text: &str, session: &mut ParseSession) -> Vec<Node>;
}

/// The sub-parser for one dialect.
pub fn parser_for(dialect: Dialect) -> &'static dyn DialectParser {
    match dialect {
        Dialect::General => &general::GeneralParser,
        Dialect::Shader => &shader::ShaderParser,
        Dialect::Ecs => &ecs::EcsParser,
        Dialect::Sim => &sim::SimParser,
    }
}

/// Run one sub-parser behind its boundary: panics are caught and recorded
/// with the dialect's name, and the parser contributes no further nodes for
/// the current text. No fallback node is synthesized here; use
/// [`parse_dialect`] for the full single-dialect contract.
pub fn parse_dialect_raw(dialect: Dialect, text: &str, session: &mut ParseSession) -> Vec<Node> {
    let parser = parser_for(dialect);
    let outcome = catch_unwind(AssertUnwindSafe(|| parser.parse_declarations(text, session)));
    match outcome {
        Ok(nodes) => nodes,
        Err(_) => {
            session.report(
                format!("{} parser failed internally; partial output discarded", dialect.tag()),
                Position::start(),
            );
            Vec::new()
        }
    }
}

/// Full single-dialect parse: raw pass plus the no-silent-drop rule.
pub fn parse_dialect(dialect: Dialect, text: &str, session: &mut ParseSession) -> Vec<Node> {
    let nodes = parse_dialect_raw(dialect, text, session);
    if nodes.is_empty() && !text.trim().is_empty() {
        return vec![opaque_excerpt(text, session)];
    }
    nodes
}

/// Build the opaque fallback node: a bounded excerpt of the original text so
/// input is never silently discarded.
pub fn opaque_excerpt(text: &str, session: &mut ParseSession) -> Node {
    let trimmed = text.trim();
    let mut excerpt: String = trimmed.chars().take(OPAQUE_EXCERPT_CHARS).collect();
    if trimmed.chars().count() > OPAQUE_EXCERPT_CHARS {
        excerpt.push('…');
    }
    Node::new(session.fresh_id(), NodeType::Opaque).with_field("TEXT", excerpt)
}

// ---------------------------------------------------------------------------
// Shared declaration-scanning helpers
// ---------------------------------------------------------------------------

/// A parsed `fn` signature with byte ranges into the scanned text.
pub(crate) struct FnSig {
    pub name: String,
    pub params: std::ops::Range<usize>,
    pub ret: Option<String>,
    pub body: Option<std::ops::Range<usize>>,
    /// Index just past the declaration (closing brace or semicolon).
    pub end: usize,
}

/// Parse `fn name[<generics>](params) [-> ret] [where ..] { body }` (or a
/// trailing `;` for body-less signatures) starting at the `fn` keyword.
pub(crate) fn fn_signature(text: &str, at: usize) -> Option<FnSig> {
    if !scan::keyword_at(text, at, "fn") {
        return None;
    }
    let mut pos = scan::skip_trivia(text, at + 2);
    let (name, after_name) = scan::ident_at(text, pos)?;
    pos = scan::skip_trivia(text, after_name);
    if text[pos..].starts_with('<') {
        let generics = scan::balanced_span(text, pos)?;
        pos = scan::skip_trivia(text, generics.end + 1);
    }
    if !text[pos..].starts_with('(') {
        return None;
    }
    let params = scan::balanced_span(text, pos)?;
    pos = scan::skip_trivia(text, params.end + 1);

    // Header runs to the body brace or a terminating semicolon.
    let rest = &text[pos..];
    let brace_rel = scan::find_at_depth_zero(rest, '{');
    let semi_rel = scan::find_at_depth_zero(rest, ';');
    let (header_end, has_body) = match (brace_rel, semi_rel) {
        (Some(b), Some(s)) if s < b => (pos + s, false),
        (Some(b), _) => (pos + b, true),
        (None, Some(s)) => (pos + s, false),
        (None, None) => return None,
    };
    let header = &text[pos..header_end];
    let ret = header.find("->").map(|arrow| {
        let after = &header[arrow + 2..];
        let stop = scan::find_token_at_depth_zero(after, "where").unwrap_or(after.len());
        after[..stop].trim().to_string()
    });

    if has_body {
        let body = scan::balanced_span(text, header_end)?;
        let end = body.end + 1;
        Some(FnSig {
            name: name.to_string(),
            params,
            ret,
            body: Some(body),
            end,
        })
    } else {
        Some(FnSig {
            name: name.to_string(),
            params,
            ret,
            body: None,
            end: header_end + 1,
        })
    }
}

/// Collect `#[..]` attributes at `at`, returning their raw texts and the
/// index past the last one.
pub(crate) fn collect_attributes(text: &str, at: usize) -> (Vec<String>, usize) {
    let mut attrs = Vec::new();
    let mut pos = scan::skip_trivia(text, at);
    while text[pos..].starts_with("#[") || text[pos..].starts_with("#![") {
        let bracket = pos + text[pos..].find('[').unwrap_or(0);
        match scan::balanced_span(text, bracket) {
            Some(inner) => {
                attrs.push(text[inner.clone()].to_string());
                pos = scan::skip_trivia(text, inner.end + 1);
            }
            None => break,
        }
    }
    (attrs, pos)
}

/// Skip a `pub` / `pub(..)` visibility prefix.
pub(crate) fn skip_visibility(text: &str, at: usize) -> usize {
    let mut pos = scan::skip_trivia(text, at);
    if scan::keyword_at(text, pos, "pub") {
        pos = scan::skip_trivia(text, pos + 3);
        if text[pos..].starts_with('(') {
            if let Some(inner) = scan::balanced_span(text, pos) {
                pos = scan::skip_trivia(text, inner.end + 1);
            }
        }
    }
    pos
}

/// Advance past one unrecognized top-level construct: to just past the next
/// top-level semicolon, or past the next balanced brace block, whichever
/// comes first; the end of the text if neither exists.
pub(crate) fn skip_construct(text: &str, at: usize) -> usize {
    let rest = &text[at..];
    let semi = scan::find_at_depth_zero(rest, ';');
    let brace = scan::find_at_depth_zero(rest, '{');
    match (semi, brace) {
        (Some(s), Some(b)) if s < b => at + s + 1,
        (_, Some(b)) => match scan::balanced_span(text, at + b) {
            Some(inner) => inner.end + 1,
            None => text.len(),
        },
        (Some(s), None) => at + s + 1,
        (None, None) => text.len(),
    }
}

/// Record the soft-truncation diagnostic for the declaration circuit breaker.
pub(crate) fn report_truncation(
    dialect: Dialect,
    map: &SourceMap,
    at: usize,
    session: &mut ParseSession,
) {
    session.report_with_suggestion(
        format!(
            "{} parse truncated after {} top-level declarations",
            dialect.tag(),
            MAX_TOP_LEVEL_DECLS
        ),
        map.position(at),
        "split the file to import the remaining declarations",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_signature_shapes() {
        let text = "fn add(a: i32, b: i32) -> i32 { a + b }";
        let sig = fn_signature(text, 0).unwrap();
        assert_eq!(sig.name, "add");
        assert_eq!(&text[sig.params.clone()], "a: i32, b: i32");
        assert_eq!(sig.ret.as_deref(), Some("i32"));
        assert!(sig.body.is_some());

        let text = "fn describe<T: Into<String>>(value: T) -> String where T: Clone { todo() }";
        let sig = fn_signature(text, 0).unwrap();
        assert_eq!(sig.name, "describe");
        assert_eq!(sig.ret.as_deref(), Some("String"));

        let sig = fn_signature("fn hook(x: u8);", 0).unwrap();
        assert!(sig.body.is_none());
        assert_eq!(sig.end, 15);
    }

    #[test]
    fn opaque_excerpt_is_bounded() {
        let mut session = ParseSession::new();
        let long = "x".repeat(OPAQUE_EXCERPT_CHARS + 50);
        let node = opaque_excerpt(&long, &mut session);
        let text = node.field("TEXT").unwrap();
        assert_eq!(text.chars().count(), OPAQUE_EXCERPT_CHARS + 1);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn attributes_and_visibility() {
        let text = "#[derive(Component)]\npub struct Position;";
        let (attrs, pos) = collect_attributes(text, 0);
        assert_eq!(attrs, vec!["derive(Component)".to_string()]);
        let pos = skip_visibility(text, pos);
        assert!(text[pos..].starts_with("struct"));
    }

    #[test]
    fn skip_construct_boundaries() {
        let text = "weird tokens; next";
        assert_eq!(skip_construct(text, 0), 13);
        let text = "trait T { fn x(); } next";
        assert_eq!(&text[skip_construct(text, 0)..], " next");
    }
}
