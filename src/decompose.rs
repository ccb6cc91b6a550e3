//! Statement decomposition
//!
//! Bodies are consumed left to right by a cursor with a fixed, priority-ordered
//! table of construct matchers: conditional, pre-condition loop,
//! iterator-driven loop, unconditional loop, variable binding, explicit
//! return, then a generic expression statement terminated by the next
//! top-level semicolon. Each matcher returns either `(characters consumed,
//! node)` or no match, and recurses into its own nested body through the
//! delimiter balancer.
//!
//! Edge cases handled here:
//! - a trailing expression with no semicolon before the scope ends becomes an
//!   implicit-return node and decomposition stops;
//! - a keyword whose expected shape fails still advances the cursor to the
//!   next top-level semicolon or the scope end, so a body that cannot be
//!   decomposed yields zero statements, never an infinite loop.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::SourceMap;
use crate::node::{Node, NodeType};
use crate::scan;
use crate::session::ParseSession;

/// Nesting depth past which bodies are captured as a single expression
/// instead of recursing further.
const MAX_BODY_DEPTH: usize = 32;

/// Shape of a `let` binding: optional `mut`, name, optional type ascription,
/// optional initializer.
static LET_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^let\s+(mut\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*(?::\s*([^=]+?))?\s*(?:=\s*(.+))?$")
        .unwrap()
});

/// One matcher per statement construct, tried in table order at the cursor.
type Matcher = fn(&Decomposer<'_>, usize, &mut ParseSession) -> Option<(usize, Node)>;

const MATCHERS: &[(&str, Matcher)] = &[
    ("if", match_if),
    ("while", match_while),
    ("for", match_for),
    ("loop", match_loop),
    ("let", match_let),
    ("return", match_return),
];

/// Cursor context for one body. `base` is the body's byte offset in the
/// original text so diagnostics carry real file positions.
pub struct Decomposer<'a> {
    body: &'a str,
    base: usize,
    map: &'a SourceMap,
    depth: usize,
}

impl<'a> Decomposer<'a> {
    pub fn new(body: &'a str, base: usize, map: &'a SourceMap) -> Self {
        Self {
            body,
            base,
            map,
            depth: 0,
        }
    }

    fn nested(&self, range: std::ops::Range<usize>) -> Decomposer<'a> {
        Decomposer {
            body: &self.body[range.clone()],
            base: self.base + range.start,
            map: self.map,
            depth: self.depth + 1,
        }
    }

    fn report(&self, session: &mut ParseSession, at: usize, message: impl Into<String>) {
        session.report(message, self.map.position(self.base + at));
    }

    /// Decompose the whole body into an ordered statement sequence.
    pub fn run(&self, session: &mut ParseSession) -> Vec<Node> {
        let mut out = Vec::new();
        let mut pos = scan::skip_trivia(self.body, 0);
        while pos < self.body.len() {
            let mut advanced = None;
            for (kw, matcher) in MATCHERS {
                if !scan::keyword_at(self.body, pos, kw) {
                    continue;
                }
                match matcher(self, pos, session) {
                    Some((consumed, node)) => {
                        out.push(node);
                        advanced = Some(pos + consumed);
                    }
                    None => {
                        // Partial keyword match with a broken shape: skip to
                        // the next statement boundary to guarantee progress.
                        self.report(
                            session,
                            pos,
                            format!("malformed `{}` statement, skipping", kw),
                        );
                        advanced = Some(self.recover(pos));
                    }
                }
                break;
            }
            if let Some(next) = advanced {
                pos = scan::skip_trivia(self.body, next.max(pos + 1));
                continue;
            }
            // Generic expression statement, or trailing expression-as-value.
            match scan::find_at_depth_zero(&self.body[pos..], ';') {
                Some(rel) => {
                    let text = self.body[pos..pos + rel].trim();
                    if !text.is_empty() {
                        let value = expression(session, text);
                        out.push(
                            Node::new(session.fresh_id(), NodeType::ExpressionStatement)
                                .with_value("VALUE", value),
                        );
                    }
                    pos = scan::skip_trivia(self.body, pos + rel + 1);
                }
                None => {
                    let text = self.body[pos..].trim();
                    if !text.is_empty() {
                        let value = expression(session, text);
                        out.push(
                            Node::new(session.fresh_id(), NodeType::ImplicitReturn)
                                .with_value("VALUE", value),
                        );
                    }
                    break;
                }
            }
        }
        out
    }

    /// Advance past the current broken construct: next top-level semicolon
    /// if one remains, otherwise the end of the body.
    fn recover(&self, pos: usize) -> usize {
        match scan::find_at_depth_zero(&self.body[pos..], ';') {
            Some(rel) => pos + rel + 1,
            None => self.body.len(),
        }
    }

    /// Decompose a nested body range, capping recursion depth.
    fn statements_in(
        &self,
        range: std::ops::Range<usize>,
        session: &mut ParseSession,
    ) -> Vec<Node> {
        if self.depth >= MAX_BODY_DEPTH {
            let text = self.body[range].trim();
            if text.is_empty() {
                return Vec::new();
            }
            let value = expression(session, text);
            return vec![
                Node::new(session.fresh_id(), NodeType::ExpressionStatement)
                    .with_value("VALUE", value),
            ];
        }
        self.nested(range).run(session)
    }
}

/// Decompose a body slice of `text` starting at byte `base`.
pub fn decompose_body(
    body: &str,
    base: usize,
    map: &SourceMap,
    session: &mut ParseSession,
) -> Vec<Node> {
    Decomposer::new(body, base, map).run(session)
}

/// Build the expression capture node used by every value slot.
pub fn expression(session: &mut ParseSession, text: &str) -> Node {
    Node::new(session.fresh_id(), NodeType::Expression).with_field("TEXT", text.trim())
}

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

fn match_if(d: &Decomposer<'_>, pos: usize, session: &mut ParseSession) -> Option<(usize, Node)> {
    let header_start = scan::skip_trivia(d.body, pos + 2);
    let brace_rel = scan::find_at_depth_zero(&d.body[header_start..], '{')?;
    let brace = header_start + brace_rel;
    let condition = d.body[header_start..brace].trim();
    if condition.is_empty() {
        return None;
    }
    let then_range = match scan::balanced_span(d.body, brace) {
        Some(range) => range,
        None => {
            d.report(session, brace, "unclosed `{` in `if` body");
            return None;
        }
    };
    let mut end = then_range.end + 1;
    let condition = expression(session, condition);
    let then_stmts = d.statements_in(then_range, session);

    // Optional else / else-if tail.
    let mut else_stmts = Vec::new();
    let after = scan::skip_trivia(d.body, end);
    if scan::keyword_at(d.body, after, "else") {
        let branch = scan::skip_trivia(d.body, after + 4);
        if scan::keyword_at(d.body, branch, "if") {
            if let Some((consumed, nested_if)) = match_if(d, branch, session) {
                else_stmts.push(nested_if);
                end = branch + consumed;
            } else {
                d.report(session, branch, "malformed `else if` branch, skipping");
                end = after + 4;
            }
        } else if d.body[branch..].starts_with('{') {
            match scan::balanced_span(d.body, branch) {
                Some(range) => {
                    end = range.end + 1;
                    else_stmts = d.statements_in(range, session);
                }
                None => {
                    d.report(session, branch, "unclosed `{` in `else` body");
                    end = after + 4;
                }
            }
        } else {
            d.report(session, branch, "expected `{` or `if` after `else`");
            end = after + 4;
        }
    }

    let node = Node::new(session.fresh_id(), NodeType::If)
        .with_value("CONDITION", condition)
        .with_statements("THEN", then_stmts)
        .with_statements("ELSE", else_stmts);
    Some((end - pos, node))
}

fn match_while(
    d: &Decomposer<'_>,
    pos: usize,
    session: &mut ParseSession,
) -> Option<(usize, Node)> {
    let header_start = scan::skip_trivia(d.body, pos + 5);
    let brace_rel = scan::find_at_depth_zero(&d.body[header_start..], '{')?;
    let brace = header_start + brace_rel;
    let condition = d.body[header_start..brace].trim();
    if condition.is_empty() {
        return None;
    }
    let body_range = match scan::balanced_span(d.body, brace) {
        Some(range) => range,
        None => {
            d.report(session, brace, "unclosed `{` in `while` body");
            return None;
        }
    };
    let end = body_range.end + 1;
    let condition = expression(session, condition);
    let stmts = d.statements_in(body_range, session);
    let node = Node::new(session.fresh_id(), NodeType::While)
        .with_value("CONDITION", condition)
        .with_statements("BODY", stmts);
    Some((end - pos, node))
}

fn match_for(d: &Decomposer<'_>, pos: usize, session: &mut ParseSession) -> Option<(usize, Node)> {
    let header_start = scan::skip_trivia(d.body, pos + 3);
    let brace_rel = scan::find_at_depth_zero(&d.body[header_start..], '{')?;
    let brace = header_start + brace_rel;
    let header = &d.body[header_start..brace];
    let in_rel = scan::find_token_at_depth_zero(header, "in")?;
    let var = header[..in_rel].trim();
    let iter = header[in_rel + 2..].trim();
    if var.is_empty() || iter.is_empty() {
        return None;
    }
    let body_range = match scan::balanced_span(d.body, brace) {
        Some(range) => range,
        None => {
            d.report(session, brace, "unclosed `{` in `for` body");
            return None;
        }
    };
    let end = body_range.end + 1;
    let iter = expression(session, iter);
    let stmts = d.statements_in(body_range, session);
    let node = Node::new(session.fresh_id(), NodeType::For)
        .with_field("VAR", var)
        .with_value("ITER", iter)
        .with_statements("BODY", stmts);
    Some((end - pos, node))
}

fn match_loop(d: &Decomposer<'_>, pos: usize, session: &mut ParseSession) -> Option<(usize, Node)> {
    let brace = scan::skip_trivia(d.body, pos + 4);
    if !d.body[brace..].starts_with('{') {
        return None;
    }
    let body_range = match scan::balanced_span(d.body, brace) {
        Some(range) => range,
        None => {
            d.report(session, brace, "unclosed `{` in `loop` body");
            return None;
        }
    };
    let end = body_range.end + 1;
    let stmts = d.statements_in(body_range, session);
    let node = Node::new(session.fresh_id(), NodeType::Loop).with_statements("BODY", stmts);
    Some((end - pos, node))
}

fn match_let(d: &Decomposer<'_>, pos: usize, session: &mut ParseSession) -> Option<(usize, Node)> {
    let semi_rel = scan::find_at_depth_zero(&d.body[pos..], ';')?;
    let stmt = d.body[pos..pos + semi_rel].trim_end();
    let caps = LET_SHAPE.captures(stmt)?;
    let mut node = Node::new(session.fresh_id(), NodeType::Let)
        .with_field("NAME", caps.get(2).map_or("", |m| m.as_str()));
    if caps.get(1).is_some() {
        node = node.with_field("MUTABLE", "true");
    }
    if let Some(ty) = caps.get(3) {
        node = node.with_field("TYPE", ty.as_str().trim());
    }
    if let Some(init) = caps.get(4) {
        let value = expression(session, init.as_str());
        node = node.with_value("VALUE", value);
    }
    Some((semi_rel + 1, node))
}

fn match_return(
    d: &Decomposer<'_>,
    pos: usize,
    session: &mut ParseSession,
) -> Option<(usize, Node)> {
    let expr_start = pos + 6;
    // `return` may appear in tail position without a semicolon.
    let (expr_end, consumed) = match scan::find_at_depth_zero(&d.body[pos..], ';') {
        Some(rel) => (pos + rel, rel + 1),
        None => (d.body.len(), d.body.len() - pos),
    };
    let mut node = Node::new(session.fresh_id(), NodeType::Return);
    let text = d.body[expr_start.min(expr_end)..expr_end].trim();
    if !text.is_empty() {
        let value = expression(session, text);
        node = node.with_value("VALUE", value);
    }
    Some((consumed, node))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decompose(body: &str) -> (Vec<Node>, ParseSession) {
        let map = SourceMap::new(body);
        let mut session = ParseSession::new();
        let nodes = decompose_body(body, 0, &map, &mut session);
        (nodes, session)
    }

    #[test]
    fn return_statement() {
        let (nodes, _) = decompose("return a + b;");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].ty, NodeType::Return);
        assert_eq!(
            nodes[0].value("VALUE").unwrap().field("TEXT"),
            Some("a + b")
        );
    }

    #[test]
    fn implicit_return_for_trailing_expression() {
        let (nodes, _) = decompose("let x = 1;\nx * 2");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].ty, NodeType::Let);
        assert_eq!(nodes[1].ty, NodeType::ImplicitReturn);
        assert_eq!(nodes[1].value("VALUE").unwrap().field("TEXT"), Some("x * 2"));
    }

    #[test]
    fn if_else_chain() {
        let (nodes, _) = decompose("if a { b(); } else if c { d(); } else { e(); }");
        assert_eq!(nodes.len(), 1);
        let outer = &nodes[0];
        assert_eq!(outer.ty, NodeType::If);
        assert_eq!(outer.statements("THEN").unwrap().len(), 1);
        let else_branch = outer.statements("ELSE").unwrap();
        assert_eq!(else_branch.len(), 1);
        assert_eq!(else_branch[0].ty, NodeType::If);
        assert!(else_branch[0].statements("ELSE").is_some());
    }

    #[test]
    fn loops() {
        let (nodes, _) = decompose(
            "while x < 10 { x += 1; }\nfor item in items { use_item(item); }\nloop { break; }",
        );
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].ty, NodeType::While);
        assert_eq!(nodes[1].ty, NodeType::For);
        assert_eq!(nodes[1].field("VAR"), Some("item"));
        assert_eq!(
            nodes[1].value("ITER").unwrap().field("TEXT"),
            Some("items")
        );
        assert_eq!(nodes[2].ty, NodeType::Loop);
    }

    #[test]
    fn let_shapes() {
        let (nodes, _) = decompose("let mut total: f32 = 0.0;\nlet name;");
        assert_eq!(nodes[0].field("NAME"), Some("total"));
        assert_eq!(nodes[0].field("MUTABLE"), Some("true"));
        assert_eq!(nodes[0].field("TYPE"), Some("f32"));
        assert_eq!(nodes[1].field("NAME"), Some("name"));
        assert!(nodes[1].value("VALUE").is_none());
    }

    #[test]
    fn broken_shape_still_advances() {
        // `if` with no body cannot match, but the cursor must move on.
        let (nodes, session) = decompose("if broken; call();");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].ty, NodeType::ExpressionStatement);
        assert!(!session.diagnostics.is_empty());
    }

    #[test]
    fn hopeless_body_yields_zero_statements() {
        let (nodes, _) = decompose("   \n\t  ");
        assert!(nodes.is_empty());
    }
}
