//! Top-level entry points
//!
//! The contract with every caller: no panic or error ever escapes; the
//! return value is always a best-effort partial result alongside the full
//! diagnostic list. Three failure tiers sit below this surface — recoverable
//! per-construct skips, dialect-parser boundaries, and call-level failures
//! such as an unrecognized explicit dialect tag (recorded, empty result).

use serde::Serialize;

use crate::detect::detect_dialects;
use crate::diagnostics::{ParseError, Position};
use crate::dialect::parse_dialect;
use crate::merge::parse_mixed;
use crate::node::{Dialect, Node};
use crate::session::ParseSession;

/// Result of a single-text parse call.
#[derive(Debug, Serialize)]
pub struct ParseOutcome {
    pub nodes: Vec<Node>,
    pub diagnostics: Vec<ParseError>,
}

/// Parse one text with an explicit dialect tag (`"general"`, `"shader"`,
/// `"ecs"`, `"sim"`) or `"auto"` for fingerprint detection. An unknown tag
/// is recorded and yields an empty node sequence.
pub fn parse_source(text: &str, dialect_tag: &str) -> ParseOutcome {
    let mut session = ParseSession::new();
    let nodes = if dialect_tag == "auto" {
        let detected = detect_dialects(text);
        if detected.len() == 1 {
            parse_dialect(detected[0], text, &mut session)
        } else {
            parse_mixed(&detected, text, &mut session)
        }
    } else {
        match Dialect::from_tag(dialect_tag) {
            Some(dialect) => parse_dialect(dialect, text, &mut session),
            None => {
                session.report_with_suggestion(
                    format!("unrecognized dialect tag `{}`", dialect_tag),
                    Position::start(),
                    "expected one of: auto, general, shader, ecs, sim",
                );
                Vec::new()
            }
        }
    };
    ParseOutcome {
        nodes,
        diagnostics: session.into_diagnostics(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_recorded_not_raised() {
        let outcome = parse_source("fn x() {}", "fortran");
        assert!(outcome.nodes.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0]
            .message
            .contains("unrecognized dialect tag"));
    }

    #[test]
    fn auto_detects_and_parses() {
        let outcome = parse_source("use sim::cells;", "auto");
        assert_eq!(outcome.nodes.len(), 1);
        assert_eq!(outcome.nodes[0].field("PATH"), Some("sim::cells"));
    }
}
