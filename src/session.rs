//! Per-call parse session state
//!
//! A `ParseSession` is created once per top-level entry point (single parse
//! or whole batch) and threaded by `&mut` into every sub-parser invocation.
//! It owns the only two pieces of mutable shared state in the engine: the
//! node id counter and the diagnostic sink. Because the session is a plain
//! value with no global backing, interleaved sessions can never observe each
//! other's counters.

use crate::diagnostics::{DiagnosticSink, ParseError, Position};

/// Mutable state for one top-level parse call.
///
/// Node ids are opaque strings from a monotonically increasing counter; they
/// are unique within the session (and therefore across all files of one
/// batch) and are never reused. Ids from different sessions must not be
/// compared.
#[derive(Debug, Default)]
pub struct ParseSession {
    next_id: u64,
    pub diagnostics: DiagnosticSink,
}

impl ParseSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next node id.
    pub fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("n{}", self.next_id)
    }

    /// Record a diagnostic at the given position.
    pub fn report(&mut self, message: impl Into<String>, position: Position) {
        self.diagnostics.push(ParseError::new(message, position));
    }

    /// Record a diagnostic carrying a suggestion.
    pub fn report_with_suggestion(
        &mut self,
        message: impl Into<String>,
        position: Position,
        suggestion: impl Into<String>,
    ) {
        self.diagnostics
            .push(ParseError::new(message, position).with_suggestion(suggestion));
    }

    pub fn into_diagnostics(self) -> Vec<ParseError> {
        self.diagnostics.into_vec()
    }
}
