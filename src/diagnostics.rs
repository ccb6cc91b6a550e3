//! Diagnostics for the conversion engine
//!
//! All parsing stages share one append-only diagnostic sink. Errors are
//! recorded with a 1-based line:column position, an optional suggestion for
//! the editor to surface, and a timestamp. Nothing in this module ever fails:
//! pushing a diagnostic always succeeds and entries are never removed within
//! a session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A single recoverable parse diagnostic.
///
/// The error-display component of the editor consumes this list verbatim, so
/// the shape is a contract surface: message, position, optional suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            line: position.line,
            column: position.column,
            suggestion: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Append-only sink shared by every parsing stage of one session.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    errors: Vec<ParseError>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn as_slice(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

/// A 1-based line:column position in the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Position of the start of the text; used for call-level diagnostics
    /// that have no more precise anchor.
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// Byte-offset to line:column conversion table.
///
/// Line starts are precomputed once so each conversion is a binary search,
/// keeping position lookups cheap even when a body records many diagnostics.
#[derive(Debug)]
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset into a 1-based line:column position.
    ///
    /// Offsets past the end of the text clamp to the final line.
    pub fn position(&self, byte_offset: usize) -> Position {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(exact) => exact,
            Err(insertion) => insertion - 1,
        };
        Position {
            line: line_idx + 1,
            column: byte_offset - self.line_starts[line_idx] + 1,
        }
    }
}
