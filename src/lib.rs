//! # blockbridge
//!
//! Source-to-node-tree conversion engine for the blockbridge visual block
//! editor. Raw source text is converted back into an editable node tree
//! whenever code is imported or pasted, so generated code can round-trip
//! through the visual canvas.
//!
//! The pipeline runs one direction:
//!
//! ```text
//! text -> mode detection -> dialect sub-parser(s) -> mixed-mode merge
//!      -> node tree + diagnostics -> interchange document
//! ```
//!
//! Four dialects are recognized by lexical heuristics alone: the
//! general-purpose systems dialect, the GPU-shader dialect, the
//! entity-component extension, and the domain-simulation extension.
//! Unrecognized constructs degrade into bounded opaque nodes — input is
//! never silently discarded, and no error escapes a top-level entry point.
//!
//! Entry points: [`parse_source`] for one text, [`batch::parse_batch`] for a
//! named collection with cross-file reference extraction, and
//! [`interchange`] for the portable document format the external editor
//! loads.

pub mod api;
pub mod batch;
pub mod decompose;
pub mod detect;
pub mod diagnostics;
pub mod dialect;
pub mod interchange;
pub mod merge;
pub mod node;
pub mod scan;
pub mod session;

pub use api::{parse_source, ParseOutcome};
pub use batch::{
    parse_batch, BatchOutcome, CrossFileReference, FileParseResult, ReferenceKind, SourceFile,
};
pub use diagnostics::ParseError;
pub use node::{Dialect, Node, NodeType};
pub use session::ParseSession;
