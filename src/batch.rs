//! Multi-file orchestration and cross-file reference extraction
//!
//! Batches run strictly sequentially in caller-supplied order on one shared
//! session, so node ids are unique across every file of the batch. Dialect
//! choice per file comes from filename heuristics first — extension, then
//! stem substring hints — so a file's target dialect does not depend on
//! content quirks; only hint-less files fall back to content detection.
//!
//! After the per-file pass, a second, strictly read-only pass walks every
//! tree depth-first and records a `CrossFileReference` for each
//! reference-bearing node: import declarations and shader-handle
//! expressions. The reference list is recomputed fully on every batch run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::detect::detect_dialects;
use crate::diagnostics::ParseError;
use crate::dialect::parse_dialect;
use crate::merge::parse_mixed;
use crate::node::{Dialect, Node, NodeType};
use crate::session::ParseSession;

/// `include_str!("….wgsl")` — the one expression shape treated as a shader
/// handle, matching how host code embeds its kernels.
static SHADER_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"include_str!\s*\(\s*"([^"]+\.wgsl)"\s*\)"#).unwrap());

/// Filename stem hints checked when the extension alone is not decisive.
const ECS_HINTS: &[&str] = &["ecs", "system", "component"];
const SIM_HINTS: &[&str] = &["genome", "sim", "cell"];

/// One named input of a batch.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// The parse of one batch entry.
#[derive(Debug, Serialize)]
pub struct FileParseResult {
    pub file_name: String,
    pub dialect: Dialect,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Import,
    ShaderHandle,
}

/// A detected symbolic dependency from one file to a named path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossFileReference {
    pub source_file: String,
    pub target_path: String,
    pub kind: ReferenceKind,
}

/// Everything a batch caller receives: per-file trees, the reference edges,
/// and the full diagnostic list.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub files: Vec<FileParseResult>,
    pub references: Vec<CrossFileReference>,
    pub diagnostics: Vec<ParseError>,
}

/// Dialect inferred from the filename alone; `None` means fall back to
/// content detection.
pub fn infer_dialect(file_name: &str) -> Option<Dialect> {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".wgsl") {
        return Some(Dialect::Shader);
    }
    if lower.ends_with(".rs") {
        let stem = lower.rsplit('/').next().unwrap_or(&lower);
        if ECS_HINTS.iter().any(|h| stem.contains(h)) {
            return Some(Dialect::Ecs);
        }
        if SIM_HINTS.iter().any(|h| stem.contains(h)) {
            return Some(Dialect::Sim);
        }
        return Some(Dialect::General);
    }
    None
}

/// The dialect set a file is parsed with. The extension dialects are parsed
/// together with the general dialect they extend, so base-dialect
/// declarations in a hinted file are still covered.
fn dialects_for(file: &SourceFile) -> Vec<Dialect> {
    match infer_dialect(&file.name) {
        Some(Dialect::Shader) => vec![Dialect::Shader],
        Some(Dialect::Ecs) => vec![Dialect::Ecs, Dialect::General],
        Some(Dialect::Sim) => vec![Dialect::Sim, Dialect::General],
        Some(Dialect::General) => vec![Dialect::General],
        None => detect_dialects(&file.text),
    }
}

/// Parse a named collection of files on one session and extract cross-file
/// references.
pub fn parse_batch(files: &[SourceFile]) -> BatchOutcome {
    let mut session = ParseSession::new();
    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let dialects = dialects_for(file);
        let nodes = if dialects.len() == 1 {
            parse_dialect(dialects[0], &file.text, &mut session)
        } else {
            parse_mixed(&dialects, &file.text, &mut session)
        };
        results.push(FileParseResult {
            file_name: file.name.clone(),
            dialect: dialects[0],
            nodes,
        });
    }
    let references = collect_references(&results);
    BatchOutcome {
        files: results,
        references,
        diagnostics: session.into_diagnostics(),
    }
}

/// The read-only cross-reference pass. Walks value slots then statement
/// slots depth-first; never mutates a node.
pub fn collect_references(files: &[FileParseResult]) -> Vec<CrossFileReference> {
    let mut references = Vec::new();
    for file in files {
        for node in &file.nodes {
            visit(&file.file_name, node, &mut references);
        }
    }
    references.dedup();
    references
}

fn visit(source_file: &str, node: &Node, out: &mut Vec<CrossFileReference>) {
    if node.ty == NodeType::Use {
        if let Some(path) = node.field("PATH") {
            out.push(CrossFileReference {
                source_file: source_file.to_string(),
                target_path: path.to_string(),
                kind: ReferenceKind::Import,
            });
        }
    }
    for (_, value) in &node.fields {
        for caps in SHADER_HANDLE.captures_iter(value) {
            out.push(CrossFileReference {
                source_file: source_file.to_string(),
                target_path: caps[1].to_string(),
                kind: ReferenceKind::ShaderHandle,
            });
        }
    }
    for (_, child) in &node.value_slots {
        visit(source_file, child, out);
    }
    for (_, children) in &node.statement_slots {
        for child in children {
            visit(source_file, child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_heuristics() {
        assert_eq!(infer_dialect("kernels/update.wgsl"), Some(Dialect::Shader));
        assert_eq!(infer_dialect("movement_system.rs"), Some(Dialect::Ecs));
        assert_eq!(infer_dialect("genome_rules.rs"), Some(Dialect::Sim));
        assert_eq!(infer_dialect("util.rs"), Some(Dialect::General));
        assert_eq!(infer_dialect("notes.txt"), None);
    }

    #[test]
    fn batch_ids_do_not_collide_across_files() {
        let files = [
            SourceFile::new("a.rs", "fn one() {}"),
            SourceFile::new("b.rs", "fn two() {}"),
        ];
        let outcome = parse_batch(&files);
        let id_a = &outcome.files[0].nodes[0].id;
        let id_b = &outcome.files[1].nodes[0].id;
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn shader_handle_reference() {
        let files = [SourceFile::new(
            "loader.rs",
            r#"const KERNEL: &str = include_str!("kernels/update.wgsl");"#,
        )];
        let outcome = parse_batch(&files);
        assert_eq!(outcome.references.len(), 1);
        assert_eq!(outcome.references[0].kind, ReferenceKind::ShaderHandle);
        assert_eq!(outcome.references[0].target_path, "kernels/update.wgsl");
    }
}
