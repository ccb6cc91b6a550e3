//! Mode detection
//!
//! A pure lexical-fingerprint scan: each dialect has a table of substrings
//! whose presence marks the blob as containing that dialect. The scan is
//! order-independent and never consults structure; general-purpose is the
//! fallback when nothing matches. More than one detected dialect means the
//! caller must treat the blob as mixed.

use crate::node::Dialect;

/// Fingerprints per dialect, most specific dialect first. The shader entries
/// are the attributes a compute module cannot do without.
const FINGERPRINTS: &[(Dialect, &[&str])] = &[
    (
        Dialect::Sim,
        &[
            "genome!",
            "spawn_cell",
            "set_mode",
            "make_adhesion",
            "cell_divide",
            "split_interval",
        ],
    ),
    (
        Dialect::Ecs,
        &[
            "Query<",
            "Commands",
            "Res<",
            "ResMut<",
            "EventReader<",
            "EventWriter<",
            "derive(Component",
            "derive(Resource",
        ],
    ),
    (
        Dialect::Shader,
        &[
            "@compute",
            "@workgroup_size",
            "@vertex",
            "@fragment",
            "@group(",
            "@binding(",
            "var<storage",
            "var<uniform",
        ],
    ),
    (
        Dialect::General,
        &["fn ", "use ", "struct ", "impl ", "let ", "const "],
    ),
];

/// The set of dialects whose fingerprints appear in `text`, in priority
/// order. Empty input, or input matching nothing, yields `[General]`.
pub fn detect_dialects(text: &str) -> Vec<Dialect> {
    let mut found: Vec<Dialect> = FINGERPRINTS
        .iter()
        .filter(|(_, marks)| marks.iter().any(|m| text.contains(m)))
        .map(|(dialect, _)| *dialect)
        .collect();
    if found.is_empty() {
        found.push(Dialect::General);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_general() {
        assert_eq!(detect_dialects(""), vec![Dialect::General]);
        assert_eq!(detect_dialects("just a comment"), vec![Dialect::General]);
    }

    #[test]
    fn shader_fingerprints() {
        let detected = detect_dialects("@compute @workgroup_size(64) fn main() {}");
        assert!(detected.contains(&Dialect::Shader));
        // WGSL text also trips the general `fn ` fingerprint; the merger
        // resolves the overlap.
        assert_eq!(detected.last(), Some(&Dialect::General));
    }

    #[test]
    fn mixed_blob_detects_both() {
        let blob = "fn helper() {}\n@fragment\nfn shade() {}";
        let detected = detect_dialects(blob);
        assert_eq!(detected, vec![Dialect::Shader, Dialect::General]);
    }

    #[test]
    fn detection_is_pure_and_order_independent() {
        let a = "spawn_cell(0); Query<&Cell>";
        let b = "Query<&Cell>; spawn_cell(0)";
        assert_eq!(detect_dialects(a), detect_dialects(b));
        assert_eq!(detect_dialects(a), vec![Dialect::Sim, Dialect::Ecs]);
    }
}
