//! Property tests for the total-function guarantees of the engine.

use proptest::prelude::*;

use blockbridge::interchange::{escape_text, read_document, unescape_text, write_document};
use blockbridge::parse_source;
use blockbridge::ParseSession;

proptest! {
    /// Any input parses without panicking, and non-blank input always
    /// produces at least one node.
    #[test]
    fn no_input_is_silently_dropped(text in "[ -~\n]{0,200}") {
        let outcome = parse_source(&text, "general");
        if !text.trim().is_empty() {
            prop_assert!(!outcome.nodes.is_empty());
        } else {
            prop_assert!(outcome.nodes.is_empty());
        }
    }

    /// Detection plus mixed-mode merging is panic-free on arbitrary input.
    #[test]
    fn auto_mode_is_total(text in "[ -~\n]{0,200}") {
        let outcome = parse_source(&text, "auto");
        if text.trim().is_empty() {
            prop_assert!(outcome.nodes.is_empty());
        }
    }

    /// Text escaping is lossless for arbitrary unicode.
    #[test]
    fn escaping_round_trips(text in "\\PC*") {
        prop_assert_eq!(unescape_text(&escape_text(&text)), text);
    }

    /// Whatever tree falls out of a parse survives the interchange format.
    #[test]
    fn parsed_trees_survive_interchange(text in "[ -~\n]{0,200}") {
        let outcome = parse_source(&text, "general");
        let doc = write_document("prop.rs", &outcome.nodes);
        let mut session = ParseSession::new();
        let (name, reloaded) = read_document(&doc, &mut session).unwrap();
        prop_assert_eq!(name, "prop.rs");
        prop_assert_eq!(reloaded.len(), outcome.nodes.len());
        for (a, b) in outcome.nodes.iter().zip(reloaded.iter()) {
            prop_assert!(a.same_shape(b));
        }
    }
}
