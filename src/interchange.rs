//! Portable interchange format
//!
//! The only artifact exchanged with the external visual editor's loader: a
//! Blockly-style markup document whose root wraps a synthetic
//! `file_container` block carrying the filename and a single statement-slot
//! chain of the parsed top-level declarations. Sibling sequences render as
//! `<next>`-nested chains (a linked list, not a flat list) so the external
//! deserializer can reconstruct sequential connections.
//!
//! [`writer`] is a pure function of the node sequence; [`reader`] is the
//! in-crate counterpart used to verify lossless reload.

pub mod reader;
pub mod writer;

pub use reader::{read_document, InterchangeError};
pub use writer::write_document;

/// Escape the five reserved markup characters.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_text`]. Unknown entities pass through verbatim.
pub fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let entity = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ]
        .iter()
        .find(|(name, _)| tail.starts_with(name));
        match entity {
            Some((name, ch)) => {
                out.push(*ch);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
