//! Interchange writer
//!
//! Renders a node sequence into the markup document the external editor
//! loads. Stateless: the output is a pure function of the filename and node
//! sequence.

use crate::node::Node;

use super::escape_text;

const XMLNS: &str = "https://developers.google.com/blockly/xml";

/// Render one file's declarations as a portable interchange document.
pub fn write_document(file_name: &str, nodes: &[Node]) -> String {
    let mut out = String::new();
    out.push_str(&format!("<xml xmlns=\"{}\">\n", XMLNS));
    out.push_str("  <block type=\"file_container\" id=\"file\">\n");
    out.push_str(&format!(
        "    <field name=\"FILENAME\">{}</field>\n",
        escape_text(file_name)
    ));
    if !nodes.is_empty() {
        out.push_str("    <statement name=\"DECLS\">\n");
        write_chain(&mut out, nodes, 3);
        out.push_str("    </statement>\n");
    }
    out.push_str("  </block>\n");
    out.push_str("</xml>\n");
    out
}

/// Render a sibling sequence as a `<next>`-nested chain: each element wraps
/// its successor, mirroring a linked list.
fn write_chain(out: &mut String, nodes: &[Node], depth: usize) {
    let (first, rest) = match nodes.split_first() {
        Some(split) => split,
        None => return,
    };
    write_block(out, first, rest, depth);
}

fn write_block(out: &mut String, node: &Node, tail: &[Node], depth: usize) {
    let pad = "  ".repeat(depth);
    out.push_str(&format!(
        "{}<block type=\"{}\" id=\"{}\">\n",
        pad,
        node.ty.tag(),
        escape_text(&node.id)
    ));
    for (name, value) in &node.fields {
        out.push_str(&format!(
            "{}  <field name=\"{}\">{}</field>\n",
            pad,
            escape_text(name),
            escape_text(value)
        ));
    }
    for (slot, child) in &node.value_slots {
        out.push_str(&format!("{}  <value name=\"{}\">\n", pad, escape_text(slot)));
        write_block(out, child, &[], depth + 2);
        out.push_str(&format!("{}  </value>\n", pad));
    }
    for (slot, children) in &node.statement_slots {
        if children.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "{}  <statement name=\"{}\">\n",
            pad,
            escape_text(slot)
        ));
        write_chain(out, children, depth + 2);
        out.push_str(&format!("{}  </statement>\n", pad));
    }
    if !tail.is_empty() {
        out.push_str(&format!("{}  <next>\n", pad));
        write_block(out, &tail[0], &tail[1..], depth + 2);
        out.push_str(&format!("{}  </next>\n", pad));
    }
    out.push_str(&format!("{}</block>\n", pad));
}
