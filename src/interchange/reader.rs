//! Interchange reader
//!
//! Minimal counterpart to the writer: reloads a document produced by
//! [`super::write_document`] into a node tree with fresh session ids. The
//! production loader lives in the external editor; this one exists so the
//! lossless-reload contract is testable without it.

use std::fmt;

use crate::node::{Node, NodeType};
use crate::session::ParseSession;

use super::unescape_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterchangeError {
    UnexpectedEnd,
    Malformed(String),
}

impl fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeError::UnexpectedEnd => write!(f, "document ended mid-element"),
            InterchangeError::Malformed(detail) => write!(f, "malformed document: {}", detail),
        }
    }
}

impl std::error::Error for InterchangeError {}

type Result<T> = std::result::Result<T, InterchangeError>;

/// Reload an interchange document. Node ids are renumbered from the given
/// session; everything else round-trips structurally.
pub fn read_document(
    document: &str,
    session: &mut ParseSession,
) -> Result<(String, Vec<Node>)> {
    let mut reader = Reader {
        text: document,
        pos: 0,
    };
    let root = reader.next_tag()?;
    if !matches!(&root, Tag::Open { name, .. } if name == "xml") {
        return Err(InterchangeError::Malformed("expected <xml> root".into()));
    }
    let container = reader.next_tag()?;
    let Tag::Open { name, attrs, .. } = &container else {
        return Err(InterchangeError::Malformed(
            "expected file container block".into(),
        ));
    };
    if name != "block" || attr(attrs, "type") != Some("file_container") {
        return Err(InterchangeError::Malformed(
            "expected file container block".into(),
        ));
    }

    let mut file_name = String::new();
    let mut declarations = Vec::new();
    loop {
        match reader.next_tag()? {
            Tag::Close { name } if name == "block" => break,
            Tag::Open { name, attrs, self_closing } if name == "field" => {
                let value = if self_closing {
                    String::new()
                } else {
                    reader.element_text("field")?
                };
                if attr(&attrs, "name") == Some("FILENAME") {
                    file_name = value;
                }
            }
            Tag::Open { name, .. } if name == "statement" => {
                declarations = reader.read_chain(session)?;
                reader.expect_close("statement")?;
            }
            other => {
                return Err(InterchangeError::Malformed(format!(
                    "unexpected {:?} in file container",
                    other
                )))
            }
        }
    }
    reader.expect_close("xml")?;
    Ok((file_name, declarations))
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

#[derive(Debug)]
enum Tag {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
}

struct Reader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Advance to and parse the next tag; intervening whitespace is skipped.
    fn next_tag(&mut self) -> Result<Tag> {
        let lt = self.text[self.pos..]
            .find('<')
            .ok_or(InterchangeError::UnexpectedEnd)?;
        self.pos += lt + 1;
        let closing = self.text[self.pos..].starts_with('/');
        if closing {
            self.pos += 1;
        }
        let name = self.read_name();
        if closing {
            self.skip_until_gt()?;
            return Ok(Tag::Close { name });
        }
        let mut attrs = Vec::new();
        loop {
            self.skip_ws();
            if self.text[self.pos..].starts_with("/>") {
                self.pos += 2;
                return Ok(Tag::Open {
                    name,
                    attrs,
                    self_closing: true,
                });
            }
            if self.text[self.pos..].starts_with('>') {
                self.pos += 1;
                return Ok(Tag::Open {
                    name,
                    attrs,
                    self_closing: false,
                });
            }
            if self.pos >= self.text.len() {
                return Err(InterchangeError::UnexpectedEnd);
            }
            let attr_name = self.read_name();
            if attr_name.is_empty() {
                return Err(InterchangeError::Malformed(format!(
                    "bad attribute in <{}>",
                    name
                )));
            }
            self.skip_ws();
            if !self.text[self.pos..].starts_with('=') {
                return Err(InterchangeError::Malformed(format!(
                    "attribute `{}` missing value",
                    attr_name
                )));
            }
            self.pos += 1;
            self.skip_ws();
            if !self.text[self.pos..].starts_with('"') {
                return Err(InterchangeError::Malformed(format!(
                    "attribute `{}` missing quoted value",
                    attr_name
                )));
            }
            self.pos += 1;
            let end = self.text[self.pos..]
                .find('"')
                .ok_or(InterchangeError::UnexpectedEnd)?;
            let raw = &self.text[self.pos..self.pos + end];
            self.pos += end + 1;
            attrs.push((attr_name, unescape_text(raw)));
        }
    }

    /// Raw text content up to the element's closing tag.
    fn element_text(&mut self, element: &str) -> Result<String> {
        let lt = self.text[self.pos..]
            .find('<')
            .ok_or(InterchangeError::UnexpectedEnd)?;
        let raw = &self.text[self.pos..self.pos + lt];
        self.pos += lt;
        self.expect_close(element)?;
        Ok(unescape_text(raw))
    }

    fn expect_close(&mut self, element: &str) -> Result<()> {
        match self.next_tag()? {
            Tag::Close { name } if name == element => Ok(()),
            other => Err(InterchangeError::Malformed(format!(
                "expected </{}>, found {:?}",
                element, other
            ))),
        }
    }

    /// Read a `<block>` chain: the first block plus its flattened `<next>`
    /// successors.
    fn read_chain(&mut self, session: &mut ParseSession) -> Result<Vec<Node>> {
        match self.next_tag()? {
            Tag::Open { name, attrs, .. } if name == "block" => {
                let (node, tail) = self.read_block(&attrs, session)?;
                let mut chain = vec![node];
                chain.extend(tail);
                Ok(chain)
            }
            other => Err(InterchangeError::Malformed(format!(
                "expected <block>, found {:?}",
                other
            ))),
        }
    }

    /// Read one block's content after its open tag. Returns the node and its
    /// `<next>` tail.
    fn read_block(
        &mut self,
        attrs: &[(String, String)],
        session: &mut ParseSession,
    ) -> Result<(Node, Vec<Node>)> {
        let type_tag = attr(attrs, "type")
            .ok_or_else(|| InterchangeError::Malformed("block missing type".into()))?;
        let ty = NodeType::from_tag(type_tag).ok_or_else(|| {
            InterchangeError::Malformed(format!("unknown block type `{}`", type_tag))
        })?;
        let mut node = Node::new(session.fresh_id(), ty);
        let mut tail = Vec::new();
        loop {
            match self.next_tag()? {
                Tag::Close { name } if name == "block" => break,
                Tag::Open { name, attrs, self_closing } if name == "field" => {
                    let field_name = attr(&attrs, "name")
                        .ok_or_else(|| InterchangeError::Malformed("field missing name".into()))?
                        .to_string();
                    let value = if self_closing {
                        String::new()
                    } else {
                        self.element_text("field")?
                    };
                    node.fields.push((field_name, value));
                }
                Tag::Open { name, attrs, .. } if name == "value" => {
                    let slot = attr(&attrs, "name")
                        .ok_or_else(|| InterchangeError::Malformed("value missing name".into()))?
                        .to_string();
                    let mut chain = self.read_chain(session)?;
                    if chain.len() != 1 {
                        return Err(InterchangeError::Malformed(format!(
                            "value slot `{}` must hold a single block",
                            slot
                        )));
                    }
                    node.value_slots.push((slot, chain.remove(0)));
                    self.expect_close("value")?;
                }
                Tag::Open { name, attrs, .. } if name == "statement" => {
                    let slot = attr(&attrs, "name").ok_or_else(|| {
                        InterchangeError::Malformed("statement missing name".into())
                    })?
                    .to_string();
                    let chain = self.read_chain(session)?;
                    node.statement_slots.push((slot, chain));
                    self.expect_close("statement")?;
                }
                Tag::Open { name, .. } if name == "next" => {
                    tail = self.read_chain(session)?;
                    self.expect_close("next")?;
                }
                other => {
                    return Err(InterchangeError::Malformed(format!(
                        "unexpected {:?} inside block",
                        other
                    )))
                }
            }
        }
        Ok((node, tail))
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        for (off, ch) in self.text[start..].char_indices() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == ':' {
                self.pos = start + off + ch.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            String::new()
        } else {
            self.text[start..self.pos].to_string()
        }
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.text[self.pos..].chars().next() {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
    }

    fn skip_until_gt(&mut self) -> Result<()> {
        let gt = self.text[self.pos..]
            .find('>')
            .ok_or(InterchangeError::UnexpectedEnd)?;
        self.pos += gt + 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::write_document;
    use super::*;

    #[test]
    fn reloads_writer_output() {
        let mut write_session = ParseSession::new();
        let inner = Node::new(write_session.fresh_id(), NodeType::Expression)
            .with_field("TEXT", "a + b");
        let node = Node::new(write_session.fresh_id(), NodeType::Return)
            .with_value("VALUE", inner);
        let doc = write_document("math.rs", std::slice::from_ref(&node));

        let mut read_session = ParseSession::new();
        let (file_name, nodes) = read_document(&doc, &mut read_session).unwrap();
        assert_eq!(file_name, "math.rs");
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].same_shape(&node));
    }

    #[test]
    fn rejects_unknown_block_types() {
        let doc = "<xml><block type=\"file_container\" id=\"file\">\
                   <statement name=\"DECLS\"><block type=\"mystery\" id=\"n1\"></block>\
                   </statement></block></xml>";
        let mut session = ParseSession::new();
        let err = read_document(doc, &mut session).unwrap_err();
        assert!(matches!(err, InterchangeError::Malformed(_)));
    }

    #[test]
    fn empty_document_round_trips() {
        let doc = write_document("empty.rs", &[]);
        let mut session = ParseSession::new();
        let (file_name, nodes) = read_document(&doc, &mut session).unwrap();
        assert_eq!(file_name, "empty.rs");
        assert!(nodes.is_empty());
    }
}
