//! Markup parser
//!
//! Recursive-descent parser for the HTML subset weft renders: elements,
//! attributes, text, comments, void and self-closing tags. Template markers
//! (`<script type="text/template">`) are parsed like ordinary subtrees and
//! flagged inert.

use crate::arena::{NodeArena, NodeId};
use crate::error::MarkupError;
use crate::node::{Binding, Element, Node};

/// Tags that never have children or closing tags
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parse a document into a fresh arena
///
/// Top-level nodes become children of the arena's synthetic root.
///
/// # Errors
/// Returns [`MarkupError`] on malformed, mismatched, or truncated tags.
pub fn parse(html: &str) -> Result<NodeArena, MarkupError> {
    let mut arena = NodeArena::new();
    let root = arena.root();
    let nodes = parse_fragment(&mut arena, html)?;
    for node in nodes {
        arena.append_child(root, node);
    }
    Ok(arena)
}

/// Parse a fragment into an existing arena, returning detached top-level nodes
///
/// # Errors
/// Returns [`MarkupError`] on malformed, mismatched, or truncated tags.
pub fn parse_fragment(arena: &mut NodeArena, html: &str) -> Result<Vec<NodeId>, MarkupError> {
    Parser {
        input: html,
        pos: 0,
        arena,
    }
    .run()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    arena: &'a mut NodeArena,
}

impl Parser<'_> {
    fn run(mut self) -> Result<Vec<NodeId>, MarkupError> {
        let mut top_level = Vec::new();
        // Stack of open elements; children attach to the innermost.
        let mut stack: Vec<(String, NodeId)> = Vec::new();

        while self.pos < self.input.len() {
            if self.rest().starts_with("<!--") {
                self.skip_comment()?;
                continue;
            }
            if self.rest().starts_with("<!") {
                self.skip_until('>')?;
                continue;
            }
            if self.rest().starts_with("</") {
                let offset = self.pos;
                let found = self.read_closing_tag()?;
                match stack.pop() {
                    Some((expected, _)) if expected == found => {}
                    Some((expected, _)) => {
                        return Err(MarkupError::MismatchedTag {
                            expected,
                            found,
                            offset,
                        });
                    }
                    None => return Err(MarkupError::StrayClosingTag { found, offset }),
                }
                continue;
            }
            if self.rest().starts_with('<') {
                let (element, self_closed) = self.read_open_tag()?;
                let tag = element.tag.clone();
                let id = self.arena.alloc(Node::element(element));
                match stack.last() {
                    Some(&(_, parent)) => self.arena.append_child(parent, id),
                    None => top_level.push(id),
                }
                if !self_closed && !VOID_TAGS.contains(&tag.as_str()) {
                    stack.push((tag, id));
                }
                continue;
            }

            let text = self.read_text();
            if !text.trim().is_empty() || !stack.is_empty() {
                let id = self.arena.alloc(Node::text(text));
                match stack.last() {
                    Some(&(_, parent)) => self.arena.append_child(parent, id),
                    None => top_level.push(id),
                }
            }
        }

        if let Some((tag, _)) = stack.pop() {
            tracing::debug!(tag, "input ended with unclosed element");
            return Err(MarkupError::UnexpectedEof { offset: self.pos });
        }
        Ok(top_level)
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn skip_comment(&mut self) -> Result<(), MarkupError> {
        match self.rest().find("-->") {
            Some(end) => {
                self.pos += end + 3;
                Ok(())
            }
            None => Err(MarkupError::UnexpectedEof { offset: self.pos }),
        }
    }

    fn skip_until(&mut self, terminator: char) -> Result<(), MarkupError> {
        match self.rest().find(terminator) {
            Some(end) => {
                self.pos += end + terminator.len_utf8();
                Ok(())
            }
            None => Err(MarkupError::UnexpectedEof { offset: self.pos }),
        }
    }

    fn read_text(&mut self) -> String {
        let end = self.rest().find('<').unwrap_or(self.rest().len());
        let text = self.rest()[..end].to_string();
        self.pos += end;
        text
    }

    fn read_closing_tag(&mut self) -> Result<String, MarkupError> {
        self.pos += 2; // "</"
        let name = self.read_name()?;
        self.skip_whitespace();
        self.expect('>')?;
        Ok(name)
    }

    fn read_open_tag(&mut self) -> Result<(Element, bool), MarkupError> {
        let offset = self.pos;
        self.pos += 1; // "<"
        let tag = self.read_name()?;
        let mut element = Element::new(tag.to_lowercase());

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('/') => {
                    self.pos += 1;
                    self.expect('>')?;
                    finish_element(&mut element);
                    return Ok((element, true));
                }
                Some(_) => {
                    let (name, value) = self.read_attribute()?;
                    route_attribute(&mut element, &name, &value);
                }
                None => return Err(MarkupError::UnexpectedEof { offset }),
            }
        }

        finish_element(&mut element);
        Ok((element, false))
    }

    fn read_attribute(&mut self) -> Result<(String, String), MarkupError> {
        let name = self.read_attr_name()?;
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let end = self
                    .rest()
                    .find(quote)
                    .ok_or(MarkupError::UnexpectedEof { offset: self.pos })?;
                let value = self.rest()[..end].to_string();
                self.pos += end + 1;
                value
            }
            _ => {
                let end = self
                    .rest()
                    .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                    .unwrap_or(self.rest().len());
                let value = self.rest()[..end].to_string();
                self.pos += end;
                value
            }
        };
        Ok((name, value))
    }

    fn read_name(&mut self) -> Result<String, MarkupError> {
        let end = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(self.rest().len());
        if end == 0 {
            return Err(MarkupError::MalformedTag {
                offset: self.pos,
                reason: "expected tag name".to_string(),
            });
        }
        let name = self.rest()[..end].to_string();
        self.pos += end;
        Ok(name)
    }

    fn read_attr_name(&mut self) -> Result<String, MarkupError> {
        let end = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(self.rest().len());
        if end == 0 {
            return Err(MarkupError::MalformedTag {
                offset: self.pos,
                reason: "expected attribute name".to_string(),
            });
        }
        let name = self.rest()[..end].to_string();
        self.pos += end;
        Ok(name)
    }

    fn skip_whitespace(&mut self) {
        let end = self
            .rest()
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(self.rest().len());
        self.pos += end;
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn expect(&mut self, expected: char) -> Result<(), MarkupError> {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(MarkupError::MalformedTag {
                offset: self.pos,
                reason: format!("expected '{expected}'"),
            })
        }
    }
}

/// Route one parsed attribute into the element's typed slots
fn route_attribute(element: &mut Element, name: &str, value: &str) {
    match name {
        "data-b" => element.binding = Some(Binding::parse(value)),
        "data-v" => element.version = Some(value.to_string()),
        _ => element.attrs.insert(name, value),
    }
}

/// Post-parse fixups that need the whole tag read
fn finish_element(element: &mut Element) {
    if element.tag == "script" && element.attrs.get("type") == Some("text/template") {
        element.is_template = true;
    }
}
