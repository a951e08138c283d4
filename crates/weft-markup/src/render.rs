//! Markup renderer
//!
//! Serializes an arena subtree back to HTML. Binding state round-trips
//! through the same `data-*` attributes the parser reads.

use std::fmt::Write as _;

use crate::arena::{NodeArena, NodeId};
use crate::node::NodeKind;

/// Tags rendered without closing tags
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Render the whole document
#[must_use]
pub fn render(arena: &NodeArena) -> String {
    let mut out = String::new();
    for &child in &arena.node(arena.root()).children {
        write_node(arena, child, &mut out);
    }
    out
}

/// Render one subtree
#[must_use]
pub fn render_node(arena: &NodeArena, id: NodeId) -> String {
    let mut out = String::new();
    write_node(arena, id, &mut out);
    out
}

/// Render only the children of a node (its inner markup)
#[must_use]
pub fn render_children(arena: &NodeArena, id: NodeId) -> String {
    let mut out = String::new();
    for &child in &arena.node(id).children {
        write_node(arena, child, &mut out);
    }
    out
}

fn write_node(arena: &NodeArena, id: NodeId, out: &mut String) {
    match &arena.node(id).kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element(element) => {
            // The synthetic root has an empty tag; render children only.
            if element.tag.is_empty() {
                for &child in &arena.node(id).children {
                    write_node(arena, child, out);
                }
                return;
            }

            out.push('<');
            out.push_str(&element.tag);

            if let Some(binding) = &element.binding {
                let _ = write!(out, " data-b=\"{}\"", binding.to_attribute());
            }
            if let Some(version) = &element.version {
                let _ = write!(out, " data-v=\"{version}\"");
            }
            if !element.attrs.classes.is_empty() {
                let classes: Vec<&str> =
                    element.attrs.classes.iter().map(String::as_str).collect();
                let _ = write!(out, " class=\"{}\"", classes.join(" "));
            }
            if !element.attrs.styles.is_empty() {
                let _ = write!(out, " style=\"{}\"", element.attrs.style_attribute());
            }
            for boolean in &element.attrs.booleans {
                let _ = write!(out, " {boolean}");
            }
            for (name, value) in &element.attrs.plain {
                let _ = write!(out, " {name}=\"{value}\"");
            }
            out.push('>');

            if VOID_TAGS.contains(&element.tag.as_str()) {
                return;
            }
            for &child in &arena.node(id).children {
                write_node(arena, child, out);
            }
            let _ = write!(out, "</{}>", element.tag);
        }
    }
}
