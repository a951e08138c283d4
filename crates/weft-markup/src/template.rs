//! Template extraction
//!
//! Converts every topmost scope/prop region beneath a node into an inert
//! marker (`<script type="text/template">`) holding the original markup.
//! Once data is bound, the live tree carries no unrendered scaffolding, and
//! new instances can be manufactured client-side by cloning the marker's
//! content.

use crate::arena::{NodeArena, NodeId};
use crate::node::{Element, Node};

/// Extract every topmost binding region beneath `from` into templates
///
/// Each extracted region is replaced in place by a marker carrying the same
/// `data-b`/`data-v` labels. Nested scopes stay inside the extracted markup
/// verbatim, so instantiating the template later re-extracts them within the
/// fresh instance. Returns the marker ids in document order.
pub fn extract_templates(arena: &mut NodeArena, from: NodeId) -> Vec<NodeId> {
    let mut markers = Vec::new();
    extract_level(arena, from, &mut markers);
    markers
}

fn extract_level(arena: &mut NodeArena, parent: NodeId, markers: &mut Vec<NodeId>) {
    let children: Vec<NodeId> = arena.node(parent).children.clone();
    for child in children {
        let Some(element) = arena.element(child) else {
            continue;
        };
        if element.is_template {
            continue;
        }
        if element.binding.is_some() {
            markers.push(extract_region(arena, child));
        } else {
            extract_level(arena, child, markers);
        }
    }
}

/// Replace one binding region with a marker wrapping it
///
/// Used directly when manufacturing instances that carry nested scaffolding.
pub fn extract_region(arena: &mut NodeArena, region: NodeId) -> NodeId {
    let (parent, index) = arena
        .position(region)
        .unwrap_or((arena.root(), usize::MAX));

    let (binding, version) = {
        let element = arena
            .element(region)
            .cloned()
            .unwrap_or_else(|| Element::new("script"));
        (element.binding, element.version)
    };

    let mut marker = Element::new("script");
    marker.attrs.insert("type", "text/template");
    marker.binding = binding;
    marker.version = version;
    marker.is_template = true;

    let marker_id = arena.alloc(Node::element(marker));
    arena.detach(region);
    arena.insert_child(parent, index, marker_id);
    arena.append_child(marker_id, region);
    marker_id
}

/// Clone a template marker's content into a fresh detached instance
#[must_use]
pub fn clone_template(arena: &mut NodeArena, marker: NodeId) -> Option<NodeId> {
    let content = arena.node(marker).children.first().copied()?;
    Some(arena.deep_clone(content))
}
