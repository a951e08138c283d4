//! Node arena
//!
//! All nodes of one document live in a single [`NodeArena`] and are addressed
//! by [`NodeId`] index. Parent links are explicit indices, so carving a
//! template out of a tree never leaves cyclic ownership behind.

use crate::node::{Element, Node, NodeKind};

/// Index of a node within its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw slot index
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of markup nodes
///
/// Detached nodes stay allocated until [`NodeArena::release`] returns their
/// slots to a free list. A client-side document lives for the whole
/// subscription and is mutated in place on every replay, so discarded
/// subtrees must be recycled rather than accumulated.
#[derive(Debug, Clone)]
pub struct NodeArena {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl NodeArena {
    /// Create an arena holding only a synthetic document root
    #[must_use]
    pub fn new() -> Self {
        let root = Node::element(Element::new(""));
        Self {
            nodes: vec![root],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Document root
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of occupied slots, detached-but-unreleased nodes included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Whether the arena holds only the synthetic root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Allocate a detached node, reusing a released slot when one exists
    pub fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                let id = NodeId(self.nodes.len());
                self.nodes.push(node);
                id
            }
        }
    }

    /// Borrow a node
    ///
    /// # Panics
    /// Panics if `id` came from a different arena.
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Mutably borrow a node
    ///
    /// # Panics
    /// Panics if `id` came from a different arena.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Element payload of a node, `None` for text nodes
    #[inline]
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).as_element()
    }

    /// Mutable element payload of a node
    #[inline]
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.node_mut(id).as_element_mut()
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` at `index` among `parent`'s children
    ///
    /// Indices past the end append.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Remove a node from its parent, leaving it allocated but detached
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    /// Detach a subtree and return every slot in it for reuse
    ///
    /// The caller must hold no ids into the released subtree; later
    /// allocations may reoccupy its slots.
    pub fn release(&mut self, id: NodeId) {
        self.detach(id);
        for slot in self.descendants(id) {
            self.nodes[slot.0] = Node::text(String::new());
            self.free.push(slot);
        }
    }

    /// Position of a node among its parent's children
    #[must_use]
    pub fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes[id.0].parent?;
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&child| child == id)?;
        Some((parent, index))
    }

    /// Deep-clone a subtree, returning the detached clone's root
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let node = self.nodes[id.0].clone();
        let children = node.children.clone();
        let clone = self.alloc(Node {
            kind: node.kind,
            parent: None,
            children: Vec::new(),
        });
        for child in children {
            let child_clone = self.deep_clone(child);
            self.append_child(clone, child_clone);
        }
        clone
    }

    /// Preorder walk of a subtree, `id` included
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.nodes[current.0].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Whether a binding node is a scope (contains further bindings)
    ///
    /// A binding node with no bound descendants is a prop.
    #[must_use]
    pub fn is_scope(&self, id: NodeId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        if element.binding.is_none() {
            return false;
        }
        self.descendants(id)
            .into_iter()
            .skip(1)
            .any(|descendant| {
                self.element(descendant)
                    .is_some_and(|element| element.binding.is_some())
            })
    }

    /// Concatenated text content of a subtree
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for descendant in self.descendants(id) {
            if let NodeKind::Text(text) = &self.node(descendant).kind {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace a subtree's children, releasing the old ones
    ///
    /// The new children must not come from the old subtree.
    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        let old: Vec<NodeId> = self.nodes[id.0].children.clone();
        for child in old {
            self.release(child);
        }
        for child in children {
            self.append_child(id, child);
        }
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;

    #[test]
    fn arena_append_and_position() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let a = arena.alloc(Node::element(Element::new("div")));
        let b = arena.alloc(Node::element(Element::new("span")));
        arena.append_child(root, a);
        arena.append_child(root, b);

        assert_eq!(arena.position(a), Some((root, 0)));
        assert_eq!(arena.position(b), Some((root, 1)));
    }

    #[test]
    fn arena_detach_removes_from_parent() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let a = arena.alloc(Node::element(Element::new("div")));
        arena.append_child(root, a);
        arena.detach(a);

        assert!(arena.node(root).children.is_empty());
        assert!(arena.node(a).parent.is_none());
    }

    #[test]
    fn arena_insert_child_positions() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let a = arena.alloc(Node::element(Element::new("a")));
        let b = arena.alloc(Node::element(Element::new("b")));
        let c = arena.alloc(Node::element(Element::new("c")));
        arena.append_child(root, a);
        arena.append_child(root, b);
        arena.insert_child(root, 1, c);

        let tags: Vec<String> = arena
            .node(root)
            .children
            .iter()
            .filter_map(|&id| arena.element(id).map(|e| e.tag.clone()))
            .collect();
        assert_eq!(tags, vec!["a", "c", "b"]);
    }

    #[test]
    fn arena_deep_clone_is_detached_and_equal() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let outer = arena.alloc(Node::element(Element::new("div")));
        let inner = arena.alloc(Node::text("hello"));
        arena.append_child(root, outer);
        arena.append_child(outer, inner);

        let clone = arena.deep_clone(outer);
        assert!(arena.node(clone).parent.is_none());
        assert_eq!(arena.text_content(clone), "hello");
        // The original is untouched.
        assert_eq!(arena.position(outer), Some((root, 0)));
    }

    #[test]
    fn release_recycles_slots() {
        let mut arena = NodeArena::new();
        let root = arena.root();
        let outer = arena.alloc(Node::element(Element::new("div")));
        let inner = arena.alloc(Node::text("gone"));
        arena.append_child(root, outer);
        arena.append_child(outer, inner);
        let occupied = arena.len();

        arena.release(outer);
        assert_eq!(arena.len(), occupied - 2);
        assert!(arena.node(root).children.is_empty());

        // Fresh allocations reoccupy the released slots.
        let a = arena.alloc(Node::element(Element::new("span")));
        let b = arena.alloc(Node::text("back"));
        assert_eq!(arena.len(), occupied);
        assert!([outer, inner].contains(&a));
        assert!([outer, inner].contains(&b));
    }

    #[test]
    fn scope_versus_prop_detection() {
        let mut arena = NodeArena::new();
        let root = arena.root();

        let mut scope = Element::new("article");
        scope.binding = Some(crate::node::Binding::parse("post"));
        let scope_id = arena.alloc(Node::element(scope));
        arena.append_child(root, scope_id);

        let mut prop = Element::new("h1");
        prop.binding = Some(crate::node::Binding::parse("title"));
        let prop_id = arena.alloc(Node::element(prop));
        arena.append_child(scope_id, prop_id);

        assert!(arena.is_scope(scope_id));
        assert!(!arena.is_scope(prop_id));
    }
}
