//! Binding queries
//!
//! `find` and `find_all` locate bound regions by binding name and optional
//! channel. Channel matching is exact-string-or-absent: a filter naming only
//! part of a node's channel path never matches. An ambiguous partial match
//! silently returning the wrong instance is worse than a clear miss.

use std::collections::HashMap;

use crate::arena::{NodeArena, NodeId};
use crate::node::Binding;

/// Channel filter for a binding query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelFilter(Vec<String>);

impl ChannelFilter {
    /// Filter requiring the exact channel path
    #[must_use]
    pub fn exact<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Whether a node channel satisfies this filter
    #[inline]
    #[must_use]
    pub fn matches(&self, channel: &[String]) -> bool {
        self.0 == channel
    }
}

/// Result of a binding query
///
/// `live` holds currently rendered instances, `templates` the inert markers
/// for the same binding. Both are in document order. A set with no live
/// nodes but surviving templates means "exists with zero bound instances".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeSet {
    live: Vec<NodeId>,
    templates: Vec<NodeId>,
}

impl NodeSet {
    /// Assemble a set from already-resolved nodes
    #[must_use]
    pub fn from_parts(live: Vec<NodeId>, templates: Vec<NodeId>) -> Self {
        Self { live, templates }
    }

    /// Currently rendered instances
    #[inline]
    #[must_use]
    pub fn live(&self) -> &[NodeId] {
        &self.live
    }

    /// Inert template markers
    #[inline]
    #[must_use]
    pub fn templates(&self) -> &[NodeId] {
        &self.templates
    }

    /// First live instance
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.live.first().copied()
    }

    /// Whether neither live nodes nor templates matched
    #[inline]
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.live.is_empty() && self.templates.is_empty()
    }
}

impl NodeArena {
    /// Find the first site matching a binding-name path
    ///
    /// Each name may carry inline channel qualifiers (`"post:foo:bar"`), or
    /// the final name can be filtered with `channel`. Descent stops at scope
    /// boundaries: a scope nested inside another scope is only reachable by
    /// naming the outer scope first. Returns `None` when the path cannot be
    /// resolved at all, distinguishing "does not exist" from "exists with
    /// zero bound instances" (an empty set with templates).
    #[must_use]
    pub fn find(&self, names: &[&str], channel: Option<&ChannelFilter>) -> Option<NodeSet> {
        self.find_from(self.root(), names, channel)
    }

    /// [`NodeArena::find`] scoped beneath an arbitrary node
    #[must_use]
    pub fn find_from(
        &self,
        from: NodeId,
        names: &[&str],
        channel: Option<&ChannelFilter>,
    ) -> Option<NodeSet> {
        let mut context = from;
        for (position, raw_name) in names.iter().enumerate() {
            let last = position + 1 == names.len();
            let (name, inline_filter) = split_inline_channel(raw_name);
            let filter = match (&inline_filter, last) {
                (Some(inline), _) => Some(inline),
                (None, true) => channel,
                (None, false) => None,
            };

            let set = self.collect(context, &name, filter);
            if set.is_vacant() {
                return None;
            }
            if last {
                return Some(restrict_to_first_site(self, set));
            }
            // Descend into the first document-order match for the next name.
            context = set.first()?;
        }
        None
    }

    /// Find every match for one binding name, document order, no early stop
    #[must_use]
    pub fn find_all(&self, name: &str, channel: Option<&ChannelFilter>) -> NodeSet {
        self.find_all_from(self.root(), name, channel)
    }

    /// [`NodeArena::find_all`] scoped beneath an arbitrary node
    #[must_use]
    pub fn find_all_from(
        &self,
        from: NodeId,
        name: &str,
        channel: Option<&ChannelFilter>,
    ) -> NodeSet {
        let (name, inline_filter) = split_inline_channel(name);
        let filter = inline_filter.as_ref().or(channel);
        self.collect(from, &name, filter)
    }

    /// Breadth-first match collection honoring scope boundaries
    fn collect(&self, from: NodeId, name: &str, filter: Option<&ChannelFilter>) -> NodeSet {
        let mut live = Vec::new();
        let mut templates = Vec::new();
        let mut queue: Vec<NodeId> = self.node(from).children.clone();
        let mut cursor = 0;

        while cursor < queue.len() {
            let id = queue[cursor];
            cursor += 1;

            let Some(element) = self.element(id) else {
                continue;
            };

            if element.is_template {
                if let Some(binding) = &element.binding {
                    if binding.name == name && channel_ok(filter, &binding.channel) {
                        templates.push(id);
                    }
                }
                continue;
            }

            match &element.binding {
                Some(binding) if binding.name == name => {
                    if channel_ok(filter, &binding.channel) {
                        live.push(id);
                    }
                    // Matched or not, a same-named scope is a boundary.
                }
                Some(_) if self.is_scope(id) => {
                    // Foreign scope: do not nest-match through it.
                }
                _ => queue.extend(self.node(id).children.iter().copied()),
            }
        }

        let order = self.document_order(from);
        live.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
        templates.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
        NodeSet { live, templates }
    }

    /// Preorder position of every node beneath (and including) `from`
    fn document_order(&self, from: NodeId) -> HashMap<NodeId, usize> {
        self.descendants(from)
            .into_iter()
            .enumerate()
            .map(|(position, id)| (id, position))
            .collect()
    }
}

/// Exact-string-or-absent channel matching
#[inline]
fn channel_ok(filter: Option<&ChannelFilter>, channel: &[String]) -> bool {
    filter.map_or(true, |filter| filter.matches(channel))
}

/// Split `"post:foo:bar"` into a name and an inline channel filter
fn split_inline_channel(raw: &str) -> (String, Option<ChannelFilter>) {
    if raw.contains(':') {
        let binding = Binding::parse(raw);
        (binding.name, Some(ChannelFilter(binding.channel)))
    } else {
        (raw.to_string(), None)
    }
}

/// Keep only matches sharing the first match's parent
///
/// A presented collection lives as siblings; matches elsewhere in the tree
/// belong to a different site and are `find_all` territory.
fn restrict_to_first_site(arena: &NodeArena, set: NodeSet) -> NodeSet {
    let anchor = set
        .live
        .first()
        .or_else(|| set.templates.first())
        .copied();
    let Some(anchor) = anchor else {
        return set;
    };
    let parent = arena.node(anchor).parent;
    NodeSet {
        live: set
            .live
            .into_iter()
            .filter(|&id| arena.node(id).parent == parent)
            .collect(),
        templates: set
            .templates
            .into_iter()
            .filter(|&id| arena.node(id).parent == parent)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn find_returns_none_for_absent_binding() {
        let arena = parse(r#"<div data-b="post"></div>"#).unwrap();
        assert!(arena.find(&["comment"], None).is_none());
    }

    #[test]
    fn find_matches_unqualified_name() {
        let arena = parse(r#"<div data-b="post" data-id="1"></div>"#).unwrap();
        let set = arena.find(&["post"], None).unwrap();
        assert_eq!(set.live().len(), 1);
    }

    #[test]
    fn exact_channel_prefix_and_suffix_miss() {
        let arena = parse(r#"<div data-b="post:foo:bar"></div>"#).unwrap();

        let foo = ChannelFilter::exact(["foo"]);
        let bar = ChannelFilter::exact(["bar"]);
        assert!(arena.find(&["post"], Some(&foo)).is_none());
        assert!(arena.find(&["post"], Some(&bar)).is_none());

        let full = ChannelFilter::exact(["foo", "bar"]);
        assert!(arena.find(&["post"], Some(&full)).is_some());
        // The inline spelling resolves identically.
        assert!(arena.find(&["post:foo:bar"], None).is_some());
    }

    #[test]
    fn no_filter_matches_any_channel() {
        let arena = parse(r#"<div data-b="post:feed"></div>"#).unwrap();
        let set = arena.find(&["post"], None).unwrap();
        assert_eq!(set.live().len(), 1);
    }

    #[test]
    fn scopes_do_not_nest_match_through_boundaries() {
        let arena = parse(
            r#"<div data-b="comment"><p data-b="body"></p><div data-b="post"><h1 data-b="title"></h1></div></div>"#,
        )
        .unwrap();
        // "post" is inside the "comment" scope; a top-level find must not see it.
        assert!(arena.find(&["post"], None).is_none());
        // Naming the outer scope first reaches it.
        assert!(arena.find(&["comment", "post"], None).is_some());
    }

    #[test]
    fn find_descends_through_structural_nodes() {
        let arena = parse(r#"<main><section><div data-b="post"></div></section></main>"#).unwrap();
        assert!(arena.find(&["post"], None).is_some());
    }

    #[test]
    fn find_path_resolves_prop_within_scope() {
        let arena = parse(
            r#"<article data-b="post"><h1 data-b="title"></h1></article>"#,
        )
        .unwrap();
        let set = arena.find(&["post", "title"], None).unwrap();
        assert_eq!(set.live().len(), 1);
    }

    #[test]
    fn find_first_site_excludes_other_parents() {
        let arena = parse(
            r#"<div><p data-b="note"></p></div><aside><p data-b="note"></p></aside>"#,
        )
        .unwrap();
        let set = arena.find(&["note"], None).unwrap();
        assert_eq!(set.live().len(), 1);

        let all = arena.find_all("note", None);
        assert_eq!(all.live().len(), 2);
    }

    #[test]
    fn find_sees_templates_as_presence() {
        let arena = parse(
            r#"<script type="text/template" data-b="post"><div data-b="post"></div></script>"#,
        )
        .unwrap();
        let set = arena.find(&["post"], None).unwrap();
        assert!(set.live().is_empty());
        assert_eq!(set.templates().len(), 1);
    }

    #[test]
    fn find_all_orders_by_document_position() {
        let arena = parse(
            r#"<div data-b="post" data-id="1"></div><div data-b="post" data-id="2"></div>"#,
        )
        .unwrap();
        let all = arena.find_all("post", None);
        let ids: Vec<&str> = all
            .live()
            .iter()
            .filter_map(|&id| arena.element(id).and_then(|e| e.instance_id()))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
