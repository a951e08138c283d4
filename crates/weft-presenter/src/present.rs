//! Presentation engine
//!
//! [`Presenter`] matches data objects to bound markup regions and writes
//! their values in. Presenting a collection reuses nodes by id, manufactures
//! missing instances from templates, reorders by moving (never re-rendering),
//! and falls back to the reserved `"empty"` version when the collection has
//! no elements.

use std::collections::HashMap;

use tracing::{debug, warn};
use weft_markup::template::extract_region;
use weft_markup::{
    clone_template, ChannelFilter, NodeArena, NodeId, NodeSet, EMPTY_VERSION,
};

use crate::binder::{Binder, BoundParts};
use crate::error::PresentError;
use crate::value::{DataObject, Value};

/// Class added to an instance whose presentation hook failed
pub const RENDER_FAILED_CLASS: &str = "render-failed";

/// Per-instance presentation hook, run after binding
///
/// Errors are attributed to the one instance and do not stop the batch.
pub type PresentHook<'h> =
    dyn FnMut(&mut Presenter<'_>, NodeId, &DataObject) -> Result<(), String> + 'h;

/// Outcome of presenting one collection
#[derive(Debug, Default)]
pub struct PresentOutcome {
    /// Final instances in presentation order
    pub instances: Vec<NodeId>,
    /// Per-instance failures, already marked in the markup
    pub failures: Vec<PresentError>,
}

impl PresentOutcome {
    /// Whether every instance presented cleanly
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Non-streaming form: the first scoped failure fails the whole render
    ///
    /// # Errors
    /// Returns the first per-instance failure, if any.
    pub fn into_result(mut self) -> Result<Vec<NodeId>, PresentError> {
        if self.failures.is_empty() {
            Ok(self.instances)
        } else {
            Err(self.failures.remove(0))
        }
    }
}

/// The presentation engine
///
/// Borrows the arena for the duration of one render or replay; binders are
/// consulted by scope name before raw object values.
pub struct Presenter<'a> {
    arena: &'a mut NodeArena,
    binders: Vec<&'a dyn Binder>,
    /// Nodes replaced by `use_version` during the current present pass
    swaps: HashMap<NodeId, NodeId>,
}

impl<'a> Presenter<'a> {
    /// Create a presenter over an arena
    #[must_use]
    pub fn new(arena: &'a mut NodeArena) -> Self {
        Self {
            arena,
            binders: Vec::new(),
            swaps: HashMap::new(),
        }
    }

    /// Register a binder, consulted for its scope name
    #[must_use]
    pub fn with_binder(mut self, binder: &'a dyn Binder) -> Self {
        self.binders.push(binder);
        self
    }

    /// The underlying arena
    #[inline]
    #[must_use]
    pub fn arena(&self) -> &NodeArena {
        self.arena
    }

    /// Mutable access to the underlying arena
    #[inline]
    pub fn arena_mut(&mut self) -> &mut NodeArena {
        self.arena
    }

    /// Find the first site for a binding path
    #[inline]
    #[must_use]
    pub fn find(&self, names: &[&str], channel: Option<&ChannelFilter>) -> Option<NodeSet> {
        self.arena.find(names, channel)
    }

    /// Find a binding path beneath a node
    #[inline]
    #[must_use]
    pub fn find_in(
        &self,
        node: NodeId,
        names: &[&str],
        channel: Option<&ChannelFilter>,
    ) -> Option<NodeSet> {
        self.arena.find_from(node, names, channel)
    }

    /// Present objects against the first site matching `names`
    ///
    /// # Errors
    /// Returns [`PresentError::UnknownBinding`] when the path resolves to
    /// nothing at all.
    pub fn present(
        &mut self,
        names: &[&str],
        objects: &[DataObject],
    ) -> Result<PresentOutcome, PresentError> {
        let set = self
            .find(names, None)
            .ok_or_else(|| PresentError::UnknownBinding(names.join(".")))?;
        Ok(self.present_into(&set, objects, None))
    }

    /// [`Presenter::present`] with a per-instance hook
    ///
    /// # Errors
    /// Returns [`PresentError::UnknownBinding`] when the path resolves to
    /// nothing at all. Hook failures are scoped to their instance and
    /// reported in the outcome instead.
    pub fn present_with(
        &mut self,
        names: &[&str],
        objects: &[DataObject],
        hook: &mut PresentHook<'_>,
    ) -> Result<PresentOutcome, PresentError> {
        let set = self
            .find(names, None)
            .ok_or_else(|| PresentError::UnknownBinding(names.join(".")))?;
        Ok(self.present_into(&set, objects, Some(hook)))
    }

    /// Present objects into an already-resolved site
    pub fn present_into(
        &mut self,
        set: &NodeSet,
        objects: &[DataObject],
        mut hook: Option<&mut PresentHook<'_>>,
    ) -> PresentOutcome {
        let mut outcome = PresentOutcome::default();
        let live: Vec<NodeId> = set.live().to_vec();
        let templates: Vec<NodeId> = set.templates().to_vec();

        let Some((parent, anchor_index)) = self.site_anchor(&live, &templates) else {
            return outcome;
        };

        if objects.is_empty() {
            self.present_empty(&live, &templates, &mut outcome);
            return outcome;
        }

        let used_version = self.used_version(&live);

        // Index reusable instances by their bound id.
        let mut discarded: Vec<NodeId> = Vec::new();
        let mut by_id: HashMap<String, NodeId> = HashMap::new();
        for &node in &live {
            if let Some(element) = self.arena.element(node) {
                if element.version_or_default() == EMPTY_VERSION {
                    // Placeholder for the zero-element state; data is back.
                    self.arena.detach(node);
                    discarded.push(node);
                    continue;
                }
                if let Some(id) = element.instance_id() {
                    by_id.insert(id.to_string(), node);
                }
            }
        }

        let mut claimed: Vec<NodeId> = Vec::new();
        for object in objects {
            let reusable = object
                .id()
                .and_then(|id| by_id.remove(&id))
                .filter(|&node| self.contains_required_props(node, object));

            let node = match reusable {
                Some(node) => node,
                None => {
                    let Some(marker) = self
                        .template_for(&templates, &used_version)
                        .or_else(|| self.fallback_template(&templates))
                    else {
                        warn!(?object, "no usable template for instance, skipping");
                        continue;
                    };
                    let Some(instance) = clone_template(self.arena, marker) else {
                        warn!("template marker has no content, skipping");
                        continue;
                    };
                    self.prepare_instance(instance);
                    let index = anchor_index + claimed.len();
                    self.arena.insert_child(parent, index, instance);
                    instance
                }
            };

            if let Err(error) = self.bind(node, object) {
                outcome.failures.push(error);
                claimed.push(node);
                continue;
            }

            let node = match hook.as_mut() {
                Some(hook) => self.run_hook(&mut **hook, node, object, &mut outcome),
                None => node,
            };
            claimed.push(node);
        }

        // Instances whose id is absent from the new collection go away.
        for (_, node) in by_id {
            self.arena.detach(node);
            discarded.push(node);
        }
        for &node in &live {
            if !claimed.contains(&node) && self.arena.node(node).parent.is_some() {
                self.arena.detach(node);
                discarded.push(node);
            }
        }

        self.reorder(parent, anchor_index, &claimed, &templates);
        // Slots are recycled only now; an earlier release would let clone
        // allocations reoccupy ids the bookkeeping above still consults.
        for node in discarded {
            self.arena.release(node);
        }
        outcome.instances = claimed;
        outcome
    }

    /// Bind one object's fields into a scope or prop node
    ///
    /// # Errors
    /// Returns [`PresentError::Markup`] when bound markup fails to parse.
    pub fn bind(&mut self, node: NodeId, object: &DataObject) -> Result<(), PresentError> {
        if let Some(id) = object.id() {
            if let Some(element) = self.arena.element_mut(node) {
                element.attrs.plain.insert("data-id".to_string(), id);
            }
        }

        let scope = self
            .arena
            .element(node)
            .and_then(|element| element.binding.as_ref())
            .map(|binding| binding.name.clone());
        let binder = scope.as_deref().and_then(|name| self.binder_for(name));

        for (key, value) in object.iter() {
            if key == "id" {
                continue;
            }
            let path: Vec<&str> = key.split('.').collect();
            let Some(set) = self.arena.find_from(node, &path, None) else {
                debug!(prop = key, "object field has no binding in this view");
                continue;
            };

            if let Value::List(items) = value {
                let items = items.clone();
                self.present_into(&set, &items, None);
                continue;
            }

            let bound = binder.and_then(|binder| binder.bind_prop(key, object));
            let targets: Vec<NodeId> = set.live().to_vec();
            for target in targets {
                self.apply_value(target, value, bound.as_ref())?;
            }
        }
        Ok(())
    }

    /// Switch a bound node to another version of its template
    ///
    /// No-op when the node already has that version or no sibling template
    /// carries it. Identity attributes (`data-id`, `data-t`) survive the
    /// swap; the caller's bound data is reapplied by `present`.
    ///
    /// # Errors
    /// Currently infallible; the `Result` keeps the operation vocabulary
    /// uniform for recording and replay.
    pub fn use_version(&mut self, node: NodeId, version: &str) -> Result<NodeId, PresentError> {
        let Some(element) = self.arena.element(node) else {
            return Ok(node);
        };
        if element.version_or_default() == version {
            return Ok(node);
        }
        let Some(binding_name) = element.binding.as_ref().map(|b| b.name.clone()) else {
            return Ok(node);
        };
        let Some((parent, index)) = self.arena.position(node) else {
            return Ok(node);
        };

        let marker = self.arena.node(parent).children.iter().copied().find(|&sibling| {
            self.arena.element(sibling).is_some_and(|element| {
                element.is_template
                    && element.version_or_default() == version
                    && element
                        .binding
                        .as_ref()
                        .is_some_and(|binding| binding.name == binding_name)
            })
        });
        let Some(marker) = marker else {
            debug!(version, binding = %binding_name, "no template for requested version");
            return Ok(node);
        };
        let Some(instance) = clone_template(self.arena, marker) else {
            return Ok(node);
        };

        self.prepare_instance(instance);
        let preserved: Vec<(String, String)> = ["data-id", "data-t"]
            .iter()
            .filter_map(|&name| {
                self.arena
                    .element(node)
                    .and_then(|element| element.attrs.get(name))
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        if let Some(element) = self.arena.element_mut(instance) {
            for (name, value) in preserved {
                element.attrs.plain.insert(name, value);
            }
        }

        self.arena.detach(node);
        self.arena.insert_child(parent, index, instance);
        self.swaps.insert(node, instance);
        Ok(instance)
    }

    /// Append parsed markup as the last children of a node
    ///
    /// # Errors
    /// Returns [`PresentError::Markup`] when the fragment fails to parse.
    pub fn append(&mut self, node: NodeId, markup: &str) -> Result<(), PresentError> {
        let fragment = weft_markup::parse_fragment(self.arena, markup)?;
        for child in fragment {
            self.arena.append_child(node, child);
        }
        Ok(())
    }

    /// Prepend parsed markup as the first children of a node
    ///
    /// # Errors
    /// Returns [`PresentError::Markup`] when the fragment fails to parse.
    pub fn prepend(&mut self, node: NodeId, markup: &str) -> Result<(), PresentError> {
        let fragment = weft_markup::parse_fragment(self.arena, markup)?;
        for (index, child) in fragment.into_iter().enumerate() {
            self.arena.insert_child(node, index, child);
        }
        Ok(())
    }

    /// Remove a node from the live tree, recycling its slots
    pub fn remove(&mut self, node: NodeId) {
        self.arena.release(node);
    }

    /// Set one attribute part with merge semantics
    ///
    /// `class` and `style` merge key-wise, boolean attributes toggle on
    /// truthiness, everything else replaces.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.apply_part(node, name, value);
    }

    /// Stamp the transformation correlation id on a node
    pub fn stamp_transform_id(&mut self, node: NodeId, id: &str) {
        if let Some(element) = self.arena.element_mut(node) {
            element
                .attrs
                .plain
                .insert("data-t".to_string(), id.to_string());
        }
    }

    /// Resolve a node through any `use_version` swaps
    #[must_use]
    pub fn resolve(&self, mut node: NodeId) -> NodeId {
        while let Some(&next) = self.swaps.get(&node) {
            node = next;
        }
        node
    }

    fn binder_for(&self, scope: &str) -> Option<&'a dyn Binder> {
        self.binders
            .iter()
            .copied()
            .find(|binder| binder.scope() == scope)
    }

    /// Run one instance hook, handling version swaps and failure marking
    fn run_hook(
        &mut self,
        hook: &mut PresentHook<'_>,
        node: NodeId,
        object: &DataObject,
        outcome: &mut PresentOutcome,
    ) -> NodeId {
        match hook(self, node, object) {
            Ok(()) => {
                let resolved = self.resolve(node);
                if resolved != node {
                    // The hook switched versions; rebind into the new clone.
                    if let Err(error) = self.bind(resolved, object) {
                        outcome.failures.push(error);
                    }
                }
                resolved
            }
            Err(reason) => {
                let resolved = self.resolve(node);
                warn!(reason, "presentation hook failed, marking instance");
                if let Some(element) = self.arena.element_mut(resolved) {
                    element.attrs.classes.insert(RENDER_FAILED_CLASS.to_string());
                }
                outcome.failures.push(PresentError::HookFailed {
                    instance_id: object.id(),
                    reason,
                });
                resolved
            }
        }
    }

    /// Remove live instances and surface the `"empty"` version, if any
    fn present_empty(
        &mut self,
        live: &[NodeId],
        templates: &[NodeId],
        outcome: &mut PresentOutcome,
    ) {
        let already_empty = live.iter().copied().find(|&node| {
            self.arena
                .element(node)
                .is_some_and(|element| element.version_or_default() == EMPTY_VERSION)
        });

        for &node in live {
            if Some(node) != already_empty {
                self.arena.release(node);
            }
        }
        if let Some(node) = already_empty {
            outcome.instances.push(node);
            return;
        }

        let empty_marker = templates.iter().copied().find(|&marker| {
            self.arena
                .element(marker)
                .is_some_and(|element| element.version_or_default() == EMPTY_VERSION)
        });
        if let Some(marker) = empty_marker {
            if let Some((parent, index)) = self.arena.position(marker) {
                if let Some(instance) = clone_template(self.arena, marker) {
                    self.arena.insert_child(parent, index, instance);
                    outcome.instances.push(instance);
                }
            }
        }
    }

    /// Version currently in use at a site
    fn used_version(&self, live: &[NodeId]) -> String {
        live.iter()
            .filter_map(|&node| self.arena.element(node))
            .map(|element| element.version_or_default())
            .find(|&version| version != EMPTY_VERSION)
            .unwrap_or(weft_markup::DEFAULT_VERSION)
            .to_string()
    }

    fn template_for(&self, templates: &[NodeId], version: &str) -> Option<NodeId> {
        templates.iter().copied().find(|&marker| {
            self.arena
                .element(marker)
                .is_some_and(|element| element.version_or_default() == version)
        })
    }

    /// First template that is not the reserved `"empty"` version
    fn fallback_template(&self, templates: &[NodeId]) -> Option<NodeId> {
        templates.iter().copied().find(|&marker| {
            self.arena
                .element(marker)
                .is_some_and(|element| element.version_or_default() != EMPTY_VERSION)
        })
    }

    /// Insertion parent and index for new instances at a site
    fn site_anchor(&self, live: &[NodeId], templates: &[NodeId]) -> Option<(NodeId, usize)> {
        live.iter()
            .chain(templates.iter())
            .filter_map(|&node| self.arena.position(node))
            .min_by_key(|&(_, index)| index)
    }

    /// Best-effort template-compatibility check for node reuse
    ///
    /// A reused node must still carry a binding for every field the object
    /// wants to write. A prop removed by an earlier mutation fails the check
    /// and forces a fresh clone.
    fn contains_required_props(&self, node: NodeId, object: &DataObject) -> bool {
        object.keys().filter(|&key| key != "id").all(|key| {
            let path: Vec<&str> = key.split('.').collect();
            self.arena.find_from(node, &path, None).is_some()
        })
    }

    /// Extract nested scope templates inside a freshly cloned instance
    ///
    /// The clone carries nested scaffolding verbatim; carving it into
    /// markers keeps props bindable while nested collections present from
    /// templates.
    fn prepare_instance(&mut self, instance: NodeId) {
        let nested: Vec<NodeId> = self
            .arena
            .descendants(instance)
            .into_iter()
            .skip(1)
            .filter(|&id| {
                self.arena.is_scope(id)
                    && !self
                        .arena
                        .element(id)
                        .is_some_and(|element| element.is_template)
                    && !self.inside_template(instance, id)
            })
            .collect();
        for &region in &nested {
            // Only topmost nested scopes; deeper ones ride along inside.
            if self.is_topmost_within(instance, region, &nested) {
                extract_region(self.arena, region);
            }
        }
    }

    fn inside_template(&self, top: NodeId, mut node: NodeId) -> bool {
        while let Some(parent) = self.arena.node(node).parent {
            if parent == top {
                return false;
            }
            if self
                .arena
                .element(parent)
                .is_some_and(|element| element.is_template)
            {
                return true;
            }
            node = parent;
        }
        false
    }

    fn is_topmost_within(&self, top: NodeId, node: NodeId, candidates: &[NodeId]) -> bool {
        let mut current = node;
        while let Some(parent) = self.arena.node(current).parent {
            if parent == top {
                return true;
            }
            if candidates.contains(&parent) {
                return false;
            }
            current = parent;
        }
        true
    }

    /// Move surviving instances into collection order
    ///
    /// Only positions change; node identity is preserved.
    fn reorder(
        &mut self,
        parent: NodeId,
        anchor_index: usize,
        instances: &[NodeId],
        templates: &[NodeId],
    ) {
        for &node in instances {
            self.arena.detach(node);
        }
        let base = templates
            .iter()
            .filter_map(|&marker| self.arena.position(marker))
            .filter(|&(marker_parent, _)| marker_parent == parent)
            .map(|(_, index)| index)
            .min()
            .unwrap_or_else(|| anchor_index.min(self.arena.node(parent).children.len()));
        for (offset, &node) in instances.iter().enumerate() {
            self.arena.insert_child(parent, base + offset, node);
        }
    }

    /// Write one value (optionally transformed by a binder) into a node
    fn apply_value(
        &mut self,
        node: NodeId,
        value: &Value,
        bound: Option<&BoundParts>,
    ) -> Result<(), PresentError> {
        // Base content and parts come from the raw value shape.
        let (base_content, base_parts): (Option<String>, Vec<(String, String)>) = match value {
            Value::Scalar(_) => (Some(value.display()), Vec::new()),
            Value::Object(parts) => {
                let content = parts.get("content").map(Value::display);
                let rest = parts
                    .iter()
                    .filter(|(name, _)| *name != "content")
                    .map(|(name, part)| (name.to_string(), part.display()))
                    .collect();
                (content, rest)
            }
            Value::List(_) => (None, Vec::new()),
        };

        let (content, parts) = match bound {
            Some(bound) => {
                let content = bound.content.clone().or(base_content);
                let mut parts = base_parts;
                for (name, part) in &bound.parts {
                    parts.push((name.clone(), part.clone()));
                }
                (content, parts)
            }
            None => (base_content, base_parts),
        };

        if let Some(content) = content {
            self.set_content(node, &content)?;
        }
        for (name, part) in parts {
            self.apply_part(node, &name, &part);
        }
        Ok(())
    }

    /// Replace a node's inner markup
    fn set_content(&mut self, node: NodeId, markup: &str) -> Result<(), PresentError> {
        let children = weft_markup::parse_fragment(self.arena, markup)?;
        let children = if children.is_empty() && !markup.is_empty() {
            vec![self.arena.alloc(weft_markup::Node::text(markup))]
        } else {
            children
        };
        self.arena.set_children(node, children);
        Ok(())
    }

    /// Apply one named part with its merge semantics
    fn apply_part(&mut self, node: NodeId, name: &str, value: &str) {
        if name == "content" {
            if let Err(error) = self.set_content(node, value) {
                warn!(%error, "content part failed to parse, skipping");
            }
            return;
        }
        let Some(element) = self.arena.element_mut(node) else {
            return;
        };
        match name {
            "class" | "style" => element.attrs.insert(name, value),
            _ if weft_markup::Attributes::is_boolean(name) => {
                let truthy = !(value.is_empty() || value == "false");
                if truthy {
                    element.attrs.booleans.insert(name.to_string());
                } else {
                    element.attrs.booleans.shift_remove(name);
                }
            }
            _ => {
                element
                    .attrs
                    .plain
                    .insert(name.to_string(), value.to_string());
            }
        }
    }
}

impl Drop for Presenter<'_> {
    fn drop(&mut self) {
        // Every swap key is an old instance detached by use_version, kept
        // allocated until now so resolve() can follow swap chains.
        let stale: Vec<NodeId> = self.swaps.keys().copied().collect();
        for node in stale {
            self.arena.release(node);
        }
    }
}
