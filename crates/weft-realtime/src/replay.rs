//! Transformation replay
//!
//! Applies a received transformation to a local arena by replaying its
//! calls through the same presentation engine the server used to record
//! them. A transformation whose region is no longer in the document is
//! dropped silently; unknown operations are skipped individually.

use tracing::{debug, warn};
use weft_markup::{NodeArena, NodeId, NodeSet};
use weft_presenter::{DataObject, Presenter};
use weft_transform::{Call, Op, Transformation};

/// Replay a transformation against the region it addresses
///
/// The region is the node whose `data-t` attribute equals the
/// transformation's id; top-level calls run against that node's own site.
/// Returns whether a region was found and the calls applied.
pub fn apply(arena: &mut NodeArena, transformation: &Transformation) -> bool {
    let Some(region) = find_region(arena, &transformation.id) else {
        debug!(id = %transformation.id, "no region for transformation, dropping");
        return false;
    };
    let site = site_of(arena, region);
    let mut presenter = Presenter::new(arena);
    apply_group(&mut presenter, &site, &transformation.calls);
    true
}

/// Channels the document's regions subscribe to, in document order
///
/// Collects every `data-c` value in the arena, deduplicated. This is what
/// a client subscribes with after loading a rendered page.
#[must_use]
pub fn subscriptions_in(arena: &NodeArena) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for node in arena.descendants(arena.root()) {
        let Some(channel) = arena.element(node).and_then(|element| element.subscription())
        else {
            continue;
        };
        if !channels.iter().any(|existing| existing == channel) {
            channels.push(channel.to_string());
        }
    }
    channels
}

fn find_region(arena: &NodeArena, id: &str) -> Option<NodeId> {
    arena.descendants(arena.root()).into_iter().find(|&node| {
        arena
            .element(node)
            .is_some_and(|element| element.transform_id() == Some(id))
    })
}

/// The site a region node belongs to
///
/// A bound region's site is its siblings of the same binding plus their
/// templates, so `present` can reuse, clone, and remove. An unbound region
/// is a plain container; its calls narrow in with `scope`/`prop` first.
fn site_of(arena: &NodeArena, region: NodeId) -> NodeSet {
    let name = arena
        .element(region)
        .and_then(|element| element.binding.as_ref())
        .map(|binding| binding.name.clone());
    match (arena.node(region).parent, name) {
        (Some(parent), Some(name)) => arena.find_all_from(parent, &name, None),
        _ => NodeSet::from_parts(vec![region], Vec::new()),
    }
}

fn single(node: NodeId) -> NodeSet {
    NodeSet::from_parts(vec![node], Vec::new())
}

fn apply_group(presenter: &mut Presenter<'_>, set: &NodeSet, calls: &[Call]) {
    let mut live: Vec<NodeId> = set.live().to_vec();
    let templates: Vec<NodeId> = set.templates().to_vec();

    for call in calls {
        match &call.op {
            Op::Present(objects) => {
                let site = NodeSet::from_parts(live.clone(), templates.clone());
                if call.nested.iter().all(Vec::is_empty) {
                    live = presenter.present_into(&site, objects, None).instances;
                } else {
                    // Nested groups pair with instances by data order. The
                    // object reference identifies its index even when a bind
                    // failure keeps an earlier instance's hook from running.
                    let groups = &call.nested;
                    let mut hook =
                        |presenter: &mut Presenter<'_>, node: NodeId, object: &DataObject| {
                            let position = objects
                                .iter()
                                .position(|candidate| std::ptr::eq(candidate, object));
                            if let Some(group) = position.and_then(|at| groups.get(at)) {
                                apply_group(presenter, &single(node), group);
                            }
                            Ok(())
                        };
                    live = presenter
                        .present_into(&site, objects, Some(&mut hook))
                        .instances;
                }
            }
            Op::Repeat(objects) => {
                for (position, object) in objects.iter().enumerate() {
                    let Some(&node) = live.get(position) else {
                        debug!(position, "repeat has more objects than instances");
                        break;
                    };
                    if let Err(error) = presenter.bind(node, object) {
                        warn!(%error, "repeat bind failed, skipping instance");
                        continue;
                    }
                    let node = presenter.resolve(node);
                    if let Some(group) = call.nested.get(position) {
                        apply_group(presenter, &single(node), group);
                    }
                }
            }
            Op::Bind(object) => {
                for &node in &live {
                    if let Err(error) = presenter.bind(node, object) {
                        warn!(%error, "bind failed during replay");
                    }
                }
            }
            Op::Use(version) => {
                for node in &mut live {
                    match presenter.use_version(*node, version) {
                        Ok(swapped) => *node = swapped,
                        Err(error) => warn!(%error, "version switch failed during replay"),
                    }
                }
            }
            Op::Append(markup) => {
                for &node in &live {
                    if let Err(error) = presenter.append(node, markup) {
                        warn!(%error, "append failed during replay");
                    }
                }
            }
            Op::Prepend(markup) => {
                for &node in &live {
                    if let Err(error) = presenter.prepend(node, markup) {
                        warn!(%error, "prepend failed during replay");
                    }
                }
            }
            Op::Remove => {
                for &node in &live {
                    presenter.remove(node);
                }
                live.clear();
            }
            Op::Attr { name, value } => {
                for &node in &live {
                    presenter.set_attr(node, name, value);
                }
            }
            Op::Scope(name) | Op::Prop(name) => {
                for &node in &live {
                    let Some(sub) = presenter.find_in(node, &[name], None) else {
                        debug!(name, "narrowing target absent, skipping");
                        continue;
                    };
                    for group in &call.nested {
                        apply_group(presenter, &sub, group);
                    }
                }
            }
            Op::Unknown { name, .. } => {
                warn!(op = %name, "unknown operation in transformation, skipping");
            }
        }
    }
}
