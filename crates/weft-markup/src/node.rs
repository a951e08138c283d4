//! Node types for the markup arena
//!
//! Provides [`Node`] and its parts:
//! - [`Element`] with typed [`Attributes`] (classes, styles, booleans, plain)
//! - [`Binding`] parsed from `data-b="name:channel..."`
//! - Version labels (`data-v`), instance ids (`data-id`), correlation ids (`data-t`)

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::arena::NodeId;

/// Version label applied when a node carries no explicit `data-v`
pub const DEFAULT_VERSION: &str = "default";

/// Reserved version rendered when a scope's backing collection is empty
pub const EMPTY_VERSION: &str = "empty";

/// Attribute names with presence-only semantics in HTML
const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "autofocus", "checked", "disabled", "hidden", "multiple", "readonly", "required", "selected",
];

/// Binding label parsed from a `data-b` attribute
///
/// The attribute value is colon-delimited: the first segment is the binding
/// name, any remaining segments form the channel path that disambiguates
/// multiple instances of the same name on one page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    /// Binding name (scope or prop identifier)
    pub name: String,
    /// Channel qualifier path, empty when unqualified
    pub channel: Vec<String>,
}

impl Binding {
    /// Parse a `data-b` value such as `post` or `post:foo:bar`
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut segments = value.split(':').map(str::to_string);
        let name = segments.next().unwrap_or_default();
        Self {
            name,
            channel: segments.collect(),
        }
    }

    /// Render back to the `data-b` wire form
    #[must_use]
    pub fn to_attribute(&self) -> String {
        if self.channel.is_empty() {
            self.name.clone()
        } else {
            let mut out = self.name.clone();
            for segment in &self.channel {
                out.push(':');
                out.push_str(segment);
            }
            out
        }
    }
}

/// Typed attribute storage
///
/// `class` and `style` get structured representations so binding can merge
/// key-wise instead of overwriting; boolean attributes are a presence set;
/// everything else is a plain string map in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes {
    /// Class list, insertion ordered
    pub classes: IndexSet<String>,
    /// Inline style map, insertion ordered
    pub styles: IndexMap<String, String>,
    /// Present boolean attributes
    pub booleans: IndexSet<String>,
    /// All remaining attributes
    pub plain: IndexMap<String, String>,
}

impl Attributes {
    /// Create an empty attribute set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the name has presence-only semantics
    #[inline]
    #[must_use]
    pub fn is_boolean(name: &str) -> bool {
        BOOLEAN_ATTRIBUTES.contains(&name)
    }

    /// Store one attribute, routing it to the right structured slot
    pub fn insert(&mut self, name: &str, value: &str) {
        match name {
            "class" => {
                for class in value.split_whitespace() {
                    self.classes.insert(class.to_string());
                }
            }
            "style" => {
                for (key, val) in parse_style(value) {
                    self.styles.insert(key, val);
                }
            }
            _ if Self::is_boolean(name) => {
                self.booleans.insert(name.to_string());
            }
            _ => {
                self.plain.insert(name.to_string(), value.to_string());
            }
        }
    }

    /// Read a plain attribute
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.plain.get(name).map(String::as_str)
    }

    /// Render the inline style map back to attribute form
    #[must_use]
    pub fn style_attribute(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.styles {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("; ");
        }
        out.trim_end().to_string()
    }
}

/// Parse an inline style declaration list into ordered key/value pairs
fn parse_style(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|decl| {
            let decl = decl.trim();
            if decl.is_empty() {
                return None;
            }
            let (key, val) = decl.split_once(':')?;
            Some((key.trim().to_string(), val.trim().to_string()))
        })
        .collect()
}

/// An element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name, lowercased
    pub tag: String,
    /// Typed attributes
    pub attrs: Attributes,
    /// Binding label, if the element carries `data-b`
    pub binding: Option<Binding>,
    /// Version label, if the element carries `data-v`
    pub version: Option<String>,
    /// Whether this element is an inert template marker
    pub is_template: bool,
}

impl Element {
    /// Create a plain element with the given tag
    #[inline]
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attributes::new(),
            binding: None,
            version: None,
            is_template: false,
        }
    }

    /// Effective version, defaulting when `data-v` is absent
    #[inline]
    #[must_use]
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// Bound object id (`data-id`)
    #[inline]
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.attrs.get("data-id")
    }

    /// Transformation correlation id (`data-t`)
    #[inline]
    #[must_use]
    pub fn transform_id(&self) -> Option<&str> {
        self.attrs.get("data-t")
    }

    /// Subscription channel (`data-c`)
    #[inline]
    #[must_use]
    pub fn subscription(&self) -> Option<&str> {
        self.attrs.get("data-c")
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with attributes and children
    Element(Element),
    /// A run of text
    Text(String),
}

/// One node in the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Payload
    pub kind: NodeKind,
    /// Parent slot, `None` for the root and detached nodes
    pub parent: Option<NodeId>,
    /// Child slots in document order
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create a detached element node
    #[inline]
    #[must_use]
    pub fn element(element: Element) -> Self {
        Self {
            kind: NodeKind::Element(element),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a detached text node
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text(text.into()),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Element payload, if this is an element
    #[inline]
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    /// Mutable element payload, if this is an element
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }
}
