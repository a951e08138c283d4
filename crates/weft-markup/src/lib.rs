//! Weft Markup - Node model and templates
//!
//! The markup layer that the rest of weft binds against:
//! - Parses an HTML subset into an arena of nodes
//! - Recognizes binding attributes (`data-b`, `data-v`, `data-c`, `data-id`, `data-t`)
//! - Extracts scope/prop regions into inert templates
//! - Answers `find`/`find_all` queries with exact channel matching
//!
//! # Example
//!
//! ```
//! use weft_markup::{parse, extract_templates};
//!
//! let mut arena = parse(r#"<article data-b="post"><h1 data-b="title"></h1></article>"#).unwrap();
//! let root = arena.root();
//! extract_templates(&mut arena, root);
//!
//! // The live tree now holds only an inert template for "post".
//! let set = arena.find(&["post"], None).unwrap();
//! assert!(set.live().is_empty());
//! assert_eq!(set.templates().len(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod arena;
pub mod error;
pub mod node;
pub mod parse;
pub mod query;
pub mod render;
pub mod template;

pub use arena::{NodeArena, NodeId};
pub use error::MarkupError;
pub use node::{Attributes, Binding, Element, Node, NodeKind, DEFAULT_VERSION, EMPTY_VERSION};
pub use parse::{parse, parse_fragment};
pub use query::{ChannelFilter, NodeSet};
pub use render::{render, render_children, render_node};
pub use template::{clone_template, extract_templates};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
