//! Weft Presenter - Presentation and binding engine
//!
//! Matches data objects to bound markup by name, version, and channel:
//! - `present` reuses, manufactures, reorders, and removes instances
//! - `bind` writes values and named attribute parts with merge semantics
//! - `use_version` swaps a node for another version's template
//! - [`Binder`] transforms raw values per scope before they land in markup
//!
//! # Example
//!
//! ```
//! use weft_markup::{parse, extract_templates};
//! use weft_presenter::{DataObject, Presenter};
//!
//! let mut arena = parse(r#"<article data-b="post"><h1 data-b="title"></h1></article>"#).unwrap();
//! let root = arena.root();
//! extract_templates(&mut arena, root);
//!
//! let mut presenter = Presenter::new(&mut arena);
//! let posts = vec![DataObject::new().with_scalar("id", 1).with_scalar("title", "hello")];
//! presenter.present(&["post"], &posts).unwrap();
//! ```

#![warn(unreachable_pub)]

pub mod binder;
pub mod error;
pub mod present;
pub mod value;

pub use binder::{Binder, BoundParts};
pub use error::PresentError;
pub use present::{PresentHook, PresentOutcome, Presenter, RENDER_FAILED_CLASS};
pub use value::{DataObject, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
