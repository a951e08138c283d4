//! Weft Realtime - Keeping rendered views current
//!
//! The server-side half of weft's live view pipeline:
//! - [`MutationRegistry`], recording which queries feed which view regions
//! - [`Dispatcher`], re-running registrations when a scope's data changes
//! - [`Broker`], fire-and-forget fan-out of transformations over channels
//! - [`replay`], applying received transformations to a local arena
//!
//! # Example
//!
//! ```
//! use weft_markup::{extract_templates, parse, render};
//! use weft_presenter::DataObject;
//! use weft_realtime::replay;
//! use weft_transform::Recorder;
//!
//! let mut arena = parse(
//!     r#"<section data-t="t1"><div data-b="post"><h1 data-b="title"></h1></div></section>"#,
//! )
//! .unwrap();
//! let root = arena.root();
//! extract_templates(&mut arena, root);
//!
//! let mut recorder = Recorder::new();
//! recorder.scope("post", |sub| {
//!     sub.present(vec![DataObject::new()
//!         .with_scalar("id", 1)
//!         .with_scalar("title", "hello")]);
//! });
//! assert!(replay::apply(&mut arena, &recorder.finalize("t1")));
//! assert!(render(&arena).contains("hello"));
//! ```

#![warn(unreachable_pub)]

pub mod broker;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod replay;

pub use broker::{Broker, TransformationMessage};
pub use config::RealtimeConfig;
pub use dispatch::{DispatchStats, Dispatcher, MutationHandler, MutationHandlers, QuerySource};
pub use error::RealtimeError;
pub use registry::{MutationRegistration, MutationRegistry};
pub use replay::{apply, subscriptions_in};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
