//! Weft Transform - Recorded transformations and channel addressing
//!
//! The replication half of weft's view layer:
//! - A closed, typed operation vocabulary ([`Op`]) shared by recording and
//!   replay
//! - The `{ id, calls }` wire format with `[op, [args], [nested]]` triples
//! - [`Recorder`], a presenter-shaped API that records instead of mutating
//! - [`ChannelAddress`], the deterministic subscribe/publish address builder
//!
//! # Example
//!
//! ```
//! use weft_presenter::DataObject;
//! use weft_transform::Recorder;
//!
//! let mut recorder = Recorder::new();
//! recorder.present(vec![DataObject::new().with_scalar("id", 1)]);
//! let transformation = recorder.finalize("t1");
//! assert_eq!(transformation.calls[0].op.name(), "present");
//! ```

#![warn(unreachable_pub)]

pub mod channel;
pub mod error;
pub mod instruction;
pub mod recorder;

pub use channel::ChannelAddress;
pub use error::TransformError;
pub use instruction::{Call, Op, Transformation};
pub use recorder::Recorder;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
