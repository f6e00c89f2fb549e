//! Engine settings and session files for the patchbay graph engine.
//!
//! A [`Session`] is a TOML document holding an [`EngineConfig`] and the root
//! [`GraphSnapshot`](patchbay_core::GraphSnapshot) captured from a
//! [`GraphController`](patchbay_core::GraphController). Saving a session and
//! applying it to a fresh controller restores the graph losslessly: node ids,
//! arcs, positions, flags, processor state, and nested subgraphs.
//!
//! # Example
//!
//! ```rust,no_run
//! use patchbay_config::Session;
//! use patchbay_nodes::NodeRegistry;
//!
//! let session = Session::load("tone.toml").unwrap();
//! let controller = session.controller(Box::new(NodeRegistry::new())).unwrap();
//! let handle = controller.render_handle();
//!
//! let captured = Session::capture("tone (copy)", &controller);
//! captured.save("tone-copy.toml").unwrap();
//! ```

mod engine;
mod error;
mod file;
mod session;

pub use engine::{EngineConfig, MAX_BLOCK_SIZE, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
pub use error::ConfigError;
pub use session::Session;
