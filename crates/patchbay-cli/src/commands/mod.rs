//! CLI command implementations.

pub mod common;
pub mod demo;
pub mod inspect;
pub mod nodes;
pub mod play;
pub mod render;
