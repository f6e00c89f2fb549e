//! Reversible graph edits and the linear history that records them.
//!
//! Each structural edit is a [`Command`] that captures what it needs to undo
//! itself and applies the edit through the [`GraphController`]. [`History`]
//! keeps a bounded stack of performed commands with a cursor; undoing moves
//! the cursor back, and performing a new command discards the redo tail.
//!
//! ```rust,ignore
//! let mut history = History::new();
//! history.perform(&mut controller, AddNodeCommand::new(NodeDescriptor::plugin("gain"), GraphId::Root, Position::default()))?;
//! history.undo(&mut controller)?;
//! history.redo(&mut controller)?; // same node id as before
//! ```
//!
//! [`GraphController`]: crate::GraphController

mod command;
mod history;

pub use command::{
    AddConnectionCommand, AddNodeCommand, Command, CommandGroup, RemoveConnectionCommand,
    RemoveNodeCommand, SetNodePropertyCommand,
};
pub use history::{DEFAULT_HISTORY_LIMIT, History};
