//! Linear undo/redo stack.

use crate::error::GraphError;
use crate::graph::GraphController;

use super::command::Command;

/// Default number of entries kept before the oldest are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Performed commands plus a cursor separating the undo side from the redo side.
pub struct History {
    entries: Vec<Box<dyn Command>>,
    cursor: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Empty history keeping [`DEFAULT_HISTORY_LIMIT`] entries.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Empty history keeping at most `limit` entries (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Maximum number of entries kept.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Changes the depth limit, dropping the oldest entries if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.trim();
    }

    /// Performs `command` and records it if it succeeded.
    pub fn perform(
        &mut self,
        controller: &mut GraphController,
        command: impl Command + 'static,
    ) -> Result<(), GraphError> {
        self.perform_boxed(controller, Box::new(command))
    }

    /// Boxed form of [`perform`](Self::perform).
    ///
    /// A failed command is not recorded and leaves the redo tail intact.
    pub fn perform_boxed(
        &mut self,
        controller: &mut GraphController,
        mut command: Box<dyn Command>,
    ) -> Result<(), GraphError> {
        command.perform(controller)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("history_perform: {}", command.name());

        self.entries.truncate(self.cursor);
        self.entries.push(command);
        self.cursor = self.entries.len();
        self.trim();
        Ok(())
    }

    /// Undoes the newest performed entry. `Ok(false)` if there is nothing to undo.
    ///
    /// On failure the cursor does not move.
    pub fn undo(&mut self, controller: &mut GraphController) -> Result<bool, GraphError> {
        let Some(index) = self.cursor.checked_sub(1) else {
            return Ok(false);
        };
        let entry = &mut self.entries[index];
        entry.undo(controller)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("history_undo: {}", entry.name());

        self.cursor = index;
        Ok(true)
    }

    /// Re-performs the oldest undone entry. `Ok(false)` if there is nothing to redo.
    ///
    /// On failure the cursor does not move.
    pub fn redo(&mut self, controller: &mut GraphController) -> Result<bool, GraphError> {
        let Some(entry) = self.entries.get_mut(self.cursor) else {
            return Ok(false);
        };
        entry.perform(controller)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("history_redo: {}", entry.name());

        self.cursor += 1;
        Ok(true)
    }

    /// True if an entry can be undone.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// True if an entry can be redone.
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Name of the entry `undo` would revert.
    pub fn undo_name(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .map(|index| self.entries[index].name())
    }

    /// Name of the entry `redo` would re-apply.
    pub fn redo_name(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(|entry| entry.name())
    }

    /// Number of undoable entries.
    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    /// Total number of recorded entries, both sides of the cursor.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    fn trim(&mut self) {
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
            self.cursor = self.cursor.saturating_sub(excess);
        }
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEngine, GraphId, NodeDescriptor, NodeProperty, Position, RenderConfig};
    use crate::test_support::factory;
    use crate::undo::{AddConnectionCommand, AddNodeCommand, SetNodePropertyCommand};

    fn controller() -> GraphController {
        GraphController::new(GraphEngine::new(RenderConfig::default()), factory())
    }

    fn add_cmd(plugin: &str) -> AddNodeCommand {
        AddNodeCommand::new(NodeDescriptor::plugin(plugin), GraphId::Root, Position::default())
    }

    #[test]
    fn empty_history_has_nothing_to_do() {
        let mut c = controller();
        let mut history = History::new();
        assert_eq!(history.undo(&mut c), Ok(false));
        assert_eq!(history.redo(&mut c), Ok(false));
        assert!(!history.can_undo());
        assert!(history.undo_name().is_none());
    }

    #[test]
    fn failed_perform_is_not_recorded() {
        let mut c = controller();
        let mut history = History::new();
        assert!(history.perform(&mut c, add_cmd("missing")).is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn perform_truncates_redo_tail() {
        let mut c = controller();
        let mut history = History::new();
        history.perform(&mut c, add_cmd("const")).unwrap();
        history.perform(&mut c, add_cmd("gain")).unwrap();
        assert_eq!(history.undo(&mut c), Ok(true));
        assert!(history.can_redo());

        history.perform(&mut c, add_cmd("const")).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(c.engine().node_count(), 2);
    }

    #[test]
    fn limit_drops_oldest() {
        let mut c = controller();
        let mut history = History::with_limit(2);
        for _ in 0..3 {
            history.perform(&mut c, add_cmd("const")).unwrap();
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo_count(), 2);
        assert_eq!(history.undo(&mut c), Ok(true));
        assert_eq!(history.undo(&mut c), Ok(true));
        assert_eq!(history.undo(&mut c), Ok(false));
        assert_eq!(c.engine().node_count(), 1);
    }

    #[test]
    fn failed_undo_keeps_cursor() {
        let mut c = controller();
        let mut history = History::new();
        let mut cmd = add_cmd("const");
        cmd.perform(&mut c).unwrap();
        let id = cmd.node_id().unwrap();
        let mute = SetNodePropertyCommand::new(&c, id, NodeProperty::Muted(true)).unwrap();
        history.perform_boxed(&mut c, Box::new(mute)).unwrap();
        c.remove_node(id).unwrap();

        assert!(matches!(
            history.undo(&mut c),
            Err(GraphError::UndoStateUnavailable(_))
        ));
        assert!(history.can_undo());
        assert_eq!(history.undo_name(), Some("Mute node"));
    }

    #[test]
    fn undo_redo_walks_both_ways() {
        let mut c = controller();
        let mut history = History::new();
        let mut a = add_cmd("const");
        a.perform(&mut c).unwrap();
        let mut b = add_cmd("gain");
        b.perform(&mut c).unwrap();
        let (a, b) = (a.node_id().unwrap(), b.node_id().unwrap());
        let start = c.snapshot();

        history
            .perform(&mut c, AddConnectionCommand::new(a, 0, b, 0, GraphId::Root))
            .unwrap();
        let bypass = SetNodePropertyCommand::new(&c, b, NodeProperty::Enabled(false)).unwrap();
        history.perform(&mut c, bypass).unwrap();
        let end = c.snapshot();

        while history.undo(&mut c).unwrap() {}
        assert_eq!(c.snapshot(), start);
        while history.redo(&mut c).unwrap() {}
        assert_eq!(c.snapshot(), end);
    }
}
