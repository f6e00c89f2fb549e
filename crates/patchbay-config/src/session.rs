//! Session documents: engine settings plus a whole root graph.

use std::path::Path;

use patchbay_core::{GraphController, GraphEngine, GraphSnapshot, History, ProcessorFactory};
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::error::ConfigError;
use crate::file;

/// A saved graph and the settings it runs with.
///
/// The graph section is the controller's own [`GraphSnapshot`], so a
/// capture followed by [`apply`](Session::apply) restores the same node ids,
/// arcs, positions, flags, and processor state.
///
/// # TOML Format
///
/// ```toml
/// name = "Tone"
/// description = "A 440 Hz sine on the left output"
///
/// [engine]
/// sample_rate = 48000
/// block_size = 256
///
/// [[graph.nodes]]
/// id = 1
/// name = "sine"
/// descriptor = { kind = "plugin", id = "sine" }
///
/// [[graph.nodes]]
/// id = 2
/// name = "Audio Output"
/// descriptor = { kind = "audio_output", channels = 2 }
///
/// [[graph.connections]]
/// source = 1
/// source_port = 0
/// dest = 2
/// dest_port = 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Name of the session.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Root graph.
    #[serde(default)]
    pub graph: GraphSnapshot,
}

impl Default for Session {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Session {
    /// Empty session with default engine settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            engine: EngineConfig::default(),
            graph: GraphSnapshot::default(),
        }
    }

    /// Set the description (builder pattern).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the engine settings (builder pattern).
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Set the graph (builder pattern).
    pub fn with_graph(mut self, graph: GraphSnapshot) -> Self {
        self.graph = graph;
        self
    }

    /// Captures the controller's root graph and render settings.
    ///
    /// The history limit is not part of the controller and keeps its default.
    pub fn capture(name: impl Into<String>, controller: &GraphController) -> Self {
        let render = controller.config();
        Self::new(name)
            .with_engine(EngineConfig {
                sample_rate: render.sample_rate.round() as u32,
                block_size: render.block_size,
                max_events_per_block: render.max_events_per_block,
                ..EngineConfig::default()
            })
            .with_graph(controller.snapshot())
    }

    /// Load a session from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let session: Self = file::read_toml(path.as_ref())?;
        session.engine.validate()?;
        Ok(session)
    }

    /// Parse a session from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let session: Self = toml::from_str(toml_str)?;
        session.engine.validate()?;
        Ok(session)
    }

    /// Save the session to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        file::write_toml(path.as_ref(), self)
    }

    /// Serialize the session to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of nodes in the root context.
    pub fn len(&self) -> usize {
        self.graph.nodes.len()
    }

    /// True if the root context holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Loads the graph into `controller`, then prepares it for the session's
    /// engine settings.
    ///
    /// If the graph is rejected the controller keeps its current graph and
    /// settings.
    pub fn apply(&self, controller: &mut GraphController) -> Result<(), ConfigError> {
        self.engine.validate()?;
        controller.load_snapshot(&self.graph)?;
        controller.configure(self.engine.render_config())?;
        Ok(())
    }

    /// Builds a fresh controller running this session.
    pub fn controller(
        &self,
        factory: Box<dyn ProcessorFactory>,
    ) -> Result<GraphController, ConfigError> {
        self.engine.validate()?;
        let engine = GraphEngine::new(self.engine.render_config());
        let mut controller = GraphController::new(engine, factory);
        self.apply(&mut controller)?;
        Ok(controller)
    }

    /// Empty undo history with the session's depth limit.
    pub fn history(&self) -> History {
        History::with_limit(self.engine.history_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_core::{Connection, NodeDescriptor, NodeId, Position};

    const TONE: &str = r#"
name = "Tone"
description = "A 440 Hz sine on the left output"

[engine]
sample_rate = 44100
block_size = 256

[[graph.nodes]]
id = 1
name = "sine"
descriptor = { kind = "plugin", id = "sine" }
position = { x = 0.25, y = 0.5 }

[[graph.nodes]]
id = 2
name = "Audio Output"
descriptor = { kind = "audio_output", channels = 2 }
muted = true

[[graph.connections]]
source = 1
source_port = 0
dest = 2
dest_port = 0
"#;

    #[test]
    fn session_from_toml() {
        let session = Session::from_toml(TONE).unwrap();
        assert_eq!(session.name, "Tone");
        assert_eq!(session.engine.sample_rate, 44100);
        assert_eq!(session.engine.max_events_per_block, 1024);
        assert_eq!(session.len(), 2);

        let sine = &session.graph.nodes[0];
        assert_eq!(sine.descriptor, NodeDescriptor::plugin("sine"));
        assert_eq!(sine.position, Position::new(0.25, 0.5));
        assert!(sine.enabled);

        let out = &session.graph.nodes[1];
        assert_eq!(out.descriptor, NodeDescriptor::AudioOutput { channels: 2 });
        assert!(out.muted);

        assert_eq!(
            session.graph.connections,
            vec![Connection::new(NodeId::from_raw(1), 0, NodeId::from_raw(2), 0)]
        );
    }

    #[test]
    fn minimal_session() {
        let session = Session::from_toml(r#"name = "Blank""#).unwrap();
        assert!(session.is_empty());
        assert_eq!(session.engine, EngineConfig::default());
        assert!(session.description.is_none());
    }

    #[test]
    fn to_toml_roundtrip() {
        let session = Session::from_toml(TONE).unwrap();
        let text = session.to_toml().unwrap();
        assert_eq!(Session::from_toml(&text).unwrap(), session);
    }

    #[test]
    fn invalid_engine_is_rejected() {
        let err = Session::from_toml("name = \"x\"\n[engine]\nblock_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }

    #[test]
    fn history_uses_limit() {
        let session = Session::new("x").with_engine(EngineConfig {
            history_limit: 7,
            ..EngineConfig::default()
        });
        assert_eq!(session.history().limit(), 7);
    }
}
