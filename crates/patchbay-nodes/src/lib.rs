//! Built-in processors and the node registry for the patchbay graph engine.
//!
//! This crate is the plugin-hosting side of the engine: it knows which
//! processors exist and how to build them, and exposes that through
//! [`patchbay_core::ProcessorFactory`] so the graph controller can instantiate
//! plugin nodes by id.
//!
//! # Features
//!
//! - **Node Discovery**: list every built-in processor with metadata
//! - **Factory Pattern**: create processors by id at runtime
//! - **Category System**: processors grouped by role (sources, levels, MIDI)
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::{GraphController, GraphEngine, GraphId, NodeDescriptor, Position};
//! use patchbay_nodes::{NodeCategory, NodeRegistry};
//!
//! let registry = NodeRegistry::new();
//! for info in registry.nodes_in_category(NodeCategory::Source) {
//!     println!("{}: {}", info.id, info.description);
//! }
//!
//! let mut controller = GraphController::new(GraphEngine::default(), Box::new(registry));
//! let sine = controller
//!     .add_node(NodeDescriptor::plugin("sine"), GraphId::Root, Position::default())
//!     .unwrap();
//! assert_eq!(controller.parameter(sine, 0), Some(440.0));
//! ```

mod gain;
mod midi;
mod smoothed;
mod sources;

pub use gain::{Gain, Mixer};
pub use midi::Transpose;
pub use smoothed::{DEFAULT_SMOOTHING_MS, SmoothedParam};
pub use sources::{Constant, Control, Sine};

use patchbay_core::{Processor, ProcessorError, ProcessorFactory};

/// Role of a built-in processor, for grouping in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Produces audio or control signals without inputs.
    Source,
    /// Scales or sums audio.
    Level,
    /// Transforms MIDI events.
    Midi,
}

impl NodeCategory {
    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Source => "Source",
            NodeCategory::Level => "Level",
            NodeCategory::Midi => "MIDI",
        }
    }
}

/// Describes a processor in the registry.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Plugin id used in `NodeDescriptor::Plugin` (lowercase, no spaces).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Category for organization.
    pub category: NodeCategory,
    /// Number of parameters.
    pub param_count: usize,
}

type Constructor = fn() -> Box<dyn Processor>;

struct RegistryEntry {
    info: NodeInfo,
    create: Constructor,
}

/// Registry of the built-in processors.
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Creates a registry with every built-in processor registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(6),
        };
        registry.register_builtin_nodes();
        registry
    }

    fn register_builtin_nodes(&mut self) {
        self.register(
            NodeInfo {
                id: "constant",
                name: "Constant",
                description: "DC audio source",
                category: NodeCategory::Source,
                param_count: 1,
            },
            || Box::new(Constant::new()),
        );

        self.register(
            NodeInfo {
                id: "sine",
                name: "Sine",
                description: "Sine oscillator",
                category: NodeCategory::Source,
                param_count: 2,
            },
            || Box::new(Sine::new()),
        );

        self.register(
            NodeInfo {
                id: "control",
                name: "Control",
                description: "Constant control value source",
                category: NodeCategory::Source,
                param_count: 1,
            },
            || Box::new(Control::new()),
        );

        self.register(
            NodeInfo {
                id: "gain",
                name: "Gain",
                description: "Stereo gain with a control input",
                category: NodeCategory::Level,
                param_count: 1,
            },
            || Box::new(Gain::new()),
        );

        self.register(
            NodeInfo {
                id: "mixer",
                name: "Mixer",
                description: "Two stereo buses summed with per-bus levels",
                category: NodeCategory::Level,
                param_count: 2,
            },
            || Box::new(Mixer::new()),
        );

        self.register(
            NodeInfo {
                id: "transpose",
                name: "Transpose",
                description: "Shifts MIDI notes by semitones",
                category: NodeCategory::Midi,
                param_count: 1,
            },
            || Box::new(Transpose::new()),
        );
    }

    /// Adds a processor. A later registration with the same id shadows the earlier one.
    pub fn register(&mut self, info: NodeInfo, create: Constructor) {
        self.entries.insert(0, RegistryEntry { info, create });
    }

    /// Metadata for `id`.
    pub fn get(&self, id: &str) -> Option<&NodeInfo> {
        self.entry(id).map(|e| &e.info)
    }

    /// Every registered processor, in registration order.
    pub fn all_nodes(&self) -> Vec<&NodeInfo> {
        let mut seen = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter().rev() {
            if self.entry(entry.info.id).is_some_and(|e| std::ptr::eq(e, entry)) {
                seen.push(&entry.info);
            }
        }
        seen
    }

    /// Processors in `category`, in registration order.
    pub fn nodes_in_category(&self, category: NodeCategory) -> Vec<&NodeInfo> {
        self.all_nodes()
            .into_iter()
            .filter(|info| info.category == category)
            .collect()
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.all_nodes().len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Creates the processor registered under `id`.
    pub fn create(&self, id: &str) -> Option<Box<dyn Processor>> {
        self.entry(id).map(|e| (e.create)())
    }

    fn entry(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.info.id == id)
    }
}

impl ProcessorFactory for NodeRegistry {
    fn create(&self, plugin_id: &str) -> Result<Box<dyn Processor>, ProcessorError> {
        NodeRegistry::create(self, plugin_id)
            .ok_or_else(|| ProcessorError::UnknownPlugin(plugin_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_builtins() {
        let registry = NodeRegistry::new();
        assert_eq!(registry.len(), 6);
        let ids: Vec<&str> = registry.all_nodes().iter().map(|i| i.id).collect();
        assert_eq!(
            ids,
            vec!["constant", "sine", "control", "gain", "mixer", "transpose"]
        );
    }

    #[test]
    fn categories() {
        let registry = NodeRegistry::new();
        assert_eq!(registry.nodes_in_category(NodeCategory::Source).len(), 3);
        assert_eq!(registry.nodes_in_category(NodeCategory::Level).len(), 2);
        assert_eq!(registry.nodes_in_category(NodeCategory::Midi).len(), 1);
        assert_eq!(NodeCategory::Midi.name(), "MIDI");
    }

    #[test]
    fn param_counts_match_processors() {
        let registry = NodeRegistry::new();
        for info in registry.all_nodes() {
            let processor = registry.create(info.id).unwrap();
            assert_eq!(processor.param_count(), info.param_count, "{}", info.id);
            for i in 0..info.param_count {
                let descriptor = processor.param_info(i).unwrap();
                assert_eq!(processor.get_param(i), descriptor.default, "{}", info.id);
            }
        }
    }

    #[test]
    fn factory_reports_unknown_ids() {
        let registry = NodeRegistry::new();
        let err = ProcessorFactory::create(&registry, "reverb").err().unwrap();
        assert_eq!(err, ProcessorError::UnknownPlugin("reverb".into()));
    }

    #[test]
    fn later_registration_shadows() {
        let mut registry = NodeRegistry::new();
        registry.register(
            NodeInfo {
                id: "gain",
                name: "Quiet Gain",
                description: "Gain starting at zero",
                category: NodeCategory::Level,
                param_count: 1,
            },
            || {
                let mut gain = Gain::new();
                gain.set_param(0, 0.0);
                Box::new(gain)
            },
        );
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.get("gain").map(|i| i.name), Some("Quiet Gain"));
        assert_eq!(registry.create("gain").unwrap().get_param(0), 0.0);
    }
}
