//! Typed connection points.
//!
//! A node's ports are fixed when the node is constructed: either by its
//! processor's [`ports()`](crate::Processor::ports) or by the built-in layout
//! of a boundary/subgraph node. A port's *index* is its position in the full
//! list; its *channel* is its position among ports of the same type and
//! direction, which is what locates its buffer in a render plan.

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Signal type carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    /// One channel of sample-rate audio.
    Audio,
    /// Timestamped MIDI events.
    Event,
    /// One control value per block.
    Control,
}

/// Whether a port receives or produces data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    /// Receives data from upstream.
    Input,
    /// Produces data for downstream.
    Output,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Audio => "audio",
            Self::Event => "event",
            Self::Control => "control",
        })
    }
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// Declaration of one port in a [`PortLayout`].
#[derive(Debug, Clone, PartialEq)]
pub struct PortSpec {
    /// Display name.
    pub name: String,
    /// Signal type.
    pub kind: PortType,
    /// Direction.
    pub direction: PortDirection,
    /// Value an unconnected control input reads. Ignored for other types.
    pub default: f32,
}

/// Ordered list of a node's ports.
///
/// ```rust
/// use patchbay_core::{PortDirection, PortLayout, PortType};
///
/// let layout = PortLayout::new()
///     .audio_in("In L")
///     .audio_in("In R")
///     .control_in("Gain", 1.0)
///     .audio_out("Out L")
///     .audio_out("Out R");
///
/// assert_eq!(layout.len(), 5);
/// assert_eq!(layout.count(PortType::Audio, PortDirection::Input), 2);
/// assert_eq!(layout.channel(4), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortLayout {
    ports: Vec<PortSpec>,
}

impl PortLayout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, kind: PortType, direction: PortDirection, default: f32) -> Self {
        self.ports.push(PortSpec {
            name: name.to_string(),
            kind,
            direction,
            default,
        });
        self
    }

    /// Appends an audio input.
    pub fn audio_in(self, name: &str) -> Self {
        self.push(name, PortType::Audio, PortDirection::Input, 0.0)
    }

    /// Appends an audio output.
    pub fn audio_out(self, name: &str) -> Self {
        self.push(name, PortType::Audio, PortDirection::Output, 0.0)
    }

    /// Appends an event input.
    pub fn event_in(self, name: &str) -> Self {
        self.push(name, PortType::Event, PortDirection::Input, 0.0)
    }

    /// Appends an event output.
    pub fn event_out(self, name: &str) -> Self {
        self.push(name, PortType::Event, PortDirection::Output, 0.0)
    }

    /// Appends a control input that reads `default` while unconnected.
    pub fn control_in(self, name: &str, default: f32) -> Self {
        self.push(name, PortType::Control, PortDirection::Input, default)
    }

    /// Appends a control output.
    pub fn control_out(self, name: &str) -> Self {
        self.push(name, PortType::Control, PortDirection::Output, 0.0)
    }

    /// Total number of ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// True if the node has no ports.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Port at `index`.
    pub fn get(&self, index: usize) -> Option<&PortSpec> {
        self.ports.get(index)
    }

    /// Iterates ports in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PortSpec> {
        self.ports.iter()
    }

    /// Number of ports with the given type and direction.
    pub fn count(&self, kind: PortType, direction: PortDirection) -> usize {
        self.ports
            .iter()
            .filter(|p| p.kind == kind && p.direction == direction)
            .count()
    }

    /// Channel of port `index`: its position among ports sharing its type and direction.
    pub fn channel(&self, index: usize) -> Option<usize> {
        let spec = self.ports.get(index)?;
        Some(
            self.ports[..index]
                .iter()
                .filter(|p| p.kind == spec.kind && p.direction == spec.direction)
                .count(),
        )
    }

    /// Full port index of the `channel`-th port with the given type and direction.
    pub fn index_of(
        &self,
        kind: PortType,
        direction: PortDirection,
        channel: usize,
    ) -> Option<usize> {
        self.ports
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == kind && p.direction == direction)
            .nth(channel)
            .map(|(i, _)| i)
    }

    /// Defaults of the control inputs, in channel order.
    pub fn control_defaults(&self) -> impl Iterator<Item = f32> + '_ {
        self.ports
            .iter()
            .filter(|p| p.kind == PortType::Control && p.direction == PortDirection::Input)
            .map(|p| p.default)
    }
}

/// Resolved identity of one port on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Port {
    /// Owning node.
    pub node: NodeId,
    /// Index in the node's port list.
    pub index: u32,
    /// Direction.
    pub direction: PortDirection,
    /// Signal type.
    pub kind: PortType,
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} on {}",
            self.kind, self.direction, self.index, self.node
        )
    }
}

/// True iff `source` is an output, `dest` an input, and both carry the same type.
///
/// ```rust
/// use patchbay_core::{NodeId, Port, PortDirection, PortType, can_connect};
///
/// let out = Port { node: NodeId::from_raw(1), index: 0, direction: PortDirection::Output, kind: PortType::Audio };
/// let inp = Port { node: NodeId::from_raw(2), index: 0, direction: PortDirection::Input, kind: PortType::Audio };
/// assert!(can_connect(&out, &inp));
/// assert!(!can_connect(&inp, &out));
/// ```
pub fn can_connect(source: &Port, dest: &Port) -> bool {
    source.direction == PortDirection::Output
        && dest.direction == PortDirection::Input
        && source.kind == dest.kind
}
