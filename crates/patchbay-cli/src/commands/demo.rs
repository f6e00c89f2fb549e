//! Writes an example session file.

use std::path::PathBuf;

use clap::Args;
use patchbay_config::{EngineConfig, Session};
use patchbay_core::{GraphController, GraphEngine, GraphId, NodeDescriptor, NodeId, Position};
use patchbay_nodes::NodeRegistry;

#[derive(Args)]
pub struct DemoArgs {
    /// Session file to write
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Session name
    #[arg(long, default_value = "Demo")]
    name: String,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 48000)]
    sample_rate: u32,

    /// Block size in frames
    #[arg(long, default_value_t = 512)]
    block_size: usize,
}

pub fn run(args: DemoArgs) -> anyhow::Result<()> {
    let engine = EngineConfig {
        sample_rate: args.sample_rate,
        block_size: args.block_size,
        ..EngineConfig::default()
    };
    let session = demo_session(&args.name, engine)?;
    session.save(&args.output)?;

    println!("Wrote {}", args.output.display());
    println!(
        "  {} root nodes, {} connections",
        session.len(),
        session.graph.connections.len()
    );
    println!();
    println!("Try:");
    println!("  patchbay inspect {}", args.output.display());
    println!("  patchbay render {} demo.wav --seconds 2", args.output.display());
    Ok(())
}

/// Two sines mixed to stereo, one passing through a subgraph that halves it,
/// plus a MIDI octave-up path.
pub fn demo_session(name: &str, engine: EngineConfig) -> anyhow::Result<Session> {
    engine.validate()?;
    let mut c = GraphController::new(
        GraphEngine::new(engine.render_config()),
        Box::new(NodeRegistry::new()),
    );
    let root = GraphId::Root;

    let low = place(&mut c, NodeDescriptor::plugin("sine"), root, "Low Sine", 0.1, 0.2)?;
    let high = place(&mut c, NodeDescriptor::plugin("sine"), root, "High Sine", 0.1, 0.6)?;
    let sub = place(&mut c, NodeDescriptor::stereo_subgraph(), root, "Half Level", 0.4, 0.6)?;
    let mixer = place(&mut c, NodeDescriptor::plugin("mixer"), root, "Mixer", 0.7, 0.4)?;
    let out = place(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, root, "Main Out", 0.9, 0.4)?;

    c.set_parameter(low, 0, 220.0)?;
    c.set_parameter(low, 1, 0.4)?;
    c.set_parameter(high, 0, 330.0)?;
    c.set_parameter(high, 1, 0.4)?;
    c.set_parameter(mixer, 1, 0.8)?;

    let inner = GraphId::Subgraph(sub);
    let gain = place(&mut c, NodeDescriptor::plugin("gain"), inner, "Gain", 0.5, 0.5)?;
    let level = place(&mut c, NodeDescriptor::plugin("control"), inner, "Level", 0.5, 0.2)?;
    c.set_parameter(level, 0, 0.5)?;
    let sub_in = boundary(&c, inner, &NodeDescriptor::AudioInput { channels: 2 })?;
    let sub_out = boundary(&c, inner, &NodeDescriptor::AudioOutput { channels: 2 })?;
    for (src, sp, dst, dp) in [
        (sub_in, 0, gain, 0),
        (sub_in, 1, gain, 1),
        (level, 0, gain, 2),
        (gain, 3, sub_out, 0),
        (gain, 4, sub_out, 1),
    ] {
        c.add_connection(src, sp, dst, dp, inner)?;
    }

    for (src, sp, dst, dp) in [
        (low, 0, mixer, 0),
        (low, 0, mixer, 1),
        (high, 0, sub, 0),
        (high, 0, sub, 1),
        (sub, 3, mixer, 2),
        (sub, 4, mixer, 3),
        (mixer, 4, out, 0),
        (mixer, 5, out, 1),
    ] {
        c.add_connection(src, sp, dst, dp, root)?;
    }

    let midi_in = place(&mut c, NodeDescriptor::MidiInput, root, "MIDI In", 0.1, 0.9)?;
    let octave = place(&mut c, NodeDescriptor::plugin("transpose"), root, "Octave Up", 0.5, 0.9)?;
    let midi_out = place(&mut c, NodeDescriptor::MidiOutput, root, "MIDI Out", 0.9, 0.9)?;
    c.set_parameter(octave, 0, 12.0)?;
    c.add_connection(midi_in, 0, octave, 0, root)?;
    c.add_connection(octave, 1, midi_out, 0, root)?;

    Ok(Session::capture(name, &c)
        .with_description("Two sines mixed to stereo; the upper one runs through a half-level subgraph")
        .with_engine(engine))
}

fn place(
    c: &mut GraphController,
    descriptor: NodeDescriptor,
    graph: GraphId,
    name: &str,
    x: f64,
    y: f64,
) -> anyhow::Result<NodeId> {
    let id = c.add_node(descriptor, graph, Position::new(x, y))?;
    c.rename(id, name)?;
    Ok(id)
}

fn boundary(
    c: &GraphController,
    graph: GraphId,
    descriptor: &NodeDescriptor,
) -> anyhow::Result<NodeId> {
    c.engine()
        .nodes_in(graph)
        .find(|n| n.descriptor() == descriptor)
        .map(|n| n.id())
        .ok_or_else(|| anyhow::anyhow!("subgraph is missing its {descriptor:?} node"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_session_loads() {
        let session = demo_session("Demo", EngineConfig::default()).unwrap();
        assert_eq!(session.len(), 8);
        assert_eq!(session.graph.connections.len(), 10);
        let sub = session
            .graph
            .nodes
            .iter()
            .find(|n| n.name == "Half Level")
            .and_then(|n| n.subgraph.as_ref())
            .unwrap();
        assert_eq!(sub.connections.len(), 5);

        let controller = session.controller(Box::new(NodeRegistry::new())).unwrap();
        assert_eq!(controller.snapshot(), session.graph);
    }
}
