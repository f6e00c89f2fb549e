//! Integration tests for patchbay-core.
//!
//! Drives the public API the way a host does: edits through the controller
//! and undo history, rendering through a `RenderHandle`, including a render
//! thread running against concurrent edits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use patchbay_core::{
    AddConnectionCommand, AddNodeCommand, CommandGroup, EventBuffer, GraphController,
    GraphEngine, GraphError, GraphId, GraphSnapshot, History, MidiEvent, NodeDescriptor, NodeId,
    NodeProperty, PortLayout, Position, ProcessBuffers, Processor, ProcessorError,
    RemoveNodeCommand, RenderConfig, RenderHandle, SetNodePropertyCommand,
};

const BLOCK: usize = 64;

// ============================================================================
// Test processors
// ============================================================================

struct Dc(f32);

impl Processor for Dc {
    fn ports(&self) -> PortLayout {
        PortLayout::new().audio_out("Out")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        let n = buffers.num_samples();
        if let Some(out) = buffers.audio_output(0) {
            out[..n].fill(self.0);
        }
    }

    fn param_count(&self) -> usize {
        1
    }

    fn get_param(&self, _index: usize) -> f32 {
        self.0
    }

    fn set_param(&mut self, _index: usize, value: f32) {
        self.0 = value;
    }
}

/// Stereo gain: audio in 0-1, control in "Gain" (port 2), audio out 3-4.
struct StereoGain;

impl Processor for StereoGain {
    fn ports(&self) -> PortLayout {
        PortLayout::new()
            .audio_in("In L")
            .audio_in("In R")
            .control_in("Gain", 1.0)
            .audio_out("Out L")
            .audio_out("Out R")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        let n = buffers.num_samples();
        let gain = buffers.control_input(0).unwrap_or(1.0);
        for ch in 0..2 {
            if let Some((input, output)) = buffers.audio_channel(ch) {
                for (o, i) in output[..n].iter_mut().zip(&input[..n]) {
                    *o = i * gain;
                }
            }
        }
    }
}

/// Shifts every note event by a fixed number of semitones.
struct Transpose(i8);

impl Processor for Transpose {
    fn ports(&self) -> PortLayout {
        PortLayout::new().event_in("In").event_out("Out")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        if let Some((input, output)) = buffers.event_channel(0) {
            for event in input {
                let mut moved = *event;
                if event.is_note_on() || event.is_note_off() {
                    moved.data[1] = event.data[1].saturating_add_signed(self.0).min(127);
                }
                output.push(moved);
            }
        }
    }
}

/// Passes its event input through, then adds a note-on of its own at time 0.
struct Tag(u8);

impl Processor for Tag {
    fn ports(&self) -> PortLayout {
        PortLayout::new().event_in("In").event_out("Out")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        if let Some((input, output)) = buffers.event_channel(0) {
            output.merge_from(input);
            output.push(MidiEvent::note_on(0, 0, self.0, 100));
        }
    }
}

/// Publishes a fixed value on control output 1. Audio input 0 is ignored and
/// only exists to order the node after its source.
struct Level(f32);

impl Processor for Level {
    fn ports(&self) -> PortLayout {
        PortLayout::new().audio_in("Key").control_out("Level")
    }

    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process(&mut self, buffers: &mut ProcessBuffers<'_>) {
        buffers.set_control_output(0, self.0);
    }
}

fn create(id: &str) -> Result<Box<dyn Processor>, ProcessorError> {
    if let Some(note) = id.strip_prefix("tag:").and_then(|n| n.parse().ok()) {
        return Ok(Box::new(Tag(note)));
    }
    if let Some(value) = id.strip_prefix("level:").and_then(|v| v.parse().ok()) {
        return Ok(Box::new(Level(value)));
    }
    match id {
        "dc" => Ok(Box::new(Dc(1.0))),
        "half" => Ok(Box::new(Dc(0.5))),
        "gain" => Ok(Box::new(StereoGain)),
        "up5" => Ok(Box::new(Transpose(5))),
        other => Err(ProcessorError::UnknownPlugin(other.to_string())),
    }
}

fn controller() -> GraphController {
    let mut controller = GraphController::new(
        GraphEngine::new(RenderConfig {
            sample_rate: 48000.0,
            block_size: BLOCK,
            max_events_per_block: 128,
        }),
        Box::new(create),
    );
    controller.prepare(48000.0, BLOCK).unwrap();
    controller
}

fn add(controller: &mut GraphController, descriptor: NodeDescriptor, x: f64) -> NodeId {
    controller
        .add_node(descriptor, GraphId::Root, Position::new(x, 0.5))
        .unwrap()
}

fn render(handle: &RenderHandle, inputs: &[&[f32]], num_samples: usize) -> [Vec<f32>; 2] {
    let mut left = vec![0.0; num_samples];
    let mut right = vec![0.0; num_samples];
    let mut midi_out = EventBuffer::with_capacity(16);
    handle.render_block(inputs, &mut [&mut left, &mut right], &[], &mut midi_out, num_samples);
    [left, right]
}

fn add_command(descriptor: NodeDescriptor, position: Position) -> AddNodeCommand {
    AddNodeCommand::new(descriptor, GraphId::Root, position)
}

fn serialized(controller: &GraphController) -> String {
    serde_json::to_string(&controller.snapshot()).unwrap()
}

// ============================================================================
// 1. Mixing and routing
// ============================================================================

#[test]
fn fan_in_sums_sources() {
    let mut c = controller();
    let one = add(&mut c, NodeDescriptor::plugin("dc"), 0.1);
    let half = add(&mut c, NodeDescriptor::plugin("half"), 0.1);
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    c.add_connection(one, 0, out, 0, GraphId::Root).unwrap();
    c.add_connection(half, 0, out, 0, GraphId::Root).unwrap();

    let [left, right] = render(&c.render_handle(), &[], BLOCK);
    assert!(left.iter().all(|s| (*s - 1.5).abs() < 1e-6), "{left:?}");
    assert!(right.iter().all(|s| *s == 0.0));
}

#[test]
fn host_audio_flows_through_plugin() {
    let mut c = controller();
    let input = add(&mut c, NodeDescriptor::AudioInput { channels: 2 }, 0.1);
    let gain = add(&mut c, NodeDescriptor::plugin("gain"), 0.5);
    let level = add(&mut c, NodeDescriptor::plugin("half"), 0.3);
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    for ch in 0..2 {
        c.add_connection(input, ch, gain, ch, GraphId::Root).unwrap();
        c.add_connection(gain, 3 + ch, out, ch, GraphId::Root).unwrap();
    }
    // Audio output into a control input is not a legal arc.
    assert!(matches!(
        c.add_connection(level, 0, gain, 2, GraphId::Root),
        Err(GraphError::IncompatiblePorts { .. })
    ));

    let ramp: Vec<f32> = (0..200).map(|i| i as f32 / 200.0).collect();
    let [left, right] = render(&c.render_handle(), &[&ramp, &ramp], ramp.len());
    assert_eq!(left, ramp);
    assert_eq!(right, ramp);
}

#[test]
fn midi_is_transposed_and_keeps_timing() {
    let mut c = controller();
    let midi_in = add(&mut c, NodeDescriptor::MidiInput, 0.1);
    let up = add(&mut c, NodeDescriptor::plugin("up5"), 0.5);
    let midi_out = add(&mut c, NodeDescriptor::MidiOutput, 0.9);
    c.add_connection(midi_in, 0, up, 0, GraphId::Root).unwrap();
    c.add_connection(up, 1, midi_out, 0, GraphId::Root).unwrap();

    let events = [
        MidiEvent::note_on(10, 0, 60, 100),
        MidiEvent::control_change(70, 0, 7, 64),
        MidiEvent::note_off(100, 0, 60),
    ];
    let mut out = EventBuffer::with_capacity(16);
    let mut l = vec![0.0; 128];
    let mut r = vec![0.0; 128];
    c.render_handle()
        .render_block(&[], &mut [&mut l, &mut r], &events, &mut out, 128);

    let got: Vec<(u32, u8)> = out.iter().map(|e| (e.time, e.data[1])).collect();
    assert_eq!(got, vec![(10, 65), (70, 7), (100, 65)]);
}

#[test]
fn event_fan_in_merges_in_source_order() {
    let mut c = controller();
    // `late` has the lowest id but runs after `early`, because `head` feeds it.
    let late = add(&mut c, NodeDescriptor::plugin("tag:64"), 0.5);
    let early = add(&mut c, NodeDescriptor::plugin("tag:62"), 0.5);
    let midi_out = add(&mut c, NodeDescriptor::MidiOutput, 0.9);
    let head = add(&mut c, NodeDescriptor::plugin("tag:60"), 0.1);
    c.add_connection(head, 1, late, 0, GraphId::Root).unwrap();
    c.add_connection(late, 1, midi_out, 0, GraphId::Root).unwrap();
    c.add_connection(early, 1, midi_out, 0, GraphId::Root).unwrap();
    assert_eq!(
        c.engine().current_plan().order(),
        &[early, head, late, midi_out]
    );

    let mut out = EventBuffer::with_capacity(16);
    let mut l = vec![0.0; BLOCK];
    let mut r = vec![0.0; BLOCK];
    c.render_handle()
        .render_block(&[], &mut [&mut l, &mut r], &[], &mut out, BLOCK);

    // Same timestamp everywhere: `early` first, then `late` with what it forwarded.
    let notes: Vec<(u32, u8)> = out.iter().map(|e| (e.time, e.data[1])).collect();
    assert_eq!(notes, vec![(0, 62), (0, 60), (0, 64)]);
}

#[test]
fn control_fan_in_takes_last_source_in_order() {
    let mut c = controller();
    let late = add(&mut c, NodeDescriptor::plugin("level:0.25"), 0.3);
    let early = add(&mut c, NodeDescriptor::plugin("level:0.75"), 0.3);
    let dc = add(&mut c, NodeDescriptor::plugin("dc"), 0.1);
    let gain = add(&mut c, NodeDescriptor::plugin("gain"), 0.5);
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    c.add_connection(dc, 0, late, 0, GraphId::Root).unwrap();
    c.add_connection(dc, 0, gain, 0, GraphId::Root).unwrap();
    c.add_connection(dc, 0, gain, 1, GraphId::Root).unwrap();
    c.add_connection(late, 1, gain, 2, GraphId::Root).unwrap();
    c.add_connection(early, 1, gain, 2, GraphId::Root).unwrap();
    c.add_connection(gain, 3, out, 0, GraphId::Root).unwrap();
    c.add_connection(gain, 4, out, 1, GraphId::Root).unwrap();
    assert_eq!(
        c.engine().current_plan().order(),
        &[early, dc, late, gain, out]
    );

    let [left, right] = render(&c.render_handle(), &[], BLOCK);
    assert!(left.iter().all(|s| (*s - 0.25).abs() < 1e-6), "{left:?}");
    assert_eq!(left, right);
}

#[test]
fn chain_built_against_id_order_renders_in_first_block() {
    let mut c = controller();
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    let gains: Vec<NodeId> = (0..4)
        .map(|_| add(&mut c, NodeDescriptor::plugin("gain"), 0.5))
        .collect();
    let src = add(&mut c, NodeDescriptor::plugin("dc"), 0.1);

    // src -> gains[3] -> gains[2] -> gains[1] -> gains[0] -> out
    c.add_connection(src, 0, gains[3], 0, GraphId::Root).unwrap();
    for pair in gains.windows(2) {
        c.add_connection(pair[1], 3, pair[0], 0, GraphId::Root)
            .unwrap();
    }
    c.add_connection(gains[0], 3, out, 0, GraphId::Root).unwrap();

    let expected: Vec<NodeId> = std::iter::once(src)
        .chain(gains.iter().rev().copied())
        .chain(std::iter::once(out))
        .collect();
    assert_eq!(c.engine().current_plan().order(), expected.as_slice());

    // Fresh plan buffers start silent, so any stage running before its
    // source would leave this first block at zero.
    let [left, _] = render(&c.render_handle(), &[], BLOCK);
    assert!(left.iter().all(|s| *s == 1.0), "{left:?}");
}

// ============================================================================
// 2. Structural edits
// ============================================================================

#[test]
fn removing_middle_node_keeps_bypass_arc() {
    let mut c = controller();
    let a = add(&mut c, NodeDescriptor::plugin("gain"), 0.1);
    let b = add(&mut c, NodeDescriptor::plugin("gain"), 0.5);
    let d = add(&mut c, NodeDescriptor::plugin("gain"), 0.9);
    c.add_connection(a, 3, b, 0, GraphId::Root).unwrap();
    c.add_connection(b, 3, d, 0, GraphId::Root).unwrap();
    c.add_connection(a, 3, d, 0, GraphId::Root).unwrap();

    c.remove_node(b).unwrap();
    let arcs: Vec<_> = c.engine().connections(GraphId::Root).copied().collect();
    assert_eq!(arcs, vec![patchbay_core::Connection::new(a, 3, d, 0)]);
}

#[test]
fn rejected_cycle_leaves_arcs_unchanged() {
    let mut c = controller();
    let a = add(&mut c, NodeDescriptor::plugin("gain"), 0.1);
    let b = add(&mut c, NodeDescriptor::plugin("gain"), 0.5);
    let d = add(&mut c, NodeDescriptor::plugin("gain"), 0.9);
    c.add_connection(a, 3, b, 0, GraphId::Root).unwrap();
    c.add_connection(b, 3, d, 0, GraphId::Root).unwrap();
    let before = serialized(&c);
    let generation = c.engine().generation();

    assert_eq!(
        c.add_connection(d, 4, a, 1, GraphId::Root),
        Err(GraphError::WouldCreateCycle(GraphId::Root))
    );
    assert_eq!(serialized(&c), before);
    assert_eq!(c.engine().generation(), generation);
}

#[test]
fn nested_subgraph_renders_inside_parent() {
    let mut c = controller();
    let src = add(&mut c, NodeDescriptor::plugin("half"), 0.1);
    let outer = add(&mut c, NodeDescriptor::stereo_subgraph(), 0.5);
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    c.add_connection(src, 0, outer, 0, GraphId::Root).unwrap();
    c.add_connection(outer, 3, out, 0, GraphId::Root).unwrap();

    let outer_graph = GraphId::Subgraph(outer);
    let inner = c
        .add_node(NodeDescriptor::stereo_subgraph(), outer_graph, Position::default())
        .unwrap();
    let boundary: Vec<NodeId> = c
        .engine()
        .nodes_in(outer_graph)
        .filter(|n| n.descriptor().is_boundary())
        .map(|n| n.id())
        .collect();
    let (outer_in, outer_out) = (boundary[0], boundary[2]);
    c.add_connection(outer_in, 0, inner, 0, outer_graph).unwrap();
    c.add_connection(inner, 3, outer_out, 0, outer_graph).unwrap();

    let inner_graph = GraphId::Subgraph(inner);
    let inner_boundary: Vec<NodeId> = c.engine().nodes_in(inner_graph).map(|n| n.id()).collect();
    c.add_connection(inner_boundary[0], 0, inner_boundary[2], 0, inner_graph)
        .unwrap();

    let [left, _] = render(&c.render_handle(), &[], BLOCK);
    assert!(left.iter().all(|s| (*s - 0.5).abs() < 1e-6), "{left:?}");

    // Muting the outer subgraph silences everything inside it.
    c.set_muted(outer, true).unwrap();
    let [left, _] = render(&c.render_handle(), &[], BLOCK);
    assert!(left.iter().all(|s| *s == 0.0));
}

// ============================================================================
// 3. Undo
// ============================================================================

#[test]
fn undo_all_returns_to_start() {
    let mut c = controller();
    let mut history = History::new();
    let start = serialized(&c);

    history
        .perform(&mut c, add_command(NodeDescriptor::plugin("dc"), Position::new(0.1, 0.2)))
        .unwrap();
    history
        .perform(&mut c, add_command(NodeDescriptor::plugin("gain"), Position::new(0.5, 0.5)))
        .unwrap();
    let output = add_command(
        NodeDescriptor::AudioOutput { channels: 2 },
        Position::new(0.9, 0.5),
    );
    history.perform(&mut c, output).unwrap();
    let ids: Vec<NodeId> = c.engine().nodes().map(|n| n.id()).collect();
    let (dc, gain, out) = (ids[0], ids[1], ids[2]);
    history
        .perform(&mut c, AddConnectionCommand::new(dc, 0, gain, 0, GraphId::Root))
        .unwrap();
    history
        .perform(&mut c, AddConnectionCommand::new(gain, 3, out, 0, GraphId::Root))
        .unwrap();
    let rename = SetNodePropertyCommand::new(&c, gain, NodeProperty::Name("Trim".into())).unwrap();
    history.perform(&mut c, rename).unwrap();
    let remove = RemoveNodeCommand::new(&c, gain).unwrap();
    history.perform(&mut c, remove).unwrap();
    let end = serialized(&c);

    for _ in 0..7 {
        assert_eq!(history.undo(&mut c), Ok(true));
    }
    assert_eq!(serialized(&c), start);

    while history.redo(&mut c).unwrap() {}
    assert_eq!(serialized(&c), end);
}

#[test]
fn grouped_removal_redo_restores_configuration() {
    let mut c = controller();
    let a = add(&mut c, NodeDescriptor::plugin("dc"), 0.1);
    let b = add(&mut c, NodeDescriptor::plugin("gain"), 0.4);
    let sub = add(&mut c, NodeDescriptor::stereo_subgraph(), 0.6);
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    c.add_connection(a, 0, b, 0, GraphId::Root).unwrap();
    c.add_connection(b, 3, sub, 0, GraphId::Root).unwrap();
    c.add_connection(sub, 3, out, 0, GraphId::Root).unwrap();
    c.set_parameter(a, 0, 0.25).unwrap();
    c.set_enabled(b, false).unwrap();
    c.rename(sub, "Bus").unwrap();
    let before = serialized(&c);

    let mut history = History::new();
    let group = CommandGroup::new("Delete selection")
        .with(RemoveNodeCommand::new(&c, a).unwrap())
        .with(RemoveNodeCommand::new(&c, b).unwrap())
        .with(RemoveNodeCommand::new(&c, sub).unwrap());
    history.perform(&mut c, group).unwrap();
    assert_eq!(c.engine().node_count(), 1);
    let removed = serialized(&c);

    history.undo(&mut c).unwrap();
    assert_eq!(serialized(&c), before);
    history.redo(&mut c).unwrap();
    assert_eq!(serialized(&c), removed);
    history.undo(&mut c).unwrap();
    assert_eq!(serialized(&c), before);

    let restored = c.snapshot();
    assert_eq!(restored.find(a).map(|n| n.position), Some(Position::new(0.1, 0.5)));
    assert_eq!(restored.find(sub).map(|n| n.name.as_str()), Some("Bus"));
}

#[test]
fn undo_after_external_removal_is_unavailable() {
    let mut c = controller();
    let mut history = History::new();
    history
        .perform(&mut c, add_command(NodeDescriptor::plugin("dc"), Position::default()))
        .unwrap();
    let id = c.engine().nodes().next().map(|n| n.id()).unwrap();
    c.remove_node(id).unwrap();

    assert!(matches!(
        history.undo(&mut c),
        Err(GraphError::UndoStateUnavailable(_))
    ));
    assert!(history.can_undo());
}

#[test]
fn load_snapshot_replaces_graph() {
    let mut c = controller();
    let a = add(&mut c, NodeDescriptor::plugin("dc"), 0.1);
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    c.add_connection(a, 0, out, 1, GraphId::Root).unwrap();
    let json = serialized(&c);

    let mut other = controller();
    let snapshot: GraphSnapshot = serde_json::from_str(&json).unwrap();
    other.load_snapshot(&snapshot).unwrap();
    let [left, right] = render(&other.render_handle(), &[], BLOCK);
    assert!(left.iter().all(|s| *s == 0.0));
    assert!(right.iter().all(|s| (*s - 1.0).abs() < 1e-6));

    other.clear().unwrap();
    assert_eq!(other.engine().node_count(), 0);
}

// ============================================================================
// 4. Concurrency
// ============================================================================

#[test]
fn render_thread_sees_whole_plans_during_edits() {
    let mut c = controller();
    let one = add(&mut c, NodeDescriptor::plugin("dc"), 0.1);
    let half = add(&mut c, NodeDescriptor::plugin("half"), 0.1);
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    c.add_connection(one, 0, out, 0, GraphId::Root).unwrap();

    let handle = c.render_handle();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_render = Arc::clone(&stop);
    let renderer = std::thread::spawn(move || {
        let mut blocks = 0usize;
        let mut left = vec![0.0f32; BLOCK];
        let mut right = vec![0.0f32; BLOCK];
        let mut midi = EventBuffer::with_capacity(8);
        while !stop_render.load(Ordering::Relaxed) || blocks == 0 {
            handle.render_block(&[], &mut [&mut left, &mut right], &[], &mut midi, BLOCK);
            let first = left[0];
            assert!(first == 1.0 || first == 1.5, "unexpected sample {first}");
            assert!(left.iter().all(|s| *s == first), "torn block {left:?}");
            blocks += 1;
        }
        blocks
    });

    for _ in 0..200 {
        c.add_connection(half, 0, out, 0, GraphId::Root).unwrap();
        c.remove_connection(half, 0, out, 0, GraphId::Root).unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    let blocks = renderer.join().unwrap();
    assert!(blocks > 0);

    // With the render thread gone nothing holds a superseded plan.
    c.collect_garbage();
    assert_eq!(c.engine().retired_count(), 0);
}

#[test]
fn parameter_changes_never_silence_the_render_thread() {
    let mut c = controller();
    let dc = add(&mut c, NodeDescriptor::plugin("dc"), 0.1);
    let out = add(&mut c, NodeDescriptor::AudioOutput { channels: 2 }, 0.9);
    c.add_connection(dc, 0, out, 0, GraphId::Root).unwrap();

    let handle = c.render_handle();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_render = Arc::clone(&stop);
    let renderer = std::thread::spawn(move || {
        let (mut blocks, mut silent) = (0usize, 0usize);
        let mut left = vec![0.0f32; BLOCK];
        let mut right = vec![0.0f32; BLOCK];
        let mut midi = EventBuffer::with_capacity(8);
        while !stop_render.load(Ordering::Relaxed) || blocks == 0 {
            handle.render_block(&[], &mut [&mut left, &mut right], &[], &mut midi, BLOCK);
            let first = left[0];
            if first == 0.0 {
                silent += 1;
            } else {
                assert!(first == 1.0 || first == 0.5, "unexpected sample {first}");
                assert!(left.iter().all(|s| *s == first), "torn block {left:?}");
            }
            blocks += 1;
        }
        (blocks, silent)
    });

    for i in 0..200_000 {
        let value = if i % 2 == 0 { 0.5 } else { 1.0 };
        c.set_parameter(dc, 0, value).unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    let (blocks, silent) = renderer.join().unwrap();
    assert!(blocks > 0);
    assert_eq!(silent, 0, "{silent} of {blocks} blocks rendered silence");

    c.set_parameter(dc, 0, 0.25).unwrap();
    assert_eq!(c.parameter(dc, 0), Some(0.25));
    let [left, _] = render(&c.render_handle(), &[], BLOCK);
    assert!(left.iter().all(|s| *s == 0.25));
}
