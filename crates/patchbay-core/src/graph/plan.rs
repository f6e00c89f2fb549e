//! Render plan types and the real-time executor.
//!
//! A [`RenderPlan`] is an immutable snapshot produced by the
//! [plan builder](super::builder). It holds a flat list of [`RenderOp`]
//! instructions that the audio thread executes sequentially, plus the port
//! buffers those instructions read and write.
//!
//! The plan is shared with the audio thread via `Arc`; the audio thread never
//! sees partial state. Its buffers sit behind a mutex that the render path
//! only ever `try_lock`s.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use crate::processor::ProcessBuffers;

use super::buffer::{BufferLayout, PlanBuffers};
use super::engine::RenderConfig;
use super::event::{EventBuffer, MidiEvent};
use super::node::{NodeId, NodeShared};

/// One node's slice of the plan's buffer pools.
pub(crate) struct PlanNode {
    pub id: NodeId,
    pub shared: Arc<NodeShared>,
    pub audio_in: Range<usize>,
    pub audio_out: Range<usize>,
    pub events_in: Range<usize>,
    pub events_out: Range<usize>,
    pub control_in: Range<usize>,
    pub control_out: Range<usize>,
}

/// A single instruction in a render plan.
///
/// `from`/`to` fields index the plan's buffer pools. Audio and event sources
/// are always output pools and destinations input pools, except for the
/// boundary forwarding ops, which move data across a subgraph boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RenderOp {
    /// Overwrite an input buffer with an upstream output.
    CopyAudio { from: usize, to: usize },
    /// Add an upstream output into an input buffer.
    MixAudio { from: usize, to: usize },
    /// Empty an event input before merging.
    ClearEvents { buffer: usize },
    /// Merge an upstream event output into an event input.
    MergeEvents { from: usize, to: usize },
    /// Latch an upstream control value.
    CopyControl { from: usize, to: usize },
    /// Run a plugin node.
    Process { node: usize },
    /// External audio channel into a root input node's output.
    ReadHostAudio { channel: usize, to: usize },
    /// Root output node's input summed into an external channel.
    WriteHostAudio { from: usize, channel: usize },
    /// External MIDI into a root MIDI input node's output.
    ReadHostEvents { to: usize },
    /// Root MIDI output node's input merged into external MIDI.
    WriteHostEvents { from: usize },
    /// Subgraph audio input into a nested input node's output.
    ForwardAudio { from: usize, to: usize },
    /// Nested output node's input summed into a subgraph audio output.
    ReturnAudio { from: usize, to: usize },
    /// Subgraph event input into a nested MIDI input node's output.
    ForwardEvents { from: usize, to: usize },
    /// Nested MIDI output node's input merged into a subgraph event output.
    ReturnEvents { from: usize, to: usize },
    /// Start of a subgraph's nested sequence. Bypassed subgraphs jump to `skip_to`.
    EnterSubgraph { node: usize, skip_to: usize },
    /// End of a subgraph's nested sequence.
    ExitSubgraph { node: usize },
}

/// External I/O for one chunk of a render call.
pub(crate) struct HostIo<'a, 'o> {
    pub audio_in: &'a [&'a [f32]],
    pub audio_out: &'a mut [&'o mut [f32]],
    pub midi_in: &'a [MidiEvent],
    pub midi_out: &'a mut EventBuffer,
}

/// Immutable, fully resolved execution sequence for the whole graph.
pub struct RenderPlan {
    pub(crate) order: Vec<NodeId>,
    pub(crate) nodes: Vec<PlanNode>,
    pub(crate) ops: Vec<RenderOp>,
    pub(crate) buffers: Mutex<PlanBuffers>,
    pub(crate) config: RenderConfig,
    pub(crate) generation: u64,
}

impl RenderPlan {
    /// Plan with no nodes; renders silence.
    pub(crate) fn empty(config: RenderConfig) -> Self {
        Self {
            order: Vec::new(),
            nodes: Vec::new(),
            ops: Vec::new(),
            buffers: Mutex::new(PlanBuffers::allocate(
                &BufferLayout::default(),
                config.block_size,
                config.max_events_per_block,
            )),
            config,
            generation: 0,
        }
    }

    /// Node ids in execution order. A subgraph node is followed by its
    /// flattened contents.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Publication counter; each rebuild increments it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of render instructions.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Configuration the plan's buffers are sized for.
    pub fn config(&self) -> RenderConfig {
        self.config
    }

    /// Human-readable listing of the render instructions.
    pub fn describe(&self) -> Vec<String> {
        self.ops.iter().map(|op| self.format_op(op)).collect()
    }

    fn format_op(&self, op: &RenderOp) -> String {
        let id = |node: &usize| {
            self.nodes
                .get(*node)
                .map_or_else(|| format!("node[{node}]"), |n| n.id.to_string())
        };
        match op {
            RenderOp::CopyAudio { from, to } => format!("CopyAudio out[{from}] → in[{to}]"),
            RenderOp::MixAudio { from, to } => format!("MixAudio out[{from}] + in[{to}]"),
            RenderOp::ClearEvents { buffer } => format!("ClearEvents in[{buffer}]"),
            RenderOp::MergeEvents { from, to } => {
                format!("MergeEvents ev_out[{from}] → ev_in[{to}]")
            }
            RenderOp::CopyControl { from, to } => {
                format!("CopyControl ctl_out[{from}] → ctl_in[{to}]")
            }
            RenderOp::Process { node } => format!("Process {}", id(node)),
            RenderOp::ReadHostAudio { channel, to } => {
                format!("ReadHostAudio ch{channel} → out[{to}]")
            }
            RenderOp::WriteHostAudio { from, channel } => {
                format!("WriteHostAudio in[{from}] + ch{channel}")
            }
            RenderOp::ReadHostEvents { to } => format!("ReadHostEvents → ev_out[{to}]"),
            RenderOp::WriteHostEvents { from } => format!("WriteHostEvents ev_in[{from}]"),
            RenderOp::ForwardAudio { from, to } => format!("ForwardAudio in[{from}] → out[{to}]"),
            RenderOp::ReturnAudio { from, to } => format!("ReturnAudio in[{from}] + out[{to}]"),
            RenderOp::ForwardEvents { from, to } => {
                format!("ForwardEvents ev_in[{from}] → ev_out[{to}]")
            }
            RenderOp::ReturnEvents { from, to } => {
                format!("ReturnEvents ev_in[{from}] → ev_out[{to}]")
            }
            RenderOp::EnterSubgraph { node, skip_to } => {
                format!("EnterSubgraph {} (bypass → op[{skip_to}])", id(node))
            }
            RenderOp::ExitSubgraph { node } => format!("ExitSubgraph {}", id(node)),
        }
    }

    /// Renders `num_samples` frames in chunks of at most the prepared block size.
    ///
    /// External outputs are summed into, so callers clear them first. The
    /// plan's buffers serve one render call at a time: a call that overlaps
    /// another on the same plan leaves the outputs untouched.
    pub(crate) fn render(&self, host: &mut HostIo<'_, '_>, num_samples: usize) {
        let block = self.config.block_size;
        if block == 0 {
            return;
        }
        let Some(mut bufs) = self.buffers.try_lock() else {
            return;
        };
        let mut offset = 0;
        while offset < num_samples {
            let n = block.min(num_samples - offset);
            self.execute(&mut bufs, host, offset, n);
            offset += n;
        }
    }

    fn execute(&self, bufs: &mut PlanBuffers, host: &mut HostIo<'_, '_>, offset: usize, n: usize) {
        let PlanBuffers {
            audio_in,
            audio_out,
            events_in,
            events_out,
            control_in,
            control_out,
        } = bufs;

        let mut pc = 0;
        while pc < self.ops.len() {
            let op = self.ops[pc];
            pc += 1;
            match op {
                RenderOp::CopyAudio { from, to } => {
                    audio_in[to][..n].copy_from_slice(&audio_out[from][..n]);
                }
                RenderOp::MixAudio { from, to } => {
                    add_into(&mut audio_in[to][..n], &audio_out[from][..n]);
                }
                RenderOp::ClearEvents { buffer } => events_in[buffer].clear(),
                RenderOp::MergeEvents { from, to } => {
                    events_in[to].merge_from(&events_out[from]);
                }
                RenderOp::CopyControl { from, to } => control_in[to] = control_out[from],
                // Bypass wins over mute: a bypassed node passes its inputs
                // through even when muted.
                RenderOp::Process { node } => {
                    let node = &self.nodes[node];
                    let enabled = node.shared.enabled.load(Ordering::Relaxed);
                    if !enabled {
                        bypass(node, audio_in, audio_out, events_in, events_out, n);
                        continue;
                    }
                    clear_outputs(node, audio_out, events_out, n);
                    if let Some(processor) = &node.shared.processor
                        && let Some(mut processor) = processor.try_lock()
                    {
                        node.shared.params.apply_pending(&mut **processor);
                        let mut buffers = ProcessBuffers::new(
                            &audio_in[node.audio_in.clone()],
                            &mut audio_out[node.audio_out.clone()],
                            &events_in[node.events_in.clone()],
                            &mut events_out[node.events_out.clone()],
                            &control_in[node.control_in.clone()],
                            &mut control_out[node.control_out.clone()],
                            n,
                        );
                        processor.process(&mut buffers);
                    }
                    if node.shared.muted.load(Ordering::Relaxed) {
                        clear_outputs(node, audio_out, events_out, n);
                        control_out[node.control_out.clone()].fill(0.0);
                    }
                }
                RenderOp::ReadHostAudio { channel, to } => {
                    let dest = &mut audio_out[to][..n];
                    match host
                        .audio_in
                        .get(channel)
                        .and_then(|ch| ch.get(offset..offset + n))
                    {
                        Some(src) => dest.copy_from_slice(src),
                        None => dest.fill(0.0),
                    }
                }
                RenderOp::WriteHostAudio { from, channel } => {
                    if let Some(dest) = host
                        .audio_out
                        .get_mut(channel)
                        .and_then(|ch| ch.get_mut(offset..offset + n))
                    {
                        add_into(dest, &audio_in[from][..n]);
                    }
                }
                RenderOp::ReadHostEvents { to } => {
                    let dest = &mut events_out[to];
                    dest.clear();
                    let end = offset + n;
                    for event in host.midi_in {
                        let time = event.time as usize;
                        if (offset..end).contains(&time) {
                            dest.insert_sorted(event.with_time((time - offset) as u32));
                        }
                    }
                }
                RenderOp::WriteHostEvents { from } => {
                    for event in &events_in[from] {
                        host.midi_out
                            .insert_sorted(event.with_time(event.time + offset as u32));
                    }
                }
                RenderOp::ForwardAudio { from, to } => {
                    audio_out[to][..n].copy_from_slice(&audio_in[from][..n]);
                }
                RenderOp::ReturnAudio { from, to } => {
                    add_into(&mut audio_out[to][..n], &audio_in[from][..n]);
                }
                RenderOp::ForwardEvents { from, to } => {
                    events_out[to].clear();
                    events_out[to].merge_from(&events_in[from]);
                }
                RenderOp::ReturnEvents { from, to } => {
                    events_out[to].merge_from(&events_in[from]);
                }
                RenderOp::EnterSubgraph { node, skip_to } => {
                    let node = &self.nodes[node];
                    if node.shared.enabled.load(Ordering::Relaxed) {
                        clear_outputs(node, audio_out, events_out, n);
                    } else {
                        bypass(node, audio_in, audio_out, events_in, events_out, n);
                        pc = skip_to;
                    }
                }
                // Only reached when the subgraph ran, so a bypassed subgraph
                // is never silenced here.
                RenderOp::ExitSubgraph { node } => {
                    let node = &self.nodes[node];
                    if node.shared.muted.load(Ordering::Relaxed) {
                        clear_outputs(node, audio_out, events_out, n);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for RenderPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPlan")
            .field("generation", &self.generation)
            .field("order", &self.order)
            .field("ops", &self.ops.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[inline]
fn add_into(dest: &mut [f32], src: &[f32]) {
    for (d, s) in dest.iter_mut().zip(src) {
        *d += *s;
    }
}

fn clear_outputs(
    node: &PlanNode,
    audio_out: &mut [Vec<f32>],
    events_out: &mut [EventBuffer],
    n: usize,
) {
    for buf in &mut audio_out[node.audio_out.clone()] {
        buf[..n].fill(0.0);
    }
    for buf in &mut events_out[node.events_out.clone()] {
        buf.clear();
    }
}

/// Audio input `i` to audio output `i`, event input 0 to event output 0.
/// Outputs without a matching input are silenced.
fn bypass(
    node: &PlanNode,
    audio_in: &[Vec<f32>],
    audio_out: &mut [Vec<f32>],
    events_in: &[EventBuffer],
    events_out: &mut [EventBuffer],
    n: usize,
) {
    let inputs = &audio_in[node.audio_in.clone()];
    for (i, out) in audio_out[node.audio_out.clone()].iter_mut().enumerate() {
        match inputs.get(i) {
            Some(input) => out[..n].copy_from_slice(&input[..n]),
            None => out[..n].fill(0.0),
        }
    }
    let events = &events_in[node.events_in.clone()];
    for (i, out) in events_out[node.events_out.clone()].iter_mut().enumerate() {
        out.clear();
        if i == 0
            && let Some(input) = events.first()
        {
            out.merge_from(input);
        }
    }
}
