//! Session inspection: nodes, connections, and the render plan.

use std::path::PathBuf;

use clap::Args;
use patchbay_core::{GraphController, GraphSnapshot, NodeDescriptor};
use patchbay_nodes::NodeRegistry;

use super::common::{describe_kind, open_session};

#[derive(Args)]
pub struct InspectArgs {
    /// Session file to inspect
    #[arg(value_name = "SESSION")]
    session: PathBuf,

    /// Also print every render instruction
    #[arg(long)]
    ops: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let (session, controller) = open_session(&args.session)?;
    let registry = NodeRegistry::new();

    println!("{}", session.name);
    println!("{}", "=".repeat(session.name.len()));
    if let Some(description) = &session.description {
        println!("{description}");
    }
    println!();

    let engine = session.engine;
    println!(
        "Engine: {} Hz, block {}, {} events/block, undo depth {}",
        engine.sample_rate, engine.block_size, engine.max_events_per_block, engine.history_limit
    );
    println!();

    print_graph(&session.graph, &controller, &registry, 0);

    let plan = controller.engine().current_plan();
    println!();
    println!("Render order ({} instructions):", plan.op_count());
    let order: Vec<String> = plan
        .order()
        .iter()
        .map(|id| {
            controller
                .node(*id)
                .map_or_else(|| id.to_string(), |n| format!("{} [{}]", n.name(), id.index()))
        })
        .collect();
    println!("  {}", order.join(" -> "));

    if args.ops {
        println!();
        for (i, op) in plan.describe().iter().enumerate() {
            println!("  {i:4}  {op}");
        }
    }
    Ok(())
}

fn print_graph(
    graph: &GraphSnapshot,
    controller: &GraphController,
    registry: &NodeRegistry,
    depth: usize,
) {
    let pad = "  ".repeat(depth + 1);
    println!("{pad}Nodes:");
    for node in &graph.nodes {
        let mut flags = Vec::new();
        if !node.enabled {
            flags.push("bypassed");
        }
        if node.muted {
            flags.push("muted");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        println!(
            "{pad}  [{}] {:16} {:28} at ({:.2}, {:.2}){flags}",
            node.id.index(),
            node.name,
            describe_kind(&node.descriptor),
            node.position.x,
            node.position.y,
        );

        if let NodeDescriptor::Plugin { id } = &node.descriptor
            && let Some(processor) = registry.create(id)
        {
            for index in 0..processor.param_count() {
                let Some(info) = processor.param_info(index) else {
                    continue;
                };
                let value = controller.parameter(node.id, index).unwrap_or(info.default);
                println!("{pad}      {} = {value}", info.name);
            }
        }

        if let Some(sub) = &node.subgraph {
            print_graph(sub, controller, registry, depth + 2);
        }
    }

    println!("{pad}Connections:");
    if graph.connections.is_empty() {
        println!("{pad}  (none)");
    }
    for conn in &graph.connections {
        let name = |id| {
            graph
                .nodes
                .iter()
                .find(|n| n.id == id)
                .map_or("?", |n| n.name.as_str())
        };
        println!(
            "{pad}  {}:{} -> {}:{}",
            name(conn.source),
            conn.source_port,
            name(conn.dest),
            conn.dest_port
        );
    }
}
