//! Built-in processor listing.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use patchbay_core::PortDirection;
use patchbay_nodes::{NodeCategory, NodeRegistry};

#[derive(Args)]
pub struct NodesArgs {
    /// Show ports and parameters for one processor
    #[arg(value_name = "ID")]
    id: Option<String>,
}

pub fn run(args: NodesArgs) -> anyhow::Result<()> {
    let registry = NodeRegistry::new();

    let Some(id) = &args.id else {
        println!("Available Nodes");
        println!("===============");
        for category in [NodeCategory::Source, NodeCategory::Level, NodeCategory::Midi] {
            println!();
            println!("{}:", category.name());
            for info in registry.nodes_in_category(category) {
                println!("  {:12} - {}", info.id, info.description);
            }
        }
        println!();
        println!("Use 'patchbay nodes <id>' for ports and parameters.");
        return Ok(());
    };

    let info = registry
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Unknown node: {id}"))?;
    let processor = registry
        .create(id)
        .ok_or_else(|| anyhow::anyhow!("Unknown node: {id}"))?;

    println!("{} ({})", info.name, info.id);
    println!("{}", "=".repeat(info.name.len() + info.id.len() + 3));
    println!();
    println!("{}", info.description);
    println!();

    println!("Ports:");
    for (index, spec) in processor.ports().iter().enumerate() {
        let direction = match spec.direction {
            PortDirection::Input => "in",
            PortDirection::Output => "out",
        };
        println!("  {index:2}  {direction:3}  {:8}  {}", format!("{:?}", spec.kind), spec.name);
    }

    println!();
    println!("Parameters:");
    println!("  {:2}  {:12}  {:>10}  {}", "#", "Name", "Default", "Range");
    for index in 0..processor.param_count() {
        if let Some(param) = processor.param_info(index) {
            println!(
                "  {index:2}  {:12}  {:>10}  {} .. {}",
                param.name, param.default, param.min, param.max
            );
        }
    }
    Ok(())
}
