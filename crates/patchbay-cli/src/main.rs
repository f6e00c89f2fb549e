//! Patchbay CLI - run patchbay session files headlessly.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "patchbay")]
#[command(author, version, about = "Patchbay graph host CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a session's nodes, connections, and render order
    Inspect(commands::inspect::InspectArgs),

    /// Render a session offline to a WAV file
    Render(commands::render::RenderArgs),

    /// Play a session on an audio output device
    Play(commands::play::PlayArgs),

    /// List the built-in processors
    Nodes(commands::nodes::NodesArgs),

    /// Write an example session file
    Demo(commands::demo::DemoArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Nodes(args) => commands::nodes::run(args),
        Commands::Demo(args) => commands::demo::run(args),
    }
}
