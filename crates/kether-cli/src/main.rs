//! Kether CLI - Offline renderer and inspector for the kether synthesizer.

mod commands;
mod wav;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kether")]
#[command(author, version, about = "Kether synthesizer CLI", long_about = None)]
struct Cli {
    /// Log engine events (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render notes through the engine to a WAV file
    Render(commands::render::RenderArgs),

    /// List scales and their note frequencies
    Scales(commands::scales::ScalesArgs),

    /// List engine parameters and their ranges
    Params(commands::params::ParamsArgs),

    /// List, show or check patches
    Patches(commands::patches::PatchesArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Scales(args) => commands::scales::run(args),
        Commands::Params(args) => commands::params::run(args),
        Commands::Patches(args) => commands::patches::run(args),
    }
}
