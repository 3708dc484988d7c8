//! Patch management commands.
//!
//! Lists factory patches, prints or validates patch files, and exports a
//! complete snapshot of a patch applied over the engine defaults.

use clap::{Args, Subcommand};
use kether_config::{FACTORY_PATCH_NAMES, PatchConfig, factory_patch, find_patch};
use kether_synth::Engine;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct PatchesArgs {
    #[command(subcommand)]
    command: PatchesCommand,
}

#[derive(Subcommand)]
enum PatchesCommand {
    /// List factory patches
    List,

    /// Print a patch as TOML
    Show {
        /// Patch name or path
        name: String,
    },

    /// Validate a patch without rendering
    Check {
        /// Patch name or path
        name: String,
    },

    /// Write every parameter of a patch, applied over the defaults, to a file
    Export {
        /// Patch name or path
        name: String,

        /// Output TOML file
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Apply `patch` to a default engine and capture the full state.
fn snapshot(patch: &PatchConfig) -> anyhow::Result<PatchConfig> {
    let mut engine = Engine::new(48000.0, 256)?;
    patch.apply_to(&mut engine)?;
    let name = patch.name.clone().unwrap_or_else(|| "Untitled".to_string());
    let mut captured = PatchConfig::from_engine(name, &engine);
    captured.description = patch.description.clone();
    Ok(captured)
}

fn export(name: &str, output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        );
    }
    snapshot(&find_patch(name)?)?.save(output)?;
    Ok(())
}

pub fn run(args: PatchesArgs) -> anyhow::Result<()> {
    match args.command {
        PatchesCommand::List => {
            println!("Factory patches:");
            println!();
            for id in FACTORY_PATCH_NAMES {
                if let Some(patch) = factory_patch(id) {
                    println!(
                        "  {:14}  {}",
                        id,
                        patch.description.as_deref().unwrap_or("")
                    );
                }
            }
        }

        PatchesCommand::Show { name } => {
            let patch = find_patch(&name)?;
            print!("{}", patch.to_toml()?);
        }

        PatchesCommand::Check { name } => {
            let patch = find_patch(&name)?;
            let resolved = patch.resolve()?;
            println!(
                "{}: OK ({} parameters, {})",
                patch.name.as_deref().unwrap_or(&name),
                resolved.params.len(),
                if resolved.modulation.is_some() {
                    "modulation matrix"
                } else {
                    "default modulation"
                }
            );
        }

        PatchesCommand::Export {
            name,
            output,
            force,
        } => {
            export(&name, &output, force)?;
            println!("Exported {} to {}", name, output.display());
        }
    }

    Ok(())
}
