//! vmbuild - bootable VM image builder.
//!
//! Assembles a bootable image from a container manifest:
//! - kernel binary, extracted from the kernel container's composite archive
//! - multi-segment initrd, concatenated from per-container filesystem
//!   archives (kernel companion, init, each system service, in that order)
//!
//! Invoked with no arguments it runs the full build; `vmbuild run` replaces
//! the process with the boot script instead.
#![allow(dead_code)]

mod artifact;
mod boot;
mod commands;
mod component;
mod config;
mod initrd;
mod kernel;
mod manifest;
mod preflight;
mod process;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::Config;

#[derive(Parser)]
#[command(name = "vmbuild")]
#[command(about = "Bootable VM image builder")]
#[command(
    after_help = "QUICK START:\n  vmbuild preflight  Check backend and manifest\n  vmbuild            Build bzImage + initrd.img\n  vmbuild run        Boot via the boot script"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the image (same as invoking with no arguments)
    Build,

    /// Replace this process with the boot script
    Run,

    /// Remove built artifacts
    Clean,

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Run preflight checks (verify backend and manifest before build)
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// Show the decoded manifest
    Manifest,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();

    match cli.command {
        None | Some(Commands::Build) => {
            commands::cmd_build(&config)?;
        }

        Some(Commands::Run) => {
            commands::cmd_run(&config)?;
        }

        Some(Commands::Clean) => {
            commands::cmd_clean(&config)?;
        }

        Some(Commands::Show { what }) => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Manifest => commands::show::ShowTarget::Manifest,
            };
            commands::cmd_show(&config, show_target)?;
        }

        Some(Commands::Preflight { strict }) => {
            commands::cmd_preflight(&config, strict)?;
        }
    }

    Ok(())
}
