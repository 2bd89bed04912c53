//! Show command - displays information.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::manifest::Manifest;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// Show the decoded manifest
    Manifest,
}

/// Execute the show command.
pub fn cmd_show(config: &Config, target: ShowTarget) -> Result<()> {
    match target {
        ShowTarget::Config => {
            config.print();
        }
        ShowTarget::Manifest => {
            let manifest = Manifest::load(&config.manifest_path)?;
            let json = serde_json::to_string_pretty(&manifest)
                .context("Failed to encode manifest")?;
            println!("{json}");
        }
    }
    Ok(())
}
