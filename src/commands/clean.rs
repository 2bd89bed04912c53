//! Clean command - removes built artifacts.

use anyhow::Result;
use std::fs;

use crate::artifact::{INITRD_OUTPUT, KERNEL_OUTPUT};
use crate::config::Config;

/// Execute the clean command.
pub fn cmd_clean(config: &Config) -> Result<()> {
    let mut cleaned = false;

    for name in [KERNEL_OUTPUT, INITRD_OUTPUT] {
        let path = config.output_dir.join(name);
        if path.exists() {
            println!("Removing {}...", path.display());
            fs::remove_file(&path)?;
            cleaned = true;
        }
    }

    if cleaned {
        println!("Clean complete.");
    } else {
        println!("Nothing to clean.");
    }
    Ok(())
}
