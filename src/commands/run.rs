//! Run command - boot the built image.

use anyhow::Result;

use crate::boot;
use crate::config::Config;

/// Execute the run command.
///
/// On success this never returns: the process image is replaced by the boot
/// script. The build pipeline is never entered on this path.
pub fn cmd_run(config: &Config) -> Result<()> {
    boot::launch(&config.boot_script)
}
