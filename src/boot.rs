//! Boot launch - hand the process over to the boot script.
//!
//! `vmbuild run` does not supervise anything: it replaces the current
//! process image with the external boot script, which inherits the full
//! environment and receives no arguments. On success control never returns
//! here; the only way back is a failure to start the script.

use anyhow::{Context, Result};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

/// Replace the current process with the boot script.
///
/// Returns only on failure to exec, which is fatal.
pub fn launch(script: &Path) -> Result<()> {
    // exec only returns on error
    let err = Command::new(script).exec();

    Err(err).with_context(|| format!("Could not run boot script {}", script.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_missing_script_returns_error() {
        let err = launch(Path::new("/nonexistent/boot.sh")).unwrap_err();
        assert!(err.to_string().contains("Could not run boot script"));
    }
}
