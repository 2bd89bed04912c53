//! Output artifact writing and verification.
//!
//! Persists the extracted kernel binary and the assembled initrd under their
//! fixed names in the output directory. Both files are plain data, written
//! with mode 0644. The first write failure aborts; the second file is not
//! attempted.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Output file name for the kernel binary.
pub const KERNEL_OUTPUT: &str = "bzImage";

/// Output file name for the combined ramdisk image.
pub const INITRD_OUTPUT: &str = "initrd.img";

/// Permission bits for both artifacts: owner read/write, world read.
const OUTPUT_MODE: u32 = 0o644;

/// Size and digest of a written artifact, for the build summary.
pub struct ArtifactInfo {
    pub size: u64,
    pub sha256: String,
}

/// Write the combined initrd and the kernel binary to the output directory.
pub fn write_artifacts(output_dir: &Path, bzimage: &[u8], initrd: &[u8]) -> Result<()> {
    write_file(&output_dir.join(INITRD_OUTPUT), initrd)?;
    write_file(&output_dir.join(KERNEL_OUTPUT), bzimage)?;
    Ok(())
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))?;

    let mut perms = fs::metadata(path)
        .with_context(|| format!("Could not stat {}", path.display()))?
        .permissions();
    perms.set_mode(OUTPUT_MODE);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Could not set permissions on {}", path.display()))?;

    Ok(())
}

/// Verify a written artifact: it must exist and be non-empty.
/// Returns its size and SHA256 digest for the build summary.
pub fn verify(path: &Path) -> Result<ArtifactInfo> {
    let content =
        fs::read(path).with_context(|| format!("Missing artifact {}", path.display()))?;

    if content.is_empty() {
        bail!("Artifact {} is empty", path.display());
    }

    let mut hasher = Sha256::new();
    hasher.update(&content);

    Ok(ArtifactInfo {
        size: content.len() as u64,
        sha256: format!("{:x}", hasher.finalize()),
    })
}
