//! Build manifest - the declarative specification of what goes into the image.
//!
//! A manifest names a kernel container, an init container, and an ordered
//! list of system service containers. The list order matters: it becomes the
//! segment order of the assembled initrd, and the boot-time unpacker lets
//! later segments shadow files from earlier ones.
//!
//! Unknown keys are ignored so manifests can carry fields consumed by other
//! tooling. Missing `kernel`/`init` decode to empty strings - callers must
//! check non-emptiness before building (see `commands::build`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default manifest file name, looked up in the working directory.
pub const DEFAULT_MANIFEST: &str = "vmbuild.yaml";

/// The decoded build manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Kernel container reference (produces bzImage + kernel.tar).
    pub kernel: String,
    /// Init container reference (becomes the first userland initrd segment).
    pub init: String,
    /// System services, in boot-overlay order.
    pub system: Vec<ServiceSpec>,
    /// Declarative file overrides, applied by downstream tooling.
    pub database: Vec<FileOverride>,
}

/// One system service container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    /// Service name; its archive is rooted under /containers/<name>.
    pub name: String,
    /// Container image reference.
    pub image: String,
    /// Capabilities to drop when the service runs.
    pub cap_drop: Vec<String>,
    /// Capabilities to add when the service runs.
    pub cap_add: Vec<String>,
    /// Bind mount specification.
    pub bind: String,
    /// OOM score adjustment for the service process.
    pub oom_score_adj: i64,
    /// Command override for the container.
    pub command: Vec<String>,
}

/// A declarative file override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOverride {
    pub file: String,
    pub value: String,
}

impl Manifest {
    /// Load and decode a manifest file.
    ///
    /// An unreadable file or malformed YAML is fatal. A well-formed document
    /// missing `kernel` or `init` decodes successfully with empty strings.
    pub fn load(path: &Path) -> Result<Manifest> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot open manifest file {}", path.display()))?;
        let manifest: Manifest = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        Ok(manifest)
    }

    /// Check that both required component references are present.
    pub fn validate(&self) -> Result<()> {
        if self.kernel.is_empty() {
            anyhow::bail!("Manifest has no 'kernel' reference");
        }
        if self.init.is_empty() {
            anyhow::bail!("Manifest has no 'init' reference");
        }
        Ok(())
    }
}
