//! Configuration management for vmbuild.
//!
//! Reads configuration from .env file and environment variables.
//! Environment variables take precedence over .env file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest::DEFAULT_MANIFEST;

/// Default container backend binary.
pub const DEFAULT_DOCKER_BIN: &str = "docker";

/// Default boot script, executed by `vmbuild run`.
pub const DEFAULT_BOOT_SCRIPT: &str = "./boot.sh";

/// vmbuild configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the build manifest (default: vmbuild.yaml)
    pub manifest_path: PathBuf,
    /// Container backend binary name or path (default: docker)
    pub docker_bin: String,
    /// Boot script executed by the run command (default: ./boot.sh)
    pub boot_script: PathBuf,
    /// Directory the artifacts are written to (default: current directory)
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// The .env file is looked up in the current directory; real environment
    /// variables override it.
    pub fn load() -> Self {
        let mut env_vars = HashMap::new();

        // Try to load .env file
        let env_path = Path::new(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(env_path) {
                for line in content.lines() {
                    let line = line.trim();
                    // Skip comments and empty lines
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    // Parse KEY=value
                    if let Some((key, value)) = line.split_once('=') {
                        let key = key.trim();
                        let value = value.trim();
                        // Remove quotes if present
                        let value = value.trim_matches('"').trim_matches('\'');
                        env_vars.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let manifest_path = env_vars
            .get("VMBUILD_MANIFEST")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST));

        let docker_bin = env_vars
            .get("VMBUILD_DOCKER")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DOCKER_BIN.to_string());

        let boot_script = env_vars
            .get("VMBUILD_BOOT_SCRIPT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOOT_SCRIPT));

        let output_dir = env_vars
            .get("VMBUILD_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            manifest_path,
            docker_bin,
            boot_script,
            output_dir,
        }
    }

    /// Check if the manifest file is present.
    pub fn has_manifest(&self) -> bool {
        self.manifest_path.exists()
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  VMBUILD_MANIFEST: {}", self.manifest_path.display());
        println!("  VMBUILD_DOCKER: {}", self.docker_bin);
        println!("  VMBUILD_BOOT_SCRIPT: {}", self.boot_script.display());
        println!("  VMBUILD_OUTPUT_DIR: {}", self.output_dir.display());
        if self.has_manifest() {
            println!("  Manifest: FOUND");
        } else {
            println!("  Manifest: NOT FOUND (create {} first)", DEFAULT_MANIFEST);
        }
    }
}
