//! Preflight checks for vmbuild.
//!
//! Validates the backend and the manifest before starting a build.
//! Run with `vmbuild preflight` to check everything is ready.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::Config;
use crate::manifest::Manifest;
use crate::process::{self, Cmd};

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed - build will fail.
    Fail,
    /// Check passed but with a warning.
    Warn,
}

impl CheckResult {
    pub fn pass_with(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    pub fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    pub fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }
}

/// Results of all preflight checks.
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    /// Returns true if all checks passed (no failures).
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    /// Count of failed checks.
    pub fn fail_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count()
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("=== Preflight Check Results ===\n");

        for check in &self.checks {
            let status_str = match check.status {
                CheckStatus::Pass => "PASS",
                CheckStatus::Fail => "FAIL",
                CheckStatus::Warn => "WARN",
            };

            print!("  [{}] {}", status_str, check.name);
            if let Some(details) = &check.details {
                println!(": {}", details);
            } else {
                println!();
            }
        }

        println!();
        let total = self.checks.len();
        let passed = self
            .checks
            .iter()
            .filter(|c| c.status == CheckStatus::Pass)
            .count();
        println!("Summary: {}/{} passed", passed, total);
        if self.fail_count() > 0 {
            println!("         {} FAILED - build will not succeed", self.fail_count());
        }
    }
}

/// Run all preflight checks.
pub fn run_preflight(config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    // Backend binary must resolve before any component can build.
    match process::which(&config.docker_bin) {
        Some(path) => {
            let details = match backend_version(&path) {
                Some(version) => format!("{path} ({version})"),
                None => path,
            };
            checks.push(CheckResult::pass_with(&config.docker_bin, &details));
        }
        None => checks.push(CheckResult::fail(
            &config.docker_bin,
            "Not found in PATH. Install the container backend.",
        )),
    }

    // The export helpers mount the backend control socket.
    if Path::new("/var/run/docker.sock").exists() {
        checks.push(CheckResult::pass_with(
            "control socket",
            "/var/run/docker.sock",
        ));
    } else {
        checks.push(CheckResult::warn(
            "control socket",
            "/var/run/docker.sock not found - init and service exports will fail",
        ));
    }

    // Manifest must be readable and well-formed, with both required refs.
    match Manifest::load(&config.manifest_path) {
        Ok(manifest) => match manifest.validate() {
            Ok(()) => checks.push(CheckResult::pass_with(
                "manifest",
                &format!(
                    "{} ({} system services)",
                    config.manifest_path.display(),
                    manifest.system.len()
                ),
            )),
            Err(e) => checks.push(CheckResult::fail("manifest", &e.to_string())),
        },
        Err(e) => checks.push(CheckResult::fail("manifest", &format!("{e:#}"))),
    }

    // Boot script only matters for `vmbuild run`.
    if config.boot_script.exists() {
        checks.push(CheckResult::pass_with(
            "boot script",
            &config.boot_script.display().to_string(),
        ));
    } else {
        checks.push(CheckResult::warn(
            "boot script",
            &format!(
                "{} not found - `vmbuild run` will fail",
                config.boot_script.display()
            ),
        ));
    }

    PreflightReport { checks }
}

/// Ask the backend for its version string, if it will answer.
fn backend_version(path: &str) -> Option<String> {
    let result = Cmd::new(path).arg("--version").allow_fail().run().ok()?;
    if !result.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&result.stdout);
    let version = version.trim();
    if version.is_empty() {
        None
    } else {
        Some(version.lines().next().unwrap_or(version).to_string())
    }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(config: &Config) -> Result<()> {
    let report = run_preflight(config);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before building.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
