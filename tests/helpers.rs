//! Shared test utilities for vmbuild tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with a stub backend and fixture archives.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Directory holding fixture archives served by the stub backend
    pub fixtures: PathBuf,
    /// Log file the stub backend appends each invocation to
    pub log: PathBuf,
    /// Directory artifacts are written to
    pub output: PathBuf,
    /// Path of the stub backend script
    pub docker: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let fixtures = base.join("fixtures");
        let output = base.join("output");
        let log = base.join("invocations.log");
        let docker = base.join("docker");

        fs::create_dir_all(&fixtures).expect("Failed to create fixtures dir");
        fs::create_dir_all(&output).expect("Failed to create output dir");

        Self {
            _temp_dir: temp_dir,
            fixtures,
            log,
            output,
            docker,
        }
    }

    /// Install the stub backend script.
    ///
    /// The stub logs every invocation (one line of arguments per call) and
    /// answers on stdout from the fixtures directory:
    /// - a kernel build (`tar cf -` in the arguments) serves kernel-composite.tar
    /// - a service export (`/containers/<name>` argument) serves service-<name>.tar
    /// - anything else (the init export) serves init.tar
    pub fn install_stub_backend(&self) {
        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{log}"
svc=""
for a in "$@"; do
    case "$a" in
        /containers/*) svc="${{a#/containers/}}" ;;
    esac
done
case "$*" in
    *"tar cf -"*) cat "{fixtures}/kernel-composite.tar" ;;
    *) if [ -n "$svc" ]; then
           cat "{fixtures}/service-$svc.tar"
       else
           cat "{fixtures}/init.tar"
       fi ;;
esac
"#,
            log = self.log.display(),
            fixtures = self.fixtures.display(),
        );
        write_executable(&self.docker, &script);
    }

    /// Install a stub backend that always fails with the given exit code.
    pub fn install_failing_backend(&self, code: i32) {
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> \"{}\"\necho 'backend exploded' >&2\nexit {}\n",
            self.log.display(),
            code
        );
        write_executable(&self.docker, &script);
    }

    /// Lines logged by the stub backend, one per invocation.
    pub fn logged_invocations(&self) -> Vec<String> {
        if !self.log.exists() {
            return Vec::new();
        }
        fs::read_to_string(&self.log)
            .expect("Failed to read invocation log")
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    /// Write a fixture file served by the stub backend.
    pub fn write_fixture(&self, name: &str, content: &[u8]) {
        fs::write(self.fixtures.join(name), content).expect("Failed to write fixture");
    }
}

/// Write a script and mark it executable.
pub fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write script");
    let mut perms = fs::metadata(path).expect("Failed to stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to set script permissions");
}

/// Build an in-memory tar archive with the given entries.
pub fn tar_with_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *content)
            .expect("Failed to append tar entry");
    }
    builder.into_inner().expect("Failed to finish tar")
}

/// Write a manifest file with one service, returning its path.
pub fn write_manifest(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("vmbuild.yaml");
    fs::write(&path, yaml).expect("Failed to write manifest");
    path
}
