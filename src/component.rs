//! Component build orchestration.
//!
//! Every manifest-referenced component (kernel, init, each system service)
//! is turned into a filesystem-archive byte stream by invoking the container
//! backend and capturing its stdout. The invocations are independent
//! external processes, so they run concurrently; results are gathered into
//! slots indexed by manifest position so that downstream assembly sees
//! exactly manifest order.
//!
//! Any invocation failure (spawn error or non-zero exit) aborts the whole
//! run with the component's name and the backend's stderr. No retries, no
//! partial results.

use anyhow::{bail, Context, Result};

use crate::kernel::{KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY};
use crate::manifest::Manifest;

/// Helper image that converts a container image into a filesystem tarball.
/// Needs the backend control socket mounted into the container.
pub const IMAGE_EXPORT_HELPER: &str = "mobylinux/docker2tar:82a3f11f70b2959c7100dd6e184b511ebfc65908@sha256:e4fd36febc108477a2e5316d263ac257527779409891c7ac10d455a162df05c1";

/// Helper image that inspects a service image and exports its filesystem
/// rooted under /containers/<name>, honoring capability and command options.
pub const SERVICE_EXPORT_HELPER: &str = "mobylinux/riddler:7d4545d8b8ac2700971a83f12a3446a76db28c14@sha256:11b7310df6482fc38aa52b419c2ef1065d7b9207c633d47554e13aa99f6c0b72";

/// Bind-mount argument exposing the backend control socket to helpers.
const CONTROL_SOCKET_MOUNT: &str = "/var/run/docker.sock:/var/run/docker.sock";

/// One planned backend invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Component name, used in progress and error messages.
    pub label: String,
    /// Full argument vector passed to the backend binary.
    pub args: Vec<String>,
}

/// Archive streams produced by a full orchestration pass.
#[derive(Debug)]
pub struct BuiltComponents {
    /// Composite archive from the kernel container (bzImage + kernel.tar).
    pub kernel_archive: Vec<u8>,
    /// Init filesystem archive.
    pub init: Vec<u8>,
    /// Service filesystem archives, in manifest order.
    pub services: Vec<Vec<u8>>,
}

/// Plan the backend invocations for a manifest: kernel, init, then each
/// system service in declaration order. Exactly N+2 entries.
pub fn invocations(manifest: &Manifest) -> Vec<Invocation> {
    let mut plan = Vec::with_capacity(manifest.system.len() + 2);

    // Kernel: run the container and capture a composite tarball of the two
    // named artifacts it ships.
    plan.push(Invocation {
        label: "kernel".to_string(),
        args: vec![
            "run".to_string(),
            "--rm".to_string(),
            manifest.kernel.clone(),
            "tar".to_string(),
            "cf".to_string(),
            "-".to_string(),
            KERNEL_BINARY_ENTRY.to_string(),
            KERNEL_ROOTFS_ENTRY.to_string(),
        ],
    });

    // Init: convert the image into a filesystem tarball via the export
    // helper, which needs the control socket.
    plan.push(Invocation {
        label: "init".to_string(),
        args: vec![
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            CONTROL_SOCKET_MOUNT.to_string(),
            IMAGE_EXPORT_HELPER.to_string(),
            manifest.init.clone(),
        ],
    });

    // Services: export each image rooted under /containers/<name> with its
    // capability lists and command override.
    for svc in &manifest.system {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            CONTROL_SOCKET_MOUNT.to_string(),
            SERVICE_EXPORT_HELPER.to_string(),
            svc.image.clone(),
            format!("/containers/{}", svc.name),
        ];
        for cap in &svc.cap_drop {
            args.push("--cap-drop".to_string());
            args.push(cap.clone());
        }
        for cap in &svc.cap_add {
            args.push("--cap-add".to_string());
            args.push(cap.clone());
        }
        args.push(svc.image.clone());
        args.extend(svc.command.iter().cloned());

        plan.push(Invocation {
            label: svc.name.clone(),
            args,
        });
    }

    plan
}

/// Build every component archive for the manifest.
///
/// Invocations run concurrently; the returned streams are in manifest order
/// regardless of completion order. The first failure aborts everything.
pub fn build_all(docker: &str, manifest: &Manifest) -> Result<BuiltComponents> {
    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let mut streams = rt.block_on(build_concurrently(docker, invocations(manifest)))?;

    // Slot 0 is the kernel composite, slot 1 is init, the rest are services.
    let services = streams.split_off(2);
    let init = streams.pop().expect("plan always contains init");
    let kernel_archive = streams.pop().expect("plan always contains kernel");

    Ok(BuiltComponents {
        kernel_archive,
        init,
        services,
    })
}

/// Run all planned invocations concurrently, gathering stdout streams into
/// slots indexed by plan position.
async fn build_concurrently(docker: &str, plan: Vec<Invocation>) -> Result<Vec<Vec<u8>>> {
    let mut set = tokio::task::JoinSet::new();

    for (slot, invocation) in plan.into_iter().enumerate() {
        let docker = docker.to_string();
        set.spawn(async move {
            let result = run_backend(&docker, &invocation).await;
            (slot, invocation.label, result)
        });
    }

    let mut slots: Vec<Option<Vec<u8>>> = Vec::new();
    slots.resize_with(set.len(), || None);

    while let Some(joined) = set.join_next().await {
        let (slot, label, result) = joined.context("Component build task panicked")?;
        match result {
            Ok(stream) => slots[slot] = Some(stream),
            Err(e) => {
                set.abort_all();
                return Err(e.context(format!("Failed to build component '{label}'")));
            }
        }
    }

    Ok(slots
        .into_iter()
        .map(|s| s.expect("every slot filled once all tasks joined"))
        .collect())
}

/// Invoke the backend once and capture its stdout as the archive stream.
async fn run_backend(docker: &str, invocation: &Invocation) -> Result<Vec<u8>> {
    let output = tokio::process::Command::new(docker)
        .args(&invocation.args)
        .output()
        .await
        .with_context(|| format!("Failed to execute '{docker}'. Is it installed?"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "'{}' exited with code {}\n  stderr: {}",
            docker,
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }

    Ok(output.stdout)
}
