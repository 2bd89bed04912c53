//! Build command - runs the full image assembly pipeline.
//!
//! Pipeline stages: load manifest, build every component archive, split the
//! kernel composite stream, concatenate the initrd segments, write the two
//! artifacts. Any stage failure aborts the run; nothing is retried and no
//! partial output is kept.

use anyhow::{bail, Result};
use std::time::Instant;

use crate::artifact::{self, INITRD_OUTPUT, KERNEL_OUTPUT};
use crate::component;
use crate::config::Config;
use crate::initrd;
use crate::kernel::{self, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY};
use crate::manifest::Manifest;
use crate::process;

/// Execute the build command.
pub fn cmd_build(config: &Config) -> Result<()> {
    println!("=== vmbuild ===\n");
    let build_start = Instant::now();

    // 1. Manifest
    println!("Loading manifest {}...", config.manifest_path.display());
    let manifest = Manifest::load(&config.manifest_path)?;
    manifest.validate()?;
    println!(
        "  kernel: {}\n  init:   {}\n  system: {} service(s)",
        manifest.kernel,
        manifest.init,
        manifest.system.len()
    );

    // The backend must exist before the first invocation; a PATH miss here
    // beats N confusing spawn errors later.
    let Some(docker) = process::which(&config.docker_bin) else {
        bail!(
            "'{}' does not seem to be installed (not found in PATH)",
            config.docker_bin
        );
    };

    // 2. Component archives (concurrent, gathered in manifest order)
    println!("\nBuilding {} component archive(s)...", manifest.system.len() + 2);
    let built = component::build_all(&docker, &manifest)?;
    println!("  kernel composite: {} bytes", built.kernel_archive.len());
    println!("  init: {} bytes", built.init.len());
    for (svc, stream) in manifest.system.iter().zip(&built.services) {
        println!("  {}: {} bytes", svc.name, stream.len());
    }

    // 3. Kernel extraction
    println!("\nExtracting kernel artifacts...");
    let extracted = kernel::split_kernel_archive(
        &built.kernel_archive,
        KERNEL_BINARY_ENTRY,
        KERNEL_ROOTFS_ENTRY,
    )?;
    println!("  {}: {} bytes", KERNEL_BINARY_ENTRY, extracted.bzimage.len());
    println!("  {}: {} bytes", KERNEL_ROOTFS_ENTRY, extracted.rootfs_tar.len());

    // 4. Initrd assembly: companion kernel archive, init, then services.
    println!("\nAssembling initrd...");
    let mut segments: Vec<&[u8]> = Vec::with_capacity(built.services.len() + 2);
    segments.push(&extracted.rootfs_tar);
    segments.push(&built.init);
    for stream in &built.services {
        segments.push(stream);
    }
    let image = initrd::assemble(segments)?;
    println!("  {} segments, {} bytes", built.services.len() + 2, image.len());

    // 5. Artifacts
    println!("\nWriting artifacts to {}...", config.output_dir.display());
    artifact::write_artifacts(&config.output_dir, &extracted.bzimage, &image)?;

    // 6. Verify what landed on disk (catches a truncated write)
    println!("\n=== Artifact Verification ===");
    for name in [KERNEL_OUTPUT, INITRD_OUTPUT] {
        let info = artifact::verify(&config.output_dir.join(name))?;
        println!("  {}: {} bytes, sha256 {}", name, info.size, info.sha256);
    }

    let total = build_start.elapsed().as_secs_f64();
    println!("\n=== Build Complete ({:.1}s) ===", total);
    println!("  Kernel: {}", KERNEL_OUTPUT);
    println!("  Initrd: {}", INITRD_OUTPUT);
    println!("\nNext: vmbuild run");

    Ok(())
}
