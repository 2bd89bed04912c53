//! Kernel artifact extraction.
//!
//! The kernel container ships two artifacts packed into one composite tar
//! stream: the kernel binary itself and a companion filesystem archive that
//! becomes the first segment of the initrd. This module scans the composite
//! stream once and separates the two by exact entry name; entry order within
//! the stream is not assumed.

use anyhow::{bail, Context, Result};
use std::io::Read;
use tar::Archive;

/// Name of the kernel binary entry inside the composite archive.
pub const KERNEL_BINARY_ENTRY: &str = "bzImage";

/// Name of the companion filesystem archive entry.
pub const KERNEL_ROOTFS_ENTRY: &str = "kernel.tar";

/// The two artifacts separated out of the kernel composite archive.
#[derive(Debug)]
pub struct ExtractedKernel {
    /// The kernel binary, written out as-is.
    pub bzimage: Vec<u8>,
    /// The companion filesystem archive, first segment of the initrd.
    pub rootfs_tar: Vec<u8>,
}

/// Split the kernel composite archive into its two named entries.
///
/// Entries are matched by exact name; each match is fully buffered into its
/// own buffer, everything else is skipped without buffering. Missing either
/// entry, or finding one with no content, is fatal - a boot cannot proceed
/// without both.
pub fn split_kernel_archive(
    data: &[u8],
    bzimage_name: &str,
    rootfs_name: &str,
) -> Result<ExtractedKernel> {
    let mut archive = Archive::new(data);

    let mut bzimage: Option<Vec<u8>> = None;
    let mut rootfs: Option<Vec<u8>> = None;

    for entry in archive
        .entries()
        .context("Failed to read kernel composite archive")?
    {
        let mut entry = entry.context("Corrupt entry in kernel composite archive")?;
        let path = entry
            .path()
            .context("Entry with unreadable path in kernel composite archive")?
            .into_owned();

        let target = if path == std::path::Path::new(bzimage_name) {
            &mut bzimage
        } else if path == std::path::Path::new(rootfs_name) {
            &mut rootfs
        } else {
            continue;
        };

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read '{}' entry content", path.display()))?;
        *target = Some(buf);
    }

    let (Some(bzimage), Some(rootfs)) = (bzimage, rootfs) else {
        bail!("Did not find {bzimage_name} and {rootfs_name} in kernel archive");
    };

    if bzimage.is_empty() {
        bail!("Kernel archive entry '{bzimage_name}' is empty");
    }
    if rootfs.is_empty() {
        bail!("Kernel archive entry '{rootfs_name}' is empty");
    }

    Ok(ExtractedKernel {
        bzimage,
        rootfs_tar: rootfs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tar::{Builder, Header};

    fn tar_with_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        for (name, content) in entries {
            let mut header = Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_split_both_entries_present() {
        let data = tar_with_entries(&[
            (KERNEL_BINARY_ENTRY, b"KERNELBIN"),
            (KERNEL_ROOTFS_ENTRY, b"ROOTFSTAR"),
        ]);

        let extracted =
            split_kernel_archive(&data, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY).unwrap();
        assert_eq!(extracted.bzimage, b"KERNELBIN");
        assert_eq!(extracted.rootfs_tar, b"ROOTFSTAR");
    }

    #[test]
    fn test_split_order_independent() {
        // Companion archive first, kernel binary second.
        let data = tar_with_entries(&[
            (KERNEL_ROOTFS_ENTRY, b"ROOTFSTAR"),
            (KERNEL_BINARY_ENTRY, b"KERNELBIN"),
        ]);

        let extracted =
            split_kernel_archive(&data, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY).unwrap();
        assert_eq!(extracted.bzimage, b"KERNELBIN");
        assert_eq!(extracted.rootfs_tar, b"ROOTFSTAR");
    }

    #[test]
    fn test_content_lands_in_matching_buffer() {
        // Distinct payloads so a crossed copy target cannot go unnoticed.
        let data = tar_with_entries(&[
            (KERNEL_BINARY_ENTRY, b"only-the-kernel"),
            (KERNEL_ROOTFS_ENTRY, b"only-the-rootfs"),
        ]);

        let extracted =
            split_kernel_archive(&data, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY).unwrap();
        assert_eq!(extracted.bzimage, b"only-the-kernel");
        assert_eq!(extracted.rootfs_tar, b"only-the-rootfs");
    }

    #[test]
    fn test_unrelated_entries_skipped() {
        let data = tar_with_entries(&[
            ("README", b"ignore me"),
            (KERNEL_BINARY_ENTRY, b"K"),
            ("System.map", b"ignore me too"),
            (KERNEL_ROOTFS_ENTRY, b"R"),
        ]);

        let extracted =
            split_kernel_archive(&data, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY).unwrap();
        assert_eq!(extracted.bzimage, b"K");
        assert_eq!(extracted.rootfs_tar, b"R");
    }

    #[test]
    fn test_missing_kernel_entry_fails() {
        let data = tar_with_entries(&[(KERNEL_ROOTFS_ENTRY, b"R")]);

        let err = split_kernel_archive(&data, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY)
            .unwrap_err();
        assert!(err.to_string().contains("Did not find"));
    }

    #[test]
    fn test_missing_rootfs_entry_fails() {
        let data = tar_with_entries(&[(KERNEL_BINARY_ENTRY, b"K")]);

        assert!(split_kernel_archive(&data, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY).is_err());
    }

    #[test]
    fn test_empty_entry_fails() {
        let data = tar_with_entries(&[
            (KERNEL_BINARY_ENTRY, b""),
            (KERNEL_ROOTFS_ENTRY, b"R"),
        ]);

        let err = split_kernel_archive(&data, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY)
            .unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }

    #[test]
    fn test_garbage_stream_fails() {
        let data = vec![0xffu8; 1024];
        assert!(split_kernel_archive(&data, KERNEL_BINARY_ENTRY, KERNEL_ROOTFS_ENTRY).is_err());
    }
}
