// Format workflow: build a fresh MiniVSFS image from validated parameters.
//
// Everything is assembled in memory first - superblock, bitmaps, inode
// table and data region - with all checksums finalized, then written out
// in one pass through the image codec.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::core::bitmap::Bitmap;
use crate::core::constants::*;
use crate::core::structures::{DirEntry, Inode, Superblock};
use crate::core::types::{FilesystemLayout, FilesystemParams, VsfsResult};
use crate::image::Image;

/// What the formatter produced, for the CLI summary
#[derive(Debug, Clone, Copy)]
pub struct FormatSummary {
    pub size_kib: u64,
    pub inode_count: u64,
    pub total_blocks: u64,
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Create a fresh image at `path`
pub fn format_image(path: &Path, params: &FilesystemParams) -> VsfsResult<FormatSummary> {
    let layout = FilesystemLayout::from_params(params)?;
    let now = unix_now();

    let mut superblock = Superblock::for_layout(&layout, now);
    superblock.finalize_checksum();

    // Inode 1 (root) and data block 0 (root directory) are pre-allocated
    let mut inode_bitmap = Bitmap::new();
    inode_bitmap.set(ROOT_INO as u64 - 1);
    let mut data_bitmap = Bitmap::new();
    data_bitmap.set(0);

    // Inode table with only the root inode populated
    let mut inode_table =
        vec![0u8; (layout.inode_table_blocks * BLOCK_SIZE as u64) as usize];
    let mut root = Inode {
        mode: MODE_DIR,
        links: 2,
        size_bytes: 2 * DIRENT_SIZE as u64,
        atime: now,
        mtime: now,
        ctime: now,
        proj_id: DEFAULT_PROJECT_ID,
        ..Inode::default()
    };
    root.direct[0] = layout.data_region_start as u32;
    root.finalize_checksum();
    inode_table[..INODE_SIZE as usize].copy_from_slice(&root.encode());

    // Data region with the root directory's "." and ".." in its first block
    let mut data_region =
        vec![0u8; (layout.data_region_blocks * BLOCK_SIZE as u64) as usize];
    let dot = DirEntry::new(ROOT_INO, DIRENT_TYPE_DIR, ".");
    let dotdot = DirEntry::new(ROOT_INO, DIRENT_TYPE_DIR, "..");
    data_region[..DIRENT_SIZE as usize].copy_from_slice(&dot.encode());
    data_region[DIRENT_SIZE as usize..2 * DIRENT_SIZE as usize]
        .copy_from_slice(&dotdot.encode());

    let image = Image {
        superblock,
        inode_bitmap,
        data_bitmap,
        inode_table,
        data_region,
    };
    image.save(path)?;

    info!(
        "formatted {}: {} KiB, {} inodes, {} blocks",
        path.display(),
        params.size_kib,
        params.inode_count,
        layout.total_blocks
    );

    Ok(FormatSummary {
        size_kib: params.size_kib,
        inode_count: params.inode_count,
        total_blocks: layout.total_blocks,
    })
}
